//! Host en memoria con estado mutable y fallos inyectables.
//!
//! Las acciones modifican `SimState` de forma que los probes posteriores las
//! observen, lo que permite comprobar idempotencia sin tocar la máquina.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use boot_core::{ClusterClient, HostCommand, InstallScript, Installer, ReleaseAsset, StepApplyError, SystemProbe, WaitCondition};

/// Fallo a devolver cuando se invoca una acción concreta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimFailure {
    Error(String),
    Timeout,
}

/// Estado observable del host simulado.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimState {
    pub binaries: BTreeSet<String>,
    pub files: BTreeSet<PathBuf>,
    pub services: BTreeSet<String>,
    pub namespaces: BTreeSet<String>,
    /// `(namespace, manifest_url)` aplicados.
    pub manifests: BTreeSet<(String, String)>,
    /// `(namespace, deployment)` presentes.
    pub deployments: BTreeSet<(String, String)>,
}

#[derive(Debug, Default)]
struct Inner {
    state: SimState,
    failures: HashMap<String, SimFailure>,
    calls: Vec<String>,
}

/// Host simulado. Las claves de acción son `script:<name>`,
/// `release:<binary>`, `file:<destino>`, `command:<program>`,
/// `namespace:<ns>`, `manifest:<ns>` y `wait:<condición>`.
#[derive(Debug, Default)]
pub struct SimulatedHost {
    inner: Mutex<Inner>,
}

/// Deployment que el manifest de ArgoCD deja instalado.
const ARGOCD_SERVER: &str = "argocd-server";

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SimState) -> Self {
        Self { inner: Mutex::new(Inner { state, ..Inner::default() }) }
    }

    /// La acción `key` devolverá `StepApplyError::Collaborator(message)`.
    pub fn fail_on(self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.set_failure(key.into(), SimFailure::Error(message.into()));
        self
    }

    /// La acción `key` devolverá `StepApplyError::Timeout`.
    pub fn timeout_on(self, key: impl Into<String>) -> Self {
        self.set_failure(key.into(), SimFailure::Timeout);
        self
    }

    pub fn clear_failure(&self, key: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.remove(key);
        }
    }

    pub fn snapshot(&self) -> SimState {
        self.inner.lock().map(|i| i.state.clone()).unwrap_or_default()
    }

    /// Claves de todas las acciones invocadas (probes excluidos).
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().map(|i| i.calls.clone()).unwrap_or_default()
    }

    pub fn action_count(&self) -> usize {
        self.inner.lock().map(|i| i.calls.len()).unwrap_or(0)
    }

    fn set_failure(&self, key: String, failure: SimFailure) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.insert(key, failure);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StepApplyError> {
        self.inner
            .lock()
            .map_err(|e| StepApplyError::Collaborator(format!("simulated host poisoned: {e}")))
    }

    /// Registra la llamada y devuelve el fallo inyectado, si lo hay.
    fn begin(&self, key: String) -> Result<MutexGuard<'_, Inner>, StepApplyError> {
        let mut inner = self.lock()?;
        let failure = inner.failures.get(&key).cloned();
        inner.calls.push(key.clone());
        match failure {
            None => Ok(inner),
            Some(SimFailure::Error(message)) => Err(StepApplyError::Collaborator(message)),
            Some(SimFailure::Timeout) => Err(StepApplyError::Timeout { what: key, secs: 0 }),
        }
    }

    fn probe<F>(&self, f: F) -> Result<bool, StepApplyError>
        where F: FnOnce(&SimState) -> bool
    {
        Ok(f(&self.lock()?.state))
    }
}

fn require_cluster(state: &SimState) -> Result<(), StepApplyError> {
    if state.services.contains("k3s") {
        Ok(())
    } else {
        Err(StepApplyError::Collaborator("cluster API unreachable".into()))
    }
}

impl SystemProbe for SimulatedHost {
    fn has_binary(&self, name: &str) -> Result<bool, StepApplyError> {
        self.probe(|s| s.binaries.contains(name))
    }

    fn has_file(&self, path: &Path) -> Result<bool, StepApplyError> {
        self.probe(|s| s.files.contains(path))
    }

    fn service_active(&self, unit: &str) -> Result<bool, StepApplyError> {
        self.probe(|s| s.services.contains(unit))
    }

    fn has_namespace(&self, namespace: &str) -> Result<bool, StepApplyError> {
        self.probe(|s| s.namespaces.contains(namespace))
    }

    fn has_deployment(&self, namespace: &str, name: &str) -> Result<bool, StepApplyError> {
        self.probe(|s| s.deployments.contains(&(namespace.to_string(), name.to_string())))
    }

    fn condition_met(&self, condition: &WaitCondition) -> Result<bool, StepApplyError> {
        self.probe(|s| condition_holds(s, condition))
    }
}

fn condition_holds(state: &SimState, condition: &WaitCondition) -> bool {
    match condition {
        WaitCondition::NodesReady => state.services.contains("k3s") || state.services.contains("k3s-agent"),
        WaitCondition::DeploymentsAvailable { namespace } => state.manifests.iter().any(|(ns, _)| ns == namespace),
    }
}

impl Installer for SimulatedHost {
    fn run_script(&self, script: &InstallScript) -> Result<(), StepApplyError> {
        let mut inner = self.begin(format!("script:{}", script.name))?;
        let state = &mut inner.state;
        state.binaries.insert(script.name.clone());
        if let Some(unit) = &script.service {
            state.services.insert(unit.clone());
        }
        state.files.extend(script.creates.iter().cloned());
        Ok(())
    }

    fn install_release(&self, asset: &ReleaseAsset) -> Result<(), StepApplyError> {
        let mut inner = self.begin(format!("release:{}", asset.binary))?;
        inner.state.binaries.insert(asset.binary.clone());
        Ok(())
    }

    fn install_file(&self, from: &Path, to: &Path) -> Result<(), StepApplyError> {
        let mut inner = self.begin(format!("file:{}", to.display()))?;
        if !inner.state.files.contains(from) {
            return Err(StepApplyError::Collaborator(format!("{} does not exist", from.display())));
        }
        inner.state.files.insert(to.to_path_buf());
        Ok(())
    }

    fn run_command(&self, command: &HostCommand) -> Result<(), StepApplyError> {
        let inner = self.begin(format!("command:{}", command.program))?;
        if inner.state.binaries.contains(&command.program) {
            Ok(())
        } else {
            Err(StepApplyError::CommandFailed { program: command.program.clone(),
                                                code: Some(127),
                                                stderr: "command not found".into() })
        }
    }
}

impl ClusterClient for SimulatedHost {
    fn create_namespace(&self, namespace: &str) -> Result<(), StepApplyError> {
        let mut inner = self.begin(format!("namespace:{namespace}"))?;
        require_cluster(&inner.state)?;
        inner.state.namespaces.insert(namespace.to_string());
        Ok(())
    }

    fn apply_manifest(&self, namespace: &str, manifest_url: &str) -> Result<(), StepApplyError> {
        let mut inner = self.begin(format!("manifest:{namespace}"))?;
        require_cluster(&inner.state)?;
        if !inner.state.namespaces.contains(namespace) {
            return Err(StepApplyError::Collaborator(format!("namespace {namespace} not found")));
        }
        inner.state.manifests.insert((namespace.to_string(), manifest_url.to_string()));
        if manifest_url.contains("argo") {
            inner.state.deployments.insert((namespace.to_string(), ARGOCD_SERVER.to_string()));
        }
        Ok(())
    }

    fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> Result<(), StepApplyError> {
        let inner = self.begin(format!("wait:{}", condition.key()))?;
        if condition_holds(&inner.state, condition) {
            Ok(())
        } else {
            Err(StepApplyError::Timeout { what: condition.key(),
                                          secs: timeout.as_secs() })
        }
    }
}
