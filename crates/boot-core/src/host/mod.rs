//! Interfaces estrechas hacia los colaboradores externos.
//!
//! El core nunca instala nada por sí mismo: los steps consultan el estado del
//! sistema a través de `SystemProbe` y actúan a través de `Installer` y
//! `ClusterClient`. Las implementaciones concretas (shell real, dry-run,
//! simulación en memoria) viven en `boot-adapters`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::StepApplyError;
use crate::role::RoleConfig;

/// Script de instalación del proveedor (`get.docker.com`, `get.k3s.io`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallScript {
    /// Binario que el script deja instalado.
    pub name: String,
    pub url: String,
    pub env: Vec<(String, String)>,
    pub args: Vec<String>,
    /// Unidad systemd que el script habilita, si alguna.
    pub service: Option<String>,
    /// Archivos que el script escribe y que otros steps consumen.
    pub creates: Vec<PathBuf>,
}

impl InstallScript {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(),
               url: url.into(),
               env: Vec::new(),
               args: Vec::new(),
               service: None,
               creates: Vec::new() }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn service(mut self, unit: impl Into<String>) -> Self {
        self.service = Some(unit.into());
        self
    }

    pub fn creates(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates.push(path.into());
        self
    }
}

/// Binario publicado como asset de una release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub binary: String,
    pub url: String,
    /// `true` si el asset es un `.tar.gz` que contiene el binario.
    pub archive: bool,
}

/// Comando arbitrario con stdin opcional (p.ej. `docker login --password-stdin`).
#[derive(Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl std::fmt::Debug for HostCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCommand")
         .field("program", &self.program)
         .field("args", &self.args)
         .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
         .finish()
    }
}

/// Condición de readiness observable en el cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// Todos los nodos reportan `Ready`.
    NodesReady,
    /// Todos los deployments del namespace reportan `Available`.
    DeploymentsAvailable { namespace: String },
}

impl WaitCondition {
    /// Clave estable para logs y para la simulación.
    pub fn key(&self) -> String {
        match self {
            WaitCondition::NodesReady => "nodes-ready".to_string(),
            WaitCondition::DeploymentsAvailable { namespace } => format!("deployments-available:{namespace}"),
        }
    }
}

/// Sondas de capacidad: responden "¿ya está?" sin modificar nada.
pub trait SystemProbe: Send + Sync {
    fn has_binary(&self, name: &str) -> Result<bool, StepApplyError>;
    fn has_file(&self, path: &Path) -> Result<bool, StepApplyError>;
    fn service_active(&self, unit: &str) -> Result<bool, StepApplyError>;
    fn has_namespace(&self, namespace: &str) -> Result<bool, StepApplyError>;
    fn has_deployment(&self, namespace: &str, name: &str) -> Result<bool, StepApplyError>;
    fn condition_met(&self, condition: &WaitCondition) -> Result<bool, StepApplyError>;
}

/// Mecanismo de instalación del sistema operativo / descarga de releases.
pub trait Installer: Send + Sync {
    fn run_script(&self, script: &InstallScript) -> Result<(), StepApplyError>;
    fn install_release(&self, asset: &ReleaseAsset) -> Result<(), StepApplyError>;
    fn install_file(&self, from: &Path, to: &Path) -> Result<(), StepApplyError>;
    fn run_command(&self, command: &HostCommand) -> Result<(), StepApplyError>;
}

/// Cliente mínimo de la API del cluster.
pub trait ClusterClient: Send + Sync {
    /// Crea el namespace si no existe (idempotente).
    fn create_namespace(&self, namespace: &str) -> Result<(), StepApplyError>;
    fn apply_manifest(&self, namespace: &str, manifest_url: &str) -> Result<(), StepApplyError>;
    /// Bloquea hasta que `condition` se cumpla o venza `timeout`.
    fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> Result<(), StepApplyError>;
}

/// Un host completo implementa los tres colaboradores.
pub trait Host: SystemProbe + Installer + ClusterClient {}

impl<T> Host for T where T: SystemProbe + Installer + ClusterClient {}

/// Contexto entregado a `StepDefinition::is_satisfied` y `apply`.
pub struct HostContext<'a> {
    pub config: &'a RoleConfig,
    pub probe: &'a dyn SystemProbe,
    pub installer: &'a dyn Installer,
    pub cluster: &'a dyn ClusterClient,
}

impl<'a> HostContext<'a> {
    #[inline]
    pub fn new<H: Host>(config: &'a RoleConfig, host: &'a H) -> Self {
        Self { config,
               probe: host,
               installer: host,
               cluster: host }
    }
}
