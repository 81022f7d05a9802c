//! Host que no toca el sistema: todo probe responde "no satisfecho" y cada
//! acción queda registrada como texto.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use boot_core::{ClusterClient, HostCommand, InstallScript, Installer, ReleaseAsset, StepApplyError, SystemProbe, WaitCondition};

#[derive(Debug, Default)]
pub struct DryRunHost {
    actions: Mutex<Vec<String>>,
}

impl DryRunHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acciones que se habrían ejecutado, en orden.
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, action: String) -> Result<(), StepApplyError> {
        log::info!("[dry-run] {action}");
        self.actions
            .lock()
            .map_err(|e| StepApplyError::Collaborator(format!("dry-run log poisoned: {e}")))?
            .push(action);
        Ok(())
    }
}

impl SystemProbe for DryRunHost {
    fn has_binary(&self, _name: &str) -> Result<bool, StepApplyError> {
        Ok(false)
    }

    fn has_file(&self, _path: &Path) -> Result<bool, StepApplyError> {
        Ok(false)
    }

    fn service_active(&self, _unit: &str) -> Result<bool, StepApplyError> {
        Ok(false)
    }

    fn has_namespace(&self, _namespace: &str) -> Result<bool, StepApplyError> {
        Ok(false)
    }

    fn has_deployment(&self, _namespace: &str, _name: &str) -> Result<bool, StepApplyError> {
        Ok(false)
    }

    fn condition_met(&self, _condition: &WaitCondition) -> Result<bool, StepApplyError> {
        Ok(false)
    }
}

impl Installer for DryRunHost {
    fn run_script(&self, script: &InstallScript) -> Result<(), StepApplyError> {
        let env: Vec<&str> = script.env.iter().map(|(k, _)| k.as_str()).collect();
        self.record(format!("run script {} from {} (env: {})", script.name, script.url, env.join(",")))
    }

    fn install_release(&self, asset: &ReleaseAsset) -> Result<(), StepApplyError> {
        self.record(format!("install {} from {}", asset.binary, asset.url))
    }

    fn install_file(&self, from: &Path, to: &Path) -> Result<(), StepApplyError> {
        self.record(format!("copy {} to {}", from.display(), to.display()))
    }

    fn run_command(&self, command: &HostCommand) -> Result<(), StepApplyError> {
        self.record(format!("run {} {}", command.program, command.args.join(" ")))
    }
}

impl ClusterClient for DryRunHost {
    fn create_namespace(&self, namespace: &str) -> Result<(), StepApplyError> {
        self.record(format!("create namespace {namespace}"))
    }

    fn apply_manifest(&self, namespace: &str, manifest_url: &str) -> Result<(), StepApplyError> {
        self.record(format!("apply {manifest_url} in {namespace}"))
    }

    fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> Result<(), StepApplyError> {
        self.record(format!("wait for {} (timeout {}s)", condition.key(), timeout.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_actions_without_secrets() {
        let host = DryRunHost::new();
        let script = InstallScript::new("k3s", "https://get.k3s.io").env("K3S_TOKEN", "secret-token");
        host.run_script(&script).unwrap();
        host.create_namespace("apps").unwrap();

        let actions = host.actions();
        assert_eq!(actions.len(), 2);
        assert!(actions[0].contains("K3S_TOKEN"));
        assert!(!actions[0].contains("secret-token"));
        assert_eq!(actions[1], "create namespace apps");
        assert!(!host.has_binary("docker").unwrap());
    }
}
