//! Steps de k3s: server, agent, kubeconfig y readiness de nodos.

use std::path::Path;

use boot_core::constants::K3S_KUBECONFIG_PATH;
use boot_core::{HostContext, InstallScript, Role, StepApplyError, StepDefinition, Tolerance, WaitCondition};

use super::K3S_SCRIPT_URL;
use crate::catalog::ids;

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallK3sServer;

impl StepDefinition for InstallK3sServer {
    fn id(&self) -> &str {
        ids::INSTALL_K3S_SERVER
    }

    fn description(&self) -> &str {
        "install k3s as a control-plane server (get.k3s.io)"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_DOCKER]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.service_active("k3s")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        let script = InstallScript::new("k3s", K3S_SCRIPT_URL).env("INSTALL_K3S_EXEC", "server --write-kubeconfig-mode=644")
                                                               .service("k3s")
                                                               .creates(K3S_KUBECONFIG_PATH);
        ctx.installer.run_script(&script)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JoinK3sAgent;

impl StepDefinition for JoinK3sAgent {
    fn id(&self) -> &str {
        ids::JOIN_K3S_AGENT
    }

    fn description(&self) -> &str {
        "install k3s as an agent and join the server"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_DOCKER]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Agent]
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.service_active("k3s-agent")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        let join = ctx.config
                      .join
                      .as_ref()
                      .ok_or_else(|| StepApplyError::Collaborator("agent role without join parameters".into()))?;
        let script = InstallScript::new("k3s", K3S_SCRIPT_URL).env("K3S_URL", join.url.as_str())
                                                               .env("K3S_TOKEN", join.token.as_str())
                                                               .service("k3s-agent");
        ctx.installer.run_script(&script)
    }
}

/// Copia el kubeconfig generado por k3s a la ruta configurada.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigureKubeconfig;

impl StepDefinition for ConfigureKubeconfig {
    fn id(&self) -> &str {
        ids::CONFIGURE_KUBECONFIG
    }

    fn description(&self) -> &str {
        "copy the k3s kubeconfig for kubectl/helm/k9s"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_K3S_SERVER]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.has_file(&ctx.config.kubeconfig_path)
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        ctx.installer.install_file(Path::new(K3S_KUBECONFIG_PATH), &ctx.config.kubeconfig_path)
    }
}

/// Espera acotada a que los nodos estén `Ready`; un timeout no detiene la corrida.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitNodeReady;

impl StepDefinition for WaitNodeReady {
    fn id(&self) -> &str {
        ids::WAIT_NODE_READY
    }

    fn description(&self) -> &str {
        "wait for cluster nodes to report Ready"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::CONFIGURE_KUBECONFIG]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::Tolerant
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.condition_met(&WaitCondition::NodesReady)
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        ctx.cluster.wait_for(&WaitCondition::NodesReady, ctx.config.readiness_timeout)
    }
}
