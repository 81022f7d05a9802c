use boot_core::{Component, HostContext, InstallScript, ReleaseAsset, Role, StepApplyError, StepDefinition, Tolerance};

use super::{k8s_arch, HELM_SCRIPT_URL, K9S_VERSION, KUBECTL_VERSION};
use crate::catalog::ids;

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallKubectl;

impl StepDefinition for InstallKubectl {
    fn id(&self) -> &str {
        ids::INSTALL_KUBECTL
    }

    fn description(&self) -> &str {
        "install kubectl from the upstream release"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_K3S_SERVER]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.has_binary("kubectl")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        let url = format!("https://dl.k8s.io/release/{KUBECTL_VERSION}/bin/linux/{}/kubectl", k8s_arch());
        ctx.installer.install_release(&ReleaseAsset { binary: "kubectl".into(),
                                                      url,
                                                      archive: false })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallHelm;

impl StepDefinition for InstallHelm {
    fn id(&self) -> &str {
        ids::INSTALL_HELM
    }

    fn description(&self) -> &str {
        "install Helm 3 (get-helm-3)"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_KUBECTL]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.has_binary("helm")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        ctx.installer.run_script(&InstallScript::new("helm", HELM_SCRIPT_URL))
    }
}

/// Dashboard de terminal. Opcional: su fallo no detiene el bootstrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallK9s;

impl StepDefinition for InstallK9s {
    fn id(&self) -> &str {
        ids::INSTALL_K9S
    }

    fn description(&self) -> &str {
        "install the k9s terminal dashboard"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_KUBECTL]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn component(&self) -> Option<Component> {
        Some(Component::Dashboard)
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::Tolerant
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.has_binary("k9s")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        let url = format!("https://github.com/derailed/k9s/releases/download/{K9S_VERSION}/k9s_Linux_{}.tar.gz", k8s_arch());
        ctx.installer.install_release(&ReleaseAsset { binary: "k9s".into(),
                                                      url,
                                                      archive: true })
    }
}
