//! Catálogo por defecto.
//!
//! El orden de registro es el de los scripts de bootstrap originales; la
//! resolución topológica sólo lo altera cuando una dependencia lo exige.

use boot_core::{BootstrapError, StepRegistry};

use crate::steps::{ConfigureKubeconfig, CreateNamespaces, InstallArgoCd, InstallDocker, InstallHelm, InstallK3sServer, InstallK9s,
                   InstallKubectl, JoinK3sAgent, RegistryLogin, WaitArgoCdReady, WaitNodeReady};

pub mod ids {
    pub const INSTALL_DOCKER: &str = "install-docker";
    pub const REGISTRY_LOGIN: &str = "registry-login";
    pub const INSTALL_K3S_SERVER: &str = "install-k3s-server";
    pub const JOIN_K3S_AGENT: &str = "join-k3s-agent";
    pub const CONFIGURE_KUBECONFIG: &str = "configure-kubeconfig";
    pub const WAIT_NODE_READY: &str = "wait-node-ready";
    pub const INSTALL_KUBECTL: &str = "install-kubectl";
    pub const INSTALL_HELM: &str = "install-helm";
    pub const INSTALL_K9S: &str = "install-k9s";
    pub const CREATE_NAMESPACES: &str = "create-namespaces";
    pub const INSTALL_ARGOCD: &str = "install-argocd";
    pub const WAIT_ARGOCD_READY: &str = "wait-argocd-ready";
}

/// Construye y valida el registro con todos los steps conocidos.
pub fn default_registry() -> Result<StepRegistry, BootstrapError> {
    let mut builder = StepRegistry::builder();
    builder.register(InstallDocker)?
           .register(RegistryLogin)?
           .register(InstallK3sServer)?
           .register(JoinK3sAgent)?
           .register(ConfigureKubeconfig)?
           .register(WaitNodeReady)?
           .register(InstallKubectl)?
           .register(InstallHelm)?
           .register(InstallK9s)?
           .register(CreateNamespaces)?
           .register(InstallArgoCd)?
           .register(WaitArgoCdReady)?;
    builder.build()
}
