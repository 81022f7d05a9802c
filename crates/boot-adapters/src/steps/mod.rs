//! Steps del catálogo de bootstrap.
//!
//! Cada step es un struct unitario: el probe consulta `ctx.probe` y `apply`
//! delega en `ctx.installer` / `ctx.cluster`. Ningún step guarda estado.

mod cluster;
mod docker;
mod k3s;
mod tools;

pub use cluster::{CreateNamespaces, InstallArgoCd, WaitArgoCdReady};
pub use docker::{InstallDocker, RegistryLogin};
pub use k3s::{ConfigureKubeconfig, InstallK3sServer, JoinK3sAgent, WaitNodeReady};
pub use tools::{InstallHelm, InstallK9s, InstallKubectl};

pub const DOCKER_SCRIPT_URL: &str = "https://get.docker.com";
pub const K3S_SCRIPT_URL: &str = "https://get.k3s.io";
pub const HELM_SCRIPT_URL: &str = "https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3";
pub const KUBECTL_VERSION: &str = "v1.31.2";
pub const K9S_VERSION: &str = "v0.32.5";
pub const ARGOCD_NAMESPACE: &str = "argocd";

/// Arquitectura en la nomenclatura de las releases de Kubernetes.
pub fn k8s_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        "arm" => "arm",
        _ => "amd64",
    }
}
