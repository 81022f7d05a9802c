//! Steps que hablan con la API del cluster: namespaces y ArgoCD.

use boot_core::{Component, HostContext, Role, StepApplyError, StepDefinition, Tolerance, WaitCondition};

use super::ARGOCD_NAMESPACE;
use crate::catalog::ids;

/// Crea los namespaces configurados que falten.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateNamespaces;

impl StepDefinition for CreateNamespaces {
    fn id(&self) -> &str {
        ids::CREATE_NAMESPACES
    }

    fn description(&self) -> &str {
        "create the configured namespaces"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_KUBECTL]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        for ns in &ctx.config.namespaces {
            if !ctx.probe.has_namespace(ns)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        for ns in &ctx.config.namespaces {
            if !ctx.probe.has_namespace(ns)? {
                log::info!("creating namespace {ns}");
                ctx.cluster.create_namespace(ns)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallArgoCd;

impl StepDefinition for InstallArgoCd {
    fn id(&self) -> &str {
        ids::INSTALL_ARGOCD
    }

    fn description(&self) -> &str {
        "install ArgoCD from the upstream manifest"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::CREATE_NAMESPACES]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn component(&self) -> Option<Component> {
        Some(Component::GitOps)
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.has_deployment(ARGOCD_NAMESPACE, "argocd-server")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        ctx.cluster.create_namespace(ARGOCD_NAMESPACE)?;
        ctx.cluster.apply_manifest(ARGOCD_NAMESPACE, &ctx.config.argocd_manifest_url)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaitArgoCdReady;

impl WaitArgoCdReady {
    fn condition() -> WaitCondition {
        WaitCondition::DeploymentsAvailable { namespace: ARGOCD_NAMESPACE.to_string() }
    }
}

impl StepDefinition for WaitArgoCdReady {
    fn id(&self) -> &str {
        ids::WAIT_ARGOCD_READY
    }

    fn description(&self) -> &str {
        "wait for the ArgoCD deployments to become Available"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_ARGOCD]
    }

    fn roles(&self) -> &[Role] {
        &[Role::Server]
    }

    fn component(&self) -> Option<Component> {
        Some(Component::GitOps)
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::Tolerant
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.condition_met(&Self::condition())
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        ctx.cluster.wait_for(&Self::condition(), ctx.config.readiness_timeout)
    }
}
