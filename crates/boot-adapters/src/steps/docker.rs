use boot_core::{HostCommand, HostContext, Idempotency, InstallScript, RoleConfig, StepApplyError, StepDefinition, Tolerance};

use super::DOCKER_SCRIPT_URL;
use crate::catalog::ids;

/// Container runtime; requisito de todo lo demás en ambos roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallDocker;

impl StepDefinition for InstallDocker {
    fn id(&self) -> &str {
        ids::INSTALL_DOCKER
    }

    fn description(&self) -> &str {
        "install the Docker engine (get.docker.com)"
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        ctx.probe.has_binary("docker")
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        ctx.installer.run_script(&InstallScript::new("docker", DOCKER_SCRIPT_URL).service("docker"))
    }
}

/// Login opcional a un registry OCI. Sólo se selecciona si hay credenciales
/// configuradas. Corre en cada ejecución.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryLogin;

impl StepDefinition for RegistryLogin {
    fn id(&self) -> &str {
        ids::REGISTRY_LOGIN
    }

    fn description(&self) -> &str {
        "log in to the configured OCI registry"
    }

    fn depends_on(&self) -> &[&str] {
        &[ids::INSTALL_DOCKER]
    }

    fn applies_to(&self, config: &RoleConfig) -> bool {
        config.registry.is_some()
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::AlwaysRun
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::Tolerant
    }

    fn is_satisfied(&self, _ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        Ok(false)
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        let Some(login) = ctx.config.registry.as_ref() else {
            return Err(StepApplyError::Collaborator("no registry configured".into()));
        };
        ctx.installer.run_command(&HostCommand { program: "docker".into(),
                                                 args: vec!["login".into(),
                                                            login.url.clone(),
                                                            "--username".into(),
                                                            login.username.clone(),
                                                            "--password-stdin".into()],
                                                 stdin: Some(login.password.clone()) })
    }
}
