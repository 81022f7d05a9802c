use crate::errors::StepApplyError;
use crate::host::HostContext;
use crate::role::{Component, Role, RoleConfig};

/// Cómo decide el engine si invocar `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Se consulta el probe; si está satisfecho el step se omite.
    SkipIfSatisfied,
    /// `apply` corre siempre (la acción debe ser idempotente por sí misma).
    AlwaysRun,
}

/// Qué ocurre con la corrida cuando el step falla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    /// El fallo detiene la corrida.
    Fatal,
    /// El fallo se registra y la corrida continúa.
    Tolerant,
}

/// Trait que define un Step.
///
/// Los steps se crean al construir el registro y no cambian después. El
/// estado mutable vive en los sistemas externos, nunca en el step.
pub trait StepDefinition: Send + Sync + std::fmt::Debug {
    /// Identificador estable y único dentro del registro.
    fn id(&self) -> &str;

    /// Descripción de una línea para listados.
    fn description(&self) -> &str {
        self.id()
    }

    /// Ids de los steps que deben estar aplicados u omitidos antes que este.
    fn depends_on(&self) -> &[&str] {
        &[]
    }

    /// Roles a los que aplica.
    fn roles(&self) -> &[Role] {
        &Role::ALL
    }

    /// Componente opcional que debe estar habilitado para seleccionar el step.
    fn component(&self) -> Option<Component> {
        None
    }

    /// Predicado adicional sobre la configuración (p.ej. "hay registry configurado").
    fn applies_to(&self, _config: &RoleConfig) -> bool {
        true
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::SkipIfSatisfied
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::Fatal
    }

    /// Probe de capacidad. No debe modificar el sistema.
    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError>;

    /// Acción que satisface el step.
    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError>;
}
