//! `FnStep`: un `StepDefinition` armado con closures.
//!
//! ```ignore
//! let step = FnStep::new("create-ns")
//!     .depends_on(&["install-kubectl"])
//!     .probe(|ctx| ctx.probe.has_namespace("apps"))
//!     .apply(|ctx| ctx.cluster.create_namespace("apps"));
//! ```

use std::fmt;

use crate::errors::StepApplyError;
use crate::host::HostContext;
use crate::role::{Component, Role};

use super::{Idempotency, StepDefinition, Tolerance};

type ProbeFn = Box<dyn Fn(&HostContext<'_>) -> Result<bool, StepApplyError> + Send + Sync>;
type ApplyFn = Box<dyn Fn(&HostContext<'_>) -> Result<(), StepApplyError> + Send + Sync>;

pub struct FnStep {
    id: String,
    description: String,
    depends_on: Vec<&'static str>,
    roles: Vec<Role>,
    component: Option<Component>,
    idempotency: Idempotency,
    tolerance: Tolerance,
    probe: ProbeFn,
    apply: ApplyFn,
}

impl FnStep {
    /// Step fatal, aplicable a todos los roles, cuyo probe responde `false` y
    /// cuyo apply no hace nada.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self { description: id.clone(),
               id,
               depends_on: Vec::new(),
               roles: Role::ALL.to_vec(),
               component: None,
               idempotency: Idempotency::SkipIfSatisfied,
               tolerance: Tolerance::Fatal,
               probe: Box::new(|_| Ok(false)),
               apply: Box::new(|_| Ok(())) }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, ids: &[&'static str]) -> Self {
        self.depends_on.extend_from_slice(ids);
        self
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.roles = roles.to_vec();
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.component = Some(component);
        self
    }

    pub fn always_run(mut self) -> Self {
        self.idempotency = Idempotency::AlwaysRun;
        self
    }

    pub fn tolerant(mut self) -> Self {
        self.tolerance = Tolerance::Tolerant;
        self
    }

    pub fn probe<F>(mut self, f: F) -> Self
        where F: Fn(&HostContext<'_>) -> Result<bool, StepApplyError> + Send + Sync + 'static
    {
        self.probe = Box::new(f);
        self
    }

    pub fn apply<F>(mut self, f: F) -> Self
        where F: Fn(&HostContext<'_>) -> Result<(), StepApplyError> + Send + Sync + 'static
    {
        self.apply = Box::new(f);
        self
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
         .field("id", &self.id)
         .field("depends_on", &self.depends_on)
         .field("roles", &self.roles)
         .field("component", &self.component)
         .field("idempotency", &self.idempotency)
         .field("tolerance", &self.tolerance)
         .finish_non_exhaustive()
    }
}

impl StepDefinition for FnStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn depends_on(&self) -> &[&str] {
        &self.depends_on
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }

    fn component(&self) -> Option<Component> {
        self.component
    }

    fn idempotency(&self) -> Idempotency {
        self.idempotency
    }

    fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    fn is_satisfied(&self, ctx: &HostContext<'_>) -> Result<bool, StepApplyError> {
        (self.probe)(ctx)
    }

    fn apply(&self, ctx: &HostContext<'_>) -> Result<(), StepApplyError> {
        (self.apply)(ctx)
    }
}
