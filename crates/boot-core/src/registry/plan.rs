//! Plan resuelto: subconjunto ordenado de steps para un rol.

use std::sync::Arc;

use serde_json::json;

use crate::constants::ENGINE_VERSION;
use crate::hashing::hash_value;
use crate::role::Role;
use crate::step::StepDefinition;

/// Secuencia de steps en orden de dependencias, más el hash del plan.
///
/// El hash depende sólo de la versión del engine, del rol y de los ids en
/// orden: dos resoluciones del mismo registro producen el mismo hash.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    role: Role,
    steps: Vec<Arc<dyn StepDefinition>>,
    plan_hash: String,
}

impl ResolvedPlan {
    pub(crate) fn new(role: Role, steps: Vec<Arc<dyn StepDefinition>>) -> Self {
        let ids: Vec<&str> = steps.iter().map(|s| s.id()).collect();
        let plan_hash = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "role": role,
            "steps": ids,
        }));
        Self { role, steps, plan_hash }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn steps(&self) -> &[Arc<dyn StepDefinition>] {
        &self.steps
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }

    pub fn plan_hash(&self) -> &str {
        &self.plan_hash
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
