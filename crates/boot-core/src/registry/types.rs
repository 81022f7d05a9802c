//! Step Registry: registro de steps y resolución topológica por rol.
//!
//! La construcción es en dos fases. `RegistryBuilder::register` rechaza ids
//! duplicados en el momento; `build` valida que cada dependencia exista y
//! que la relación sea acíclica. Un `StepRegistry` construido es inmutable
//! y siempre válido, así que `resolve` sólo puede fallar por la selección
//! (dependencias fuera del rol, plan vacío).
use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;

use super::ResolvedPlan;
use crate::errors::BootstrapError;
use crate::role::{Role, RoleConfig};
use crate::step::StepDefinition;

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    steps: IndexMap<String, Arc<dyn StepDefinition>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un step. Falla con `DuplicateStep` si el id ya existe.
    pub fn register<S: StepDefinition + 'static>(&mut self, step: S) -> Result<&mut Self, BootstrapError> {
        self.register_arc(Arc::new(step))
    }

    pub fn register_arc(&mut self, step: Arc<dyn StepDefinition>) -> Result<&mut Self, BootstrapError> {
        let id = step.id().to_string();
        if self.steps.contains_key(&id) {
            return Err(BootstrapError::DuplicateStep(id));
        }
        self.steps.insert(id, step);
        Ok(self)
    }

    /// Valida dependencias y aciclicidad sobre el grafo completo.
    pub fn build(self) -> Result<StepRegistry, BootstrapError> {
        for step in self.steps.values() {
            for dep in step.depends_on() {
                if !self.steps.contains_key(*dep) {
                    return Err(BootstrapError::UnknownDependency { step: step.id().to_string(),
                                                                   dependency: dep.to_string() });
                }
            }
        }
        let all: Vec<usize> = (0..self.steps.len()).collect();
        topo_order(&self.steps, &all)?;
        Ok(StepRegistry { steps: self.steps })
    }
}

/// Registro válido (ids únicos, dependencias conocidas, sin ciclos).
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: IndexMap<String, Arc<dyn StepDefinition>>,
}

impl StepRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn StepDefinition>> {
        self.steps.get(id)
    }

    /// Steps en orden de registro.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StepDefinition>> {
        self.steps.values()
    }

    /// Steps aplicables a `role`, en orden de dependencias (empates por
    /// orden de registro). No considera toggles de componentes.
    pub fn resolve(&self, role: Role) -> Result<ResolvedPlan, BootstrapError> {
        self.resolve_selected(role, |step| step.roles().contains(&role))
    }

    /// Como `resolve`, pero además exige que el componente del step esté
    /// habilitado y que `applies_to(config)` sea verdadero.
    pub fn resolve_for(&self, config: &RoleConfig) -> Result<ResolvedPlan, BootstrapError> {
        self.resolve_selected(config.role, |step| {
                step.roles().contains(&config.role)
                && step.component().map_or(true, |c| config.component_enabled(c))
                && step.applies_to(config)
            })
    }

    fn resolve_selected<F>(&self, role: Role, select: F) -> Result<ResolvedPlan, BootstrapError>
        where F: Fn(&dyn StepDefinition) -> bool
    {
        let selected: Vec<usize> = self.steps
                                       .values()
                                       .enumerate()
                                       .filter(|(_, s)| select(s.as_ref()))
                                       .map(|(i, _)| i)
                                       .collect();
        if selected.is_empty() {
            return Err(BootstrapError::EmptyPlan(role));
        }

        for &idx in &selected {
            let step = &self.steps[idx];
            for dep in step.depends_on() {
                let dep_idx = self.steps.get_index_of(*dep);
                if !dep_idx.is_some_and(|d| selected.contains(&d)) {
                    return Err(BootstrapError::DependencyNotSelected { step: step.id().to_string(),
                                                                       dependency: dep.to_string(),
                                                                       role });
                }
            }
        }

        let order = topo_order(&self.steps, &selected)?;
        let steps = order.into_iter().map(|i| Arc::clone(&self.steps[i])).collect();
        Ok(ResolvedPlan::new(role, steps))
    }
}

/// Kahn sobre el subconjunto `subset` (índices de registro). Entre los steps
/// listos siempre toma el de menor índice, de modo que el resultado es
/// determinista y respeta el orden de registro cuando no hay restricciones.
fn topo_order(steps: &IndexMap<String, Arc<dyn StepDefinition>>, subset: &[usize]) -> Result<Vec<usize>, BootstrapError> {
    let in_subset = |i: usize| subset.contains(&i);
    let deps_of = |i: usize| -> Vec<usize> {
        steps[i].depends_on()
                .iter()
                .filter_map(|d| steps.get_index_of(*d))
                .filter(|d| in_subset(*d))
                .collect()
    };

    let mut remaining: Vec<usize> = subset.iter().map(|&i| deps_of(i).len()).collect();
    let mut ready: BTreeSet<usize> = subset.iter()
                                           .zip(&remaining)
                                           .filter(|(_, n)| **n == 0)
                                           .map(|(&i, _)| i)
                                           .collect();
    let mut order = Vec::with_capacity(subset.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for (pos, &candidate) in subset.iter().enumerate() {
            if remaining[pos] == 0 {
                continue;
            }
            let hits = deps_of(candidate).iter().filter(|&&d| d == next).count();
            if hits > 0 {
                remaining[pos] -= hits;
                if remaining[pos] == 0 {
                    ready.insert(candidate);
                }
            }
        }
    }

    if order.len() < subset.len() {
        let stuck: Vec<usize> = subset.iter().copied().filter(|i| !order.contains(i)).collect();
        return Err(BootstrapError::CyclicDependency(find_cycle(steps, &stuck)));
    }
    Ok(order)
}

/// Cada step bloqueado tiene al menos una dependencia también bloqueada;
/// siguiendo esas aristas se llega necesariamente a un ciclo.
fn find_cycle(steps: &IndexMap<String, Arc<dyn StepDefinition>>, stuck: &[usize]) -> Vec<String> {
    let mut path: Vec<usize> = Vec::new();
    let mut current = stuck[0];
    loop {
        if let Some(start) = path.iter().position(|&p| p == current) {
            let mut cycle: Vec<String> = path[start..].iter().map(|&i| steps[i].id().to_string()).collect();
            cycle.push(steps[current].id().to_string());
            return cycle;
        }
        path.push(current);
        let next = steps[current].depends_on()
                                 .iter()
                                 .filter_map(|d| steps.get_index_of(*d))
                                 .find(|d| stuck.contains(d));
        match next {
            Some(n) => current = n,
            None => return path.iter().map(|&i| steps[i].id().to_string()).collect(),
        }
    }
}
