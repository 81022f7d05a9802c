pub mod plan;
pub mod types;

pub use plan::ResolvedPlan;
pub use types::{RegistryBuilder, StepRegistry};
