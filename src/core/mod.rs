//! Environments, variables and the registries that hold them.

mod env_registry;
pub(crate) mod environment;
pub(crate) mod resolution;
mod types;
mod variable;
pub(crate) mod var_registry;

pub use env_registry::EnvironmentRegistry;
pub use environment::{Environment, EnvironmentDefinition};
pub use resolution::{ResolutionDefinition, ResolveInput};
pub use types::{Payload, TypeDef, define_type};
pub use var_registry::{CandidateEnvironments, DynamicData, VariableRegistry};
pub use variable::{DefinitionKind, Variable, VariableDefinition};
