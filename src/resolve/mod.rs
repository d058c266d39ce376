//! Turning variable definitions into values.

mod resolver;
mod status;
mod value;
mod variables;

pub use resolver::Resolver;
pub use status::{AsyncStatus, Resolved};
pub use value::{IntoResolvedValue, ResolvedValue};
pub use variables::ResolvedVariables;
