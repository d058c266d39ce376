//! # envar-registry
//!
//! Type-checked environment variable registries with per-environment resolution.
//!
//! ## Overview
//!
//! `envar-registry` describes every configuration variable of an application
//! once, together with how it is obtained in each deployment environment:
//! - An [`EnvironmentRegistry`](core::EnvironmentRegistry) lists environments,
//!   the data each one needs at runtime, and its named resolution strategies
//! - A [`VariableRegistry`](core::VariableRegistry) binds every variable to a
//!   resolution (with a payload) or to a dynamic value, per environment
//! - A [`Resolver`](resolve::Resolver) looks values up for one bound
//!   environment, or for one picked at runtime from several candidates
//!
//! Misconfiguration (unknown environments, unknown tags, wrong payload or data
//! types, missing dynamic values) is reported when registries and resolvers
//! are built, not on first lookup.
//!
//! ## Quick Start
//!
//! ```rust
//! use envar_registry::prelude::*;
//! use std::collections::HashMap;
//!
//! struct LocalData {
//!     env: HashMap<String, String>,
//! }
//!
//! struct CiData {
//!     secrets: HashMap<String, String>,
//! }
//!
//! # async fn example() -> envar_registry::error::Result<()> {
//! let environments = EnvironmentRegistry::new()
//!     .add_env("local", define_type::<LocalData>(), |env| {
//!         env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
//!             .add_resolution("from-env", define_type::<Option<String>>(), |i| {
//!                 let key = i.payload.as_deref().unwrap_or(&i.variable_name);
//!                 i.env_data.env.get(key).cloned()
//!             })
//!     })?
//!     .add_env("ci", define_type::<CiData>(), |env| {
//!         env.add_resolution("secrets", define_type::<()>(), |i| {
//!             i.env_data.secrets.get(&i.variable_name).cloned()
//!         })
//!     })?;
//!
//! let variables = environments
//!     .create_variable_registry()
//!     .add_var("PORT", |var| {
//!         var.for_env("local", "hardcoded", "8080".to_string())?
//!             .for_env_without_payload("ci", "secrets")
//!     })?
//!     .add_var("DATABASE_URL", |var| {
//!         var.for_env("local", "from-env", Some("LOCAL_DB".to_string()))?
//!             .for_env_without_payload("ci", "secrets")
//!     })?;
//!
//! let local = LocalData {
//!     env: HashMap::from([("LOCAL_DB".to_string(), "postgres://localhost".to_string())]),
//! };
//! let resolver = variables.create_resolver("local", local)?;
//! assert_eq!(resolver.get("PORT")?.await?, "8080");
//!
//! // Everything the CI environment reads from its secret store.
//! let secrets = resolver.get_all_for("ci", "secrets")?.await?;
//! assert_eq!(secrets.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Synchronous and asynchronous resolutions
//!
//! Resolutions registered with
//! [`add_async_resolution`](core::Environment::add_async_resolution) produce
//! futures. A lookup returns [`Resolved::Ready`](resolve::Resolved::Ready)
//! only when no possible environment of the resolver resolves that variable
//! asynchronously, so call sites keep the same shape whichever environment is
//! bound. Both forms can be awaited.
//!
//! ## Feature Flags
//!
//! - `json` (default): resolution functions may return `serde_json::Value`;
//!   non-string values are reported as resolution errors.
//!
//! ## Logging
//!
//! Registry and resolver construction emit `tracing` events at `debug`
//! level; individual lookups emit `trace` events.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod resolve;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        CandidateEnvironments, EnvironmentRegistry, Payload, TypeDef, VariableRegistry,
        define_type,
    };
    pub use crate::error::{RegistryError, Result};
    pub use crate::resolve::{AsyncStatus, Resolved, ResolvedVariables, Resolver};
}
