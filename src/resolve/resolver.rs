//! Resolvers bound to one environment, or to one of several candidates.

use crate::core::resolution::{ErasedInput, Invocation};
use crate::core::var_registry::EnvironmentInput;
use crate::core::{DefinitionKind, Variable, VariableRegistry};
use crate::error::{RegistryError, Result};
use crate::resolve::{AsyncStatus, Resolved, ResolvedValue, ResolvedVariables};
use futures::future::try_join_all;
use futures::{FutureExt, TryFutureExt};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Looks up variable values for a bound environment.
///
/// Created by [`VariableRegistry::create_resolver`] (one possible
/// environment) or [`VariableRegistry::create_dynamic_resolver`] (several).
/// Availability in [`get_all`](Self::get_all) and the sync/async shape of
/// every result are computed over all possible environments, while values
/// always come from the bound one.
///
/// # Examples
///
/// ```rust
/// use envar_registry::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let environments = EnvironmentRegistry::new()
///     .add_env("local", define_type::<()>(), |env| {
///         env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
///             .add_async_resolution("remote", define_type::<()>(), |i| async move {
///                 format!("fetched {}", i.variable_name)
///             })
///     })?;
///
/// let variables = environments
///     .create_variable_registry()
///     .add_var("PORT", |var| var.for_env("local", "hardcoded", "8080".to_string()))?
///     .add_var("TOKEN", |var| var.for_env("local", "remote", ()))?;
///
/// let resolver = variables.create_resolver("local", ())?;
/// assert_eq!(resolver.get("PORT")?.await?, "8080");
/// assert_eq!(resolver.get("TOKEN")?.await?, "fetched TOKEN");
///
/// let all = resolver.get_all()?.await?;
/// assert_eq!(all.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct Resolver {
    registry: VariableRegistry,
    env_name: String,
    possible_env_names: Vec<String>,
    input: EnvironmentInput,
    async_status: RwLock<HashMap<String, AsyncStatus>>,
}

impl Resolver {
    pub(crate) fn new(
        registry: VariableRegistry,
        env_name: String,
        possible_env_names: Vec<String>,
        input: EnvironmentInput,
    ) -> Self {
        Self {
            registry,
            env_name,
            possible_env_names,
            input,
            async_status: RwLock::new(HashMap::new()),
        }
    }

    /// The bound environment.
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Every environment this resolver could have been bound to.
    pub fn possible_env_names(&self) -> &[String] {
        &self.possible_env_names
    }

    /// The registry this resolver reads from.
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Whether looking up `name` produces a pending value.
    ///
    /// `Async` if any possible environment resolves the variable with an
    /// asynchronous resolution. Computed once per variable.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::VariableNotFound`] for unknown names.
    pub fn status_of(&self, name: &str) -> Result<AsyncStatus> {
        let variable = self.variable(name)?;
        Ok(self.variable_status(variable))
    }

    /// Resolve one variable in the bound environment.
    ///
    /// The result is [`Resolved::Ready`] only when no possible environment
    /// resolves this variable asynchronously; otherwise it is pending, even if
    /// the bound environment's resolution ran synchronously.
    ///
    /// Errors found before any asynchronous work starts are returned directly.
    /// Errors from an asynchronous resolution are returned by the future.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the variable does not exist
    /// - it has no definition for the bound environment
    /// - its resolution tag is missing from the bound environment
    /// - the resolution fails, or produces a null or non-string value
    pub fn get(&self, name: &str) -> Result<Resolved<String>> {
        let variable = self.variable(name)?;
        let status = self.variable_status(variable);
        let definition = variable.definition(&self.env_name).ok_or_else(|| {
            RegistryError::NoDefinitionForEnvironment {
                variable: name.to_string(),
                env: self.env_name.clone(),
            }
        })?;

        let invocation = match definition.kind() {
            DefinitionKind::Dynamic { dynamic_name } => {
                let value = self.input.dynamic.get(dynamic_name).cloned().ok_or_else(|| {
                    RegistryError::MissingDynamicValue {
                        env: self.env_name.clone(),
                        name: dynamic_name.clone(),
                    }
                })?;
                Invocation::Ready(ResolvedValue::Text(value))
            }
            DefinitionKind::UserDefined { tag } => {
                let resolution = self
                    .registry
                    .environments()
                    .environment(&self.env_name)
                    .and_then(|env| env.resolution(tag))
                    .ok_or_else(|| RegistryError::NoResolutionFound {
                        variable: name.to_string(),
                        env: self.env_name.clone(),
                        tag: tag.clone(),
                    })?;
                let payload =
                    definition
                        .payload()
                        .ok_or_else(|| RegistryError::MissingPayload {
                            env: self.env_name.clone(),
                            tag: tag.clone(),
                            expected: resolution.payload_type_name(),
                        })?;

                resolution.invoke(ErasedInput {
                    env: self.env_name.clone(),
                    tag: tag.clone(),
                    env_data: self.input.data.clone(),
                    payload,
                    variable_name: name.to_string(),
                })?
            }
        };

        tracing::trace!(variable = %name, env = %self.env_name, %status, "resolving variable");

        match invocation {
            Invocation::Ready(value) => {
                let value = validate(value, name, &self.env_name)?;
                if status.is_async() {
                    Ok(Resolved::deferred(value))
                } else {
                    Ok(Resolved::Ready(value))
                }
            }
            Invocation::Pending(fut) => {
                let variable = name.to_string();
                let env = self.env_name.clone();
                Ok(Resolved::Pending(
                    async move { validate(fut.await, &variable, &env) }.boxed(),
                ))
            }
        }
    }

    /// Resolve every variable defined in all possible environments.
    ///
    /// Variables missing a definition in any possible environment are left
    /// out. The result is pending if any entry is pending; pending entries are
    /// awaited together.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`get`](Self::get) for an included
    /// variable.
    pub fn get_all(&self) -> Result<Resolved<ResolvedVariables>> {
        let names: Vec<&str> = self
            .registry
            .variables()
            .filter(|v| self.defined_everywhere(v))
            .map(|v| v.name())
            .collect();
        self.collect(names)
    }

    /// Resolve, in the bound environment, every variable that `target`
    /// resolves with `tag`.
    ///
    /// Useful for producing or checking the variables another environment
    /// expects, e.g. the secrets a deployment target reads. Variables with a
    /// dynamic definition in `target` are not included.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `target` is the bound environment
    /// - `target` or `tag` are unknown
    /// - a matched variable is not defined in every possible environment
    /// - any [`get`](Self::get) fails
    pub fn get_all_for(&self, target: &str, tag: &str) -> Result<Resolved<ResolvedVariables>> {
        if target == self.env_name {
            return Err(RegistryError::TargetIsCurrentEnvironment(target.to_string()));
        }

        let names = self.registry.list_variables(target, tag)?;
        for name in &names {
            let variable = self.variable(name)?;
            if let Some(env) = self
                .possible_env_names
                .iter()
                .find(|env| !variable.is_defined_for(env))
            {
                return Err(RegistryError::VariableNotDefinedInCurrentEnvironment {
                    variable: name.to_string(),
                    env: env.clone(),
                });
            }
        }

        self.collect(names)
    }

    fn collect(&self, names: Vec<&str>) -> Result<Resolved<ResolvedVariables>> {
        let mut ready = BTreeMap::new();
        let mut pending = Vec::new();

        for name in names {
            match self.get(name)? {
                Resolved::Ready(value) => {
                    ready.insert(name.to_string(), value);
                }
                Resolved::Pending(fut) => {
                    let name = name.to_string();
                    pending.push(fut.map_ok(move |value| (name, value)));
                }
            }
        }

        if pending.is_empty() {
            return Ok(Resolved::Ready(ResolvedVariables::new(ready)));
        }

        Ok(Resolved::Pending(
            async move {
                ready.extend(try_join_all(pending).await?);
                Ok::<_, RegistryError>(ResolvedVariables::new(ready))
            }
            .boxed(),
        ))
    }

    fn variable(&self, name: &str) -> Result<&Variable> {
        self.registry
            .variable(name)
            .ok_or_else(|| RegistryError::VariableNotFound(name.to_string()))
    }

    fn defined_everywhere(&self, variable: &Variable) -> bool {
        self.possible_env_names
            .iter()
            .all(|env| variable.is_defined_for(env))
    }

    fn variable_status(&self, variable: &Variable) -> AsyncStatus {
        if let Some(status) = self.async_status.read().get(variable.name()) {
            return *status;
        }

        let environments = self.registry.environments();
        let possibly_async = self.possible_env_names.iter().any(|env| {
            variable
                .definition(env)
                .and_then(|d| d.tag())
                .and_then(|tag| environments.environment(env)?.resolution(tag))
                .is_some_and(|r| r.status().is_async())
        });
        let status = if possibly_async {
            AsyncStatus::Async
        } else {
            AsyncStatus::Sync
        };

        self.async_status
            .write()
            .insert(variable.name().to_string(), status);
        status
    }
}

fn validate(value: ResolvedValue, variable: &str, env: &str) -> Result<String> {
    match value {
        ResolvedValue::Text(value) => Ok(value),
        ResolvedValue::Nullish => Err(RegistryError::ResolvedToNullish {
            variable: variable.to_string(),
            env: env.to_string(),
        }),
        ResolvedValue::NonString(kind) => Err(RegistryError::ResolvedToNonString {
            variable: variable.to_string(),
            env: env.to_string(),
            kind,
        }),
        ResolvedValue::Failed(source) => Err(RegistryError::ResolutionFailed {
            variable: variable.to_string(),
            env: env.to_string(),
            source,
        }),
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("env_name", &self.env_name)
            .field("possible_env_names", &self.possible_env_names)
            .field("registry", &self.registry)
            .finish()
    }
}
