//! Registry of variables and factory for resolvers.

use crate::core::EnvironmentRegistry;
use crate::core::resolution::SharedAny;
use crate::core::variable::Variable;
use crate::error::{RegistryError, Result};
use crate::resolve::Resolver;
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Caller-supplied values for dynamic variable definitions, keyed by dynamic name.
pub type DynamicData = HashMap<String, String>;

/// Runtime inputs for one environment: its data and its dynamic values.
#[derive(Clone)]
pub(crate) struct EnvironmentInput {
    pub(crate) data: SharedAny,
    pub(crate) dynamic: Arc<DynamicData>,
}

/// One candidate of a dynamic resolver, before validation.
struct Candidate {
    name: String,
    data: SharedAny,
    data_check: fn(&crate::core::EnvironmentDefinition) -> Result<()>,
    dynamic: DynamicData,
}

/// The environments a dynamic resolver may be bound to, with their data.
///
/// # Examples
///
/// ```rust
/// use envar_registry::core::CandidateEnvironments;
///
/// struct LocalData;
/// struct CiData;
///
/// let candidates = CandidateEnvironments::new()
///     .with_env("local", LocalData)
///     .with_dynamic("ci", CiData, [("build_id", "1234")]);
/// assert_eq!(candidates.names().collect::<Vec<_>>(), ["local", "ci"]);
/// ```
#[derive(Default)]
pub struct CandidateEnvironments {
    candidates: Vec<Candidate>,
}

impl CandidateEnvironments {
    /// Create an empty candidate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate environment without dynamic data.
    ///
    /// Adding the same name again replaces the earlier entry.
    pub fn with_env<D>(self, name: impl Into<String>, data: D) -> Self
    where
        D: Any + Send + Sync,
    {
        self.with_dynamic(name, data, std::iter::empty::<(String, String)>())
    }

    /// Add a candidate environment with dynamic data.
    ///
    /// Adding the same name again replaces the earlier entry.
    pub fn with_dynamic<D, I, K, V>(
        mut self,
        name: impl Into<String>,
        data: D,
        dynamic: I,
    ) -> Self
    where
        D: Any + Send + Sync,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        self.candidates.retain(|c| c.name != name);
        self.candidates.push(Candidate {
            name,
            data: Arc::new(data),
            data_check: |env| env.check_data::<D>(),
            dynamic: collect_dynamic(dynamic),
        });
        self
    }

    /// Candidate names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.name.as_str())
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn collect_dynamic<I, K, V>(dynamic: I) -> DynamicData
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    dynamic
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// An immutable, appendable collection of variables bound to one
/// [`EnvironmentRegistry`].
///
/// Builders return new registries and leave the receiver unchanged, so a
/// registry can be shared and extended in several directions.
///
/// # Examples
///
/// ```rust
/// use envar_registry::prelude::*;
///
/// # fn example() -> Result<()> {
/// let environments = EnvironmentRegistry::new()
///     .add_env("local", define_type::<()>(), |env| {
///         env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
///     })?;
///
/// let variables = environments
///     .create_variable_registry()
///     .add_var("PORT", |var| var.for_env("local", "hardcoded", "8080".to_string()))?
///     .add_var("HOST", |var| var.for_env("local", "hardcoded", "0.0.0.0".to_string()))?;
///
/// let resolver = variables.create_resolver("local", ())?;
/// assert_eq!(resolver.get("PORT")?.try_ready().ok(), Some("8080".to_string()));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Clone)]
pub struct VariableRegistry {
    environments: EnvironmentRegistry,
    variables: Arc<Vec<Arc<Variable>>>,
}

impl VariableRegistry {
    pub(crate) fn new(environments: EnvironmentRegistry) -> Self {
        Self {
            environments,
            variables: Arc::new(Vec::new()),
        }
    }

    /// The environment registry this registry was created from.
    pub fn environments(&self) -> &EnvironmentRegistry {
        &self.environments
    }

    /// Add a variable named `name`.
    ///
    /// `configure` receives an empty [`Variable`] and returns it with its
    /// per-environment definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `name` is empty or contains lower-case characters
    /// - a variable named `name` already exists
    /// - `configure` fails (e.g. an unknown environment or tag)
    /// - `configure` returns a variable under a different name
    pub fn add_var<F>(&self, name: impl Into<String>, configure: F) -> Result<Self>
    where
        F: FnOnce(Variable) -> Result<Variable>,
    {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_lowercase) {
            return Err(RegistryError::InvalidVariableName(name));
        }
        if self.variable(&name).is_some() {
            return Err(RegistryError::DuplicateVariableName(name));
        }

        let variable = configure(Variable::new(name.clone(), self.environments.clone()))?;
        if variable.name() != name {
            return Err(RegistryError::ConfigureMismatch {
                kind: "variable",
                expected: name,
                found: variable.name().to_string(),
            });
        }

        tracing::debug!(
            variable = %name,
            definitions = variable.definitions().count(),
            "registered variable"
        );

        let mut variables = self.variables.as_ref().clone();
        variables.push(Arc::new(variable));
        Ok(Self {
            environments: self.environments.clone(),
            variables: Arc::new(variables),
        })
    }

    /// Append all variables of `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if `other` was created from a different environment
    /// registry, or if any variable name appears in both registries.
    pub fn merge_with(&self, other: &VariableRegistry) -> Result<Self> {
        if !self.environments.same_as(&other.environments) {
            return Err(RegistryError::RegistryMismatch);
        }
        if let Some(duplicate) = other
            .variable_names()
            .find(|name| self.variable(name).is_some())
        {
            return Err(RegistryError::DuplicateVariableName(duplicate.to_string()));
        }

        tracing::debug!(
            left = self.len(),
            right = other.len(),
            "merged variable registries"
        );

        let mut variables = self.variables.as_ref().clone();
        variables.extend(other.variables.iter().cloned());
        Ok(Self {
            environments: self.environments.clone(),
            variables: Arc::new(variables),
        })
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.as_ref())
    }

    /// Variable names in insertion order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name())
    }

    /// Variables in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().map(|v| v.as_ref())
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Check if the registry has no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Names of variables whose definition for `env` uses the resolution `tag`.
    ///
    /// Variables with a dynamic definition for `env`, or none at all, are not
    /// listed. Order follows insertion.
    ///
    /// # Errors
    ///
    /// Returns an error if `env` is unknown or has no resolution `tag`.
    pub fn list_variables(&self, env: &str, tag: &str) -> Result<Vec<&str>> {
        let environment = self.environments.require(env)?;
        if environment.resolution(tag).is_none() {
            return Err(RegistryError::InvalidResolutionTagReference {
                env: env.to_string(),
                tag: tag.to_string(),
            });
        }

        Ok(self
            .variables()
            .filter(|v| v.definition(env).and_then(|d| d.tag()) == Some(tag))
            .map(|v| v.name())
            .collect())
    }

    /// Dynamic names used by definitions for `env`, sorted.
    pub fn dynamic_names(&self, env: &str) -> BTreeSet<&str> {
        self.variables()
            .filter_map(|v| v.definition(env).and_then(|d| d.dynamic_name()))
            .collect()
    }

    /// Create a resolver bound to `env` with its data.
    ///
    /// Use [`create_resolver_with`](Self::create_resolver_with) when variables
    /// have dynamic definitions for `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if `env` is unknown, `data` is not the environment's
    /// data type, or a variable needs a dynamic value for `env`.
    pub fn create_resolver<D>(&self, env: &str, data: D) -> Result<Resolver>
    where
        D: Any + Send + Sync,
    {
        self.create_resolver_with(env, data, std::iter::empty::<(String, String)>())
    }

    /// Create a resolver bound to `env` with its data and dynamic values.
    ///
    /// `dynamic` must contain exactly the dynamic names used by definitions
    /// for `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if `env` is unknown, `data` is not the environment's
    /// data type, or `dynamic` is missing a name or has an unused one.
    pub fn create_resolver_with<D, I, K, V>(
        &self,
        env: &str,
        data: D,
        dynamic: I,
    ) -> Result<Resolver>
    where
        D: Any + Send + Sync,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environments.require(env)?.check_data::<D>()?;
        let dynamic = collect_dynamic(dynamic);
        self.check_dynamic(env, &dynamic)?;

        let input = EnvironmentInput {
            data: Arc::new(data),
            dynamic: Arc::new(dynamic),
        };

        tracing::debug!(env = %env, variables = self.len(), "created resolver");
        Ok(Resolver::new(
            self.clone(),
            env.to_string(),
            vec![env.to_string()],
            input,
        ))
    }

    /// Create a resolver whose environment is chosen at runtime.
    ///
    /// Every candidate is validated as in
    /// [`create_resolver_with`](Self::create_resolver_with). `select` is called
    /// once to pick the bound environment. Variable availability and async
    /// status are computed over all candidates, so results have the same shape
    /// whichever candidate is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no candidates, any candidate fails
    /// validation, or `select` returns a name that is not a candidate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use envar_registry::prelude::*;
    ///
    /// # fn example() -> Result<()> {
    /// let environments = EnvironmentRegistry::new()
    ///     .add_env("local", define_type::<()>(), |env| {
    ///         env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
    ///     })?
    ///     .add_env("ci", define_type::<()>(), |env| {
    ///         env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
    ///     })?;
    ///
    /// let variables = environments.create_variable_registry().add_var("MODE", |var| {
    ///     var.for_env("local", "hardcoded", "dev".to_string())?
    ///         .for_env("ci", "hardcoded", "test".to_string())
    /// })?;
    ///
    /// let resolver = variables.create_dynamic_resolver(
    ///     CandidateEnvironments::new().with_env("local", ()).with_env("ci", ()),
    ///     || "ci",
    /// )?;
    /// assert_eq!(resolver.env_name(), "ci");
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    pub fn create_dynamic_resolver<F, S>(
        &self,
        candidates: CandidateEnvironments,
        select: F,
    ) -> Result<Resolver>
    where
        F: FnOnce() -> S,
        S: AsRef<str>,
    {
        if candidates.is_empty() {
            return Err(RegistryError::NoCandidateEnvironments);
        }

        let mut possible = Vec::with_capacity(candidates.len());
        let mut inputs = HashMap::with_capacity(candidates.len());
        for candidate in candidates.candidates {
            let environment = self.environments.require(&candidate.name)?;
            (candidate.data_check)(environment)?;
            self.check_dynamic(&candidate.name, &candidate.dynamic)?;

            possible.push(candidate.name.clone());
            inputs.insert(
                candidate.name,
                EnvironmentInput {
                    data: candidate.data,
                    dynamic: Arc::new(candidate.dynamic),
                },
            );
        }

        let selected = select().as_ref().to_string();
        let Some(input) = inputs.remove(&selected) else {
            return Err(RegistryError::SelectedEnvironmentNotCandidate(selected));
        };

        tracing::debug!(
            env = %selected,
            candidates = ?possible,
            variables = self.len(),
            "created dynamic resolver"
        );
        Ok(Resolver::new(self.clone(), selected, possible, input))
    }

    fn check_dynamic(&self, env: &str, dynamic: &DynamicData) -> Result<()> {
        let required = self.dynamic_names(env);
        if let Some(missing) = required.iter().find(|name| !dynamic.contains_key(**name)) {
            return Err(RegistryError::MissingDynamicValue {
                env: env.to_string(),
                name: missing.to_string(),
            });
        }

        let mut supplied: Vec<_> = dynamic.keys().collect();
        supplied.sort();
        if let Some(unexpected) = supplied
            .into_iter()
            .find(|name| !required.contains(name.as_str()))
        {
            return Err(RegistryError::UnexpectedDynamicValue {
                env: env.to_string(),
                name: unexpected.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableRegistry")
            .field("environments", &self.environments.environment_names().collect::<Vec<_>>())
            .field("variables", &self.variable_names().collect::<Vec<_>>())
            .finish()
    }
}
