//! The root registry of environments.

use crate::core::environment::{Environment, EnvironmentDefinition};
use crate::core::{TypeDef, VariableRegistry};
use crate::error::{RegistryError, Result};
use std::any::Any;
use std::sync::Arc;

/// An immutable, appendable collection of environments.
///
/// Every [`add_env`](Self::add_env) returns a new registry; the receiver keeps
/// its environments. Cloning is cheap and clones compare as the same registry
/// for [`VariableRegistry::merge_with`].
///
/// # Examples
///
/// ```rust
/// use envar_registry::prelude::*;
/// use std::collections::HashMap;
///
/// struct CiData {
///     secrets: HashMap<String, String>,
/// }
///
/// # fn example() -> Result<()> {
/// let environments = EnvironmentRegistry::new()
///     .add_env("local", define_type::<()>(), |env| {
///         env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
///     })?
///     .add_env("ci", define_type::<CiData>(), |env| {
///         env.add_resolution("from-secrets", define_type::<()>(), |i| {
///             i.env_data.secrets.get(&i.variable_name).cloned()
///         })
///     })?;
///
/// let variables = environments.create_variable_registry();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct EnvironmentRegistry {
    environments: Arc<Vec<Arc<EnvironmentDefinition>>>,
}

impl EnvironmentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment named `name` whose data is of type `D`.
    ///
    /// `configure` receives an empty [`Environment`] and returns it with its
    /// resolutions added.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An environment named `name` already exists
    /// - `configure` fails (e.g. a duplicate resolution tag)
    /// - `configure` returns an environment under a different name
    pub fn add_env<D, F>(
        &self,
        name: impl Into<String>,
        _data: TypeDef<D>,
        configure: F,
    ) -> Result<Self>
    where
        D: Any + Send + Sync,
        F: FnOnce(Environment<D>) -> Result<Environment<D>>,
    {
        let name = name.into();
        if self.environment(&name).is_some() {
            return Err(RegistryError::DuplicateEnvironment(name));
        }

        let environment = configure(Environment::new(name.clone()))?;
        if environment.name() != name {
            return Err(RegistryError::ConfigureMismatch {
                kind: "environment",
                expected: name,
                found: environment.name().to_string(),
            });
        }

        let definition = environment.into_definition();
        tracing::debug!(
            env = %name,
            data_type = definition.data_type_name(),
            resolutions = definition.tags().count(),
            "registered environment"
        );

        let mut environments = self.environments.as_ref().clone();
        environments.push(Arc::new(definition));
        Ok(Self {
            environments: Arc::new(environments),
        })
    }

    /// Create an empty variable registry bound to this registry.
    pub fn create_variable_registry(&self) -> VariableRegistry {
        VariableRegistry::new(self.clone())
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Option<&EnvironmentDefinition> {
        self.environments
            .iter()
            .find(|env| env.name() == name)
            .map(|env| env.as_ref())
    }

    /// Environment names in registration order.
    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.environments.iter().map(|env| env.name())
    }

    /// Number of registered environments.
    pub fn len(&self) -> usize {
        self.environments.len()
    }

    /// Check if the registry has no environments.
    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    pub(crate) fn require(&self, name: &str) -> Result<&EnvironmentDefinition> {
        self.environment(name)
            .ok_or_else(|| RegistryError::InvalidEnvironmentReference(name.to_string()))
    }

    /// Whether two handles refer to the same registry value.
    pub(crate) fn same_as(&self, other: &EnvironmentRegistry) -> bool {
        Arc::ptr_eq(&self.environments, &other.environments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::define_type;

    fn with_local() -> EnvironmentRegistry {
        EnvironmentRegistry::new()
            .add_env("local", define_type::<()>(), |env| {
                env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
            })
            .unwrap()
    }

    #[test]
    fn test_add_env() {
        let registry = with_local();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.environment("local").map(|e| e.tags().collect::<Vec<_>>()),
            Some(vec!["hardcoded"])
        );
    }

    #[test]
    fn test_duplicate_environment_rejected() {
        let registry = with_local();
        let result = registry.add_env("local", define_type::<u32>(), Ok);

        assert!(matches!(result, Err(RegistryError::DuplicateEnvironment(ref n)) if n == "local"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_configure_errors_propagate() {
        let result = EnvironmentRegistry::new().add_env("local", define_type::<()>(), |env| {
            env.add_resolution("a", define_type::<()>(), |_| "a")?
                .add_resolution("a", define_type::<()>(), |_| "b")
        });
        assert!(matches!(result, Err(RegistryError::DuplicateResolutionTag { .. })));
    }

    #[test]
    fn test_configure_must_keep_name() {
        let result = EnvironmentRegistry::new()
            .add_env("local", define_type::<()>(), |_| Ok(Environment::new("other".to_string())));
        assert!(matches!(
            result,
            Err(RegistryError::ConfigureMismatch { kind: "environment", .. })
        ));
    }

    #[test]
    fn test_add_env_is_persistent() {
        let base = with_local();
        let extended = base.add_env("ci", define_type::<()>(), Ok).unwrap();

        assert_eq!(base.environment_names().collect::<Vec<_>>(), ["local"]);
        assert_eq!(extended.environment_names().collect::<Vec<_>>(), ["local", "ci"]);
        assert!(!base.same_as(&extended));
        assert!(base.same_as(&base.clone()));
    }
}
