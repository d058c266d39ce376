//! Error types for envar-registry.

/// Result type alias for envar-registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Boxed error produced by a caller-supplied resolution function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building registries or resolving variables.
///
/// Construction errors are returned from the offending builder call so that
/// misconfiguration surfaces at startup. Resolution errors come from
/// [`Resolver`](crate::resolve::Resolver) lookups.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An environment with this name is already registered.
    #[error("Environment '{0}' is already registered")]
    DuplicateEnvironment(String),

    /// A resolution with this tag already exists in the environment.
    #[error("Resolution tag '{tag}' is already defined in environment '{env}'")]
    DuplicateResolutionTag {
        /// Environment that owns the tag
        env: String,
        /// The duplicated tag
        tag: String,
    },

    /// A variable with this name is already registered.
    #[error("Variable '{0}' is already registered")]
    DuplicateVariableName(String),

    /// Variable names must be non-empty and upper-case.
    #[error("Invalid variable name '{0}': names must be non-empty and upper-case")]
    InvalidVariableName(String),

    /// A variable was bound twice for the same environment.
    #[error("Variable '{variable}' already has a definition for environment '{env}'")]
    DuplicateEnvironmentBinding {
        /// The variable being configured
        variable: String,
        /// The environment bound twice
        env: String,
    },

    /// The referenced environment does not exist in the registry.
    #[error("Unknown environment '{0}'")]
    InvalidEnvironmentReference(String),

    /// The referenced resolution tag does not exist in the environment.
    #[error("Unknown resolution tag '{tag}' for environment '{env}'")]
    InvalidResolutionTagReference {
        /// Environment that was searched
        env: String,
        /// The unknown tag
        tag: String,
    },

    /// A payload was omitted for a resolution whose payload type is required.
    #[error("Resolution '{tag}' in environment '{env}' requires a payload of type {expected}")]
    MissingPayload {
        /// Environment of the resolution
        env: String,
        /// Resolution tag
        tag: String,
        /// Declared payload type
        expected: &'static str,
    },

    /// A payload of the wrong type was supplied.
    #[error("Resolution '{tag}' in environment '{env}' expects a payload of type {expected}, got {found}")]
    PayloadTypeMismatch {
        /// Environment of the resolution
        env: String,
        /// Resolution tag
        tag: String,
        /// Declared payload type
        expected: &'static str,
        /// Supplied payload type
        found: &'static str,
    },

    /// Environment data of the wrong type was supplied to a resolver.
    #[error("Environment '{env}' expects data of type {expected}, got {found}")]
    EnvironmentDataMismatch {
        /// The environment
        env: String,
        /// Declared data type
        expected: &'static str,
        /// Supplied data type
        found: &'static str,
    },

    /// A configure closure returned a builder under a different name.
    #[error("Configured {kind} must keep the name '{expected}', got '{found}'")]
    ConfigureMismatch {
        /// "environment" or "variable"
        kind: &'static str,
        /// Name passed to the registry
        expected: String,
        /// Name of the returned builder
        found: String,
    },

    /// Two variable registries built from different environment registries were merged.
    #[error("Cannot merge variable registries built from different environment registries")]
    RegistryMismatch,

    /// Dynamic data is missing a value required by the environment.
    #[error("Environment '{env}' requires dynamic value '{name}'")]
    MissingDynamicValue {
        /// The environment
        env: String,
        /// The missing dynamic name
        name: String,
    },

    /// Dynamic data supplies a value no variable uses in the environment.
    #[error("Environment '{env}' does not use dynamic value '{name}'")]
    UnexpectedDynamicValue {
        /// The environment
        env: String,
        /// The unexpected dynamic name
        name: String,
    },

    /// A dynamic resolver was created without candidate environments.
    #[error("A dynamic resolver needs at least one candidate environment")]
    NoCandidateEnvironments,

    /// The selector picked an environment that is not a candidate.
    #[error("Selected environment '{0}' is not one of the candidate environments")]
    SelectedEnvironmentNotCandidate(String),

    /// The requested variable is not registered.
    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    /// The variable has no definition for the resolver's environment.
    #[error("Variable '{variable}' has no definition for environment '{env}'")]
    NoDefinitionForEnvironment {
        /// The variable
        variable: String,
        /// The bound environment
        env: String,
    },

    /// The definition's tag has no resolution in the bound environment.
    #[error("No resolution '{tag}' found in environment '{env}' for variable '{variable}'")]
    NoResolutionFound {
        /// The variable
        variable: String,
        /// The bound environment
        env: String,
        /// The missing tag
        tag: String,
    },

    /// The resolution produced no value.
    #[error("Variable '{variable}' resolved to a null value in environment '{env}'")]
    ResolvedToNullish {
        /// The variable
        variable: String,
        /// The bound environment
        env: String,
    },

    /// The resolution produced something other than a string.
    #[error("Variable '{variable}' resolved to a non-string value ({kind}) in environment '{env}'")]
    ResolvedToNonString {
        /// The variable
        variable: String,
        /// The bound environment
        env: String,
        /// Kind of value produced
        kind: &'static str,
    },

    /// The resolution function itself failed.
    #[error("Resolution of variable '{variable}' failed in environment '{env}': {source}")]
    ResolutionFailed {
        /// The variable
        variable: String,
        /// The bound environment
        env: String,
        /// Error returned by the resolution function
        #[source]
        source: BoxError,
    },

    /// A variable matched by `get_all_for` is not defined for the current environment.
    #[error("Variable '{variable}' is not defined in current environment '{env}'")]
    VariableNotDefinedInCurrentEnvironment {
        /// The variable
        variable: String,
        /// The environment lacking a definition
        env: String,
    },

    /// `get_all_for` was asked to target the resolver's own environment.
    #[error("Target environment '{0}' is the resolver's current environment")]
    TargetIsCurrentEnvironment(String),
}

impl RegistryError {
    /// Returns true for errors raised while building registries, as opposed
    /// to errors raised during resolution.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            Self::VariableNotFound(_)
                | Self::NoDefinitionForEnvironment { .. }
                | Self::NoResolutionFound { .. }
                | Self::ResolvedToNullish { .. }
                | Self::ResolvedToNonString { .. }
                | Self::ResolutionFailed { .. }
                | Self::VariableNotDefinedInCurrentEnvironment { .. }
                | Self::TargetIsCurrentEnvironment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RegistryError::DuplicateResolutionTag {
            env: "local".to_string(),
            tag: "hardcoded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Resolution tag 'hardcoded' is already defined in environment 'local'"
        );

        let err = RegistryError::VariableNotFound("PORT".to_string());
        assert_eq!(err.to_string(), "Variable 'PORT' not found");
    }

    #[test]
    fn test_resolution_failed_keeps_source() {
        let source: BoxError = "secret store unavailable".into();
        let err = RegistryError::ResolutionFailed {
            variable: "API_KEY".to_string(),
            env: "prod".to_string(),
            source,
        };

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("secret store unavailable"));
    }

    #[test]
    fn test_configuration_error_classification() {
        assert!(RegistryError::DuplicateEnvironment("ci".into()).is_configuration_error());
        assert!(RegistryError::MissingDynamicValue {
            env: "ci".into(),
            name: "token".into()
        }
        .is_configuration_error());
        assert!(!RegistryError::VariableNotFound("X".into()).is_configuration_error());
    }
}
