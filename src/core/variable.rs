//! Variables and their per-environment definitions.

use crate::core::resolution::SharedAny;
use crate::core::{EnvironmentRegistry, Payload};
use crate::error::{RegistryError, Result};
use serde::Serialize;
use std::any::TypeId;
use std::sync::Arc;

/// How a variable is resolved in one environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DefinitionKind {
    /// Resolved by the environment's resolution with this tag.
    UserDefined {
        /// Resolution tag
        tag: String,
    },
    /// Supplied by the caller at resolver creation under this name.
    Dynamic {
        /// Key in the resolver's dynamic data
        dynamic_name: String,
    },
}

/// A variable's binding for one environment.
#[derive(Clone, Serialize)]
pub struct VariableDefinition {
    env: String,
    #[serde(flatten)]
    kind: DefinitionKind,
    #[serde(skip)]
    payload: Option<SharedAny>,
}

impl VariableDefinition {
    /// The environment this definition applies to.
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Whether the value comes from a resolution or from dynamic data.
    pub fn kind(&self) -> &DefinitionKind {
        &self.kind
    }

    /// The resolution tag, for user-defined definitions.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            DefinitionKind::UserDefined { tag } => Some(tag),
            DefinitionKind::Dynamic { .. } => None,
        }
    }

    /// The dynamic name, for dynamic definitions.
    pub fn dynamic_name(&self) -> Option<&str> {
        match &self.kind {
            DefinitionKind::Dynamic { dynamic_name } => Some(dynamic_name),
            DefinitionKind::UserDefined { .. } => None,
        }
    }

    pub(crate) fn payload(&self) -> Option<SharedAny> {
        self.payload.clone()
    }
}

impl std::fmt::Debug for VariableDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableDefinition")
            .field("env", &self.env)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A named variable with at most one definition per environment.
///
/// Handed to the configure closure of
/// [`VariableRegistry::add_var`](crate::core::VariableRegistry::add_var).
/// Every binding call is checked against the environment registry right away
/// and returns a new `Variable`.
#[derive(Clone)]
pub struct Variable {
    name: String,
    environments: EnvironmentRegistry,
    definitions: Vec<Arc<VariableDefinition>>,
}

impl Variable {
    pub(crate) fn new(name: String, environments: EnvironmentRegistry) -> Self {
        Self {
            name,
            environments,
            definitions: Vec::new(),
        }
    }

    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definitions in the order they were added.
    pub fn definitions(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.definitions.iter().map(|d| d.as_ref())
    }

    /// The definition for `env`, if any.
    pub fn definition(&self, env: &str) -> Option<&VariableDefinition> {
        self.definitions().find(|d| d.env == env)
    }

    /// Whether the variable is defined for `env`.
    pub fn is_defined_for(&self, env: &str) -> bool {
        self.definition(env).is_some()
    }

    /// Bind `env` to the resolution `tag` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `env` is not a registered environment
    /// - the variable already has a definition for `env`
    /// - `tag` is not a resolution of `env`
    /// - `payload` is not of the resolution's payload type
    pub fn for_env<P: Payload>(&self, env: &str, tag: &str, payload: P) -> Result<Self> {
        self.check_unbound(env)?;
        let resolution = self.resolution(env, tag)?;
        if !resolution.accepts_payload(TypeId::of::<P>()) {
            return Err(RegistryError::PayloadTypeMismatch {
                env: env.to_string(),
                tag: tag.to_string(),
                expected: resolution.payload_type_name(),
                found: std::any::type_name::<P>(),
            });
        }

        Ok(self.with_definition(VariableDefinition {
            env: env.to_string(),
            kind: DefinitionKind::UserDefined {
                tag: tag.to_string(),
            },
            payload: Some(Arc::new(payload)),
        }))
    }

    /// Bind `env` to the resolution `tag` without a payload.
    ///
    /// Only allowed when the resolution's payload type may be omitted, such
    /// as `Option<T>` or `()`.
    ///
    /// # Errors
    ///
    /// Same as [`for_env`](Self::for_env), plus
    /// [`RegistryError::MissingPayload`] when the payload is required.
    pub fn for_env_without_payload(&self, env: &str, tag: &str) -> Result<Self> {
        self.check_unbound(env)?;
        let resolution = self.resolution(env, tag)?;
        let payload = resolution
            .omitted_payload()
            .ok_or_else(|| RegistryError::MissingPayload {
                env: env.to_string(),
                tag: tag.to_string(),
                expected: resolution.payload_type_name(),
            })?;

        Ok(self.with_definition(VariableDefinition {
            env: env.to_string(),
            kind: DefinitionKind::UserDefined {
                tag: tag.to_string(),
            },
            payload: Some(payload),
        }))
    }

    /// Bind `env` to a value supplied at resolver creation under `dynamic_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `env` is not a registered environment or the
    /// variable already has a definition for it.
    pub fn dynamic_for(&self, env: &str, dynamic_name: impl Into<String>) -> Result<Self> {
        self.check_unbound(env)?;
        Ok(self.with_definition(VariableDefinition {
            env: env.to_string(),
            kind: DefinitionKind::Dynamic {
                dynamic_name: dynamic_name.into(),
            },
            payload: None,
        }))
    }

    fn check_unbound(&self, env: &str) -> Result<()> {
        self.environments.require(env)?;
        if self.is_defined_for(env) {
            return Err(RegistryError::DuplicateEnvironmentBinding {
                variable: self.name.clone(),
                env: env.to_string(),
            });
        }
        Ok(())
    }

    fn resolution(&self, env: &str, tag: &str) -> Result<&crate::core::ResolutionDefinition> {
        self.environments
            .require(env)?
            .resolution(tag)
            .ok_or_else(|| RegistryError::InvalidResolutionTagReference {
                env: env.to_string(),
                tag: tag.to_string(),
            })
    }

    fn with_definition(&self, definition: VariableDefinition) -> Self {
        let mut definitions = self.definitions.clone();
        definitions.push(Arc::new(definition));
        Self {
            name: self.name.clone(),
            environments: self.environments.clone(),
            definitions,
        }
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("definitions", &self.definitions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::define_type;

    fn environments() -> EnvironmentRegistry {
        EnvironmentRegistry::new()
            .add_env("local", define_type::<()>(), |env| {
                env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
                    .add_resolution("from-env", define_type::<Option<String>>(), |i| {
                        (*i.payload).clone()
                    })
            })
            .unwrap()
            .add_env("ci", define_type::<()>(), |env| {
                env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
            })
            .unwrap()
    }

    fn variable(name: &str) -> Variable {
        Variable::new(name.to_string(), environments())
    }

    #[test]
    fn test_for_env_records_definition() {
        let var = variable("PORT")
            .for_env("local", "hardcoded", "8080".to_string())
            .unwrap()
            .dynamic_for("ci", "port")
            .unwrap();

        assert_eq!(var.definitions().count(), 2);
        assert_eq!(var.definition("local").and_then(|d| d.tag()), Some("hardcoded"));
        assert_eq!(var.definition("ci").and_then(|d| d.dynamic_name()), Some("port"));
        assert!(var.definition("prod").is_none());
    }

    #[test]
    fn test_reference_validation() {
        let var = variable("PORT");

        assert!(matches!(
            var.for_env("prod", "hardcoded", "x".to_string()),
            Err(RegistryError::InvalidEnvironmentReference(ref e)) if e == "prod"
        ));
        assert!(matches!(
            var.for_env("ci", "from-env", None::<String>),
            Err(RegistryError::InvalidResolutionTagReference { .. })
        ));
        assert!(matches!(
            var.dynamic_for("prod", "x"),
            Err(RegistryError::InvalidEnvironmentReference(_))
        ));
    }

    #[test]
    fn test_environment_bound_once() {
        let var = variable("PORT").dynamic_for("local", "port").unwrap();

        assert!(matches!(
            var.for_env("local", "hardcoded", "1".to_string()),
            Err(RegistryError::DuplicateEnvironmentBinding { .. })
        ));
        assert!(matches!(
            var.dynamic_for("local", "other"),
            Err(RegistryError::DuplicateEnvironmentBinding { .. })
        ));
    }

    #[test]
    fn test_payload_rules() {
        let var = variable("PORT");

        assert!(matches!(
            var.for_env("local", "hardcoded", 8080u16),
            Err(RegistryError::PayloadTypeMismatch { found: "u16", .. })
        ));
        assert!(matches!(
            var.for_env_without_payload("local", "hardcoded"),
            Err(RegistryError::MissingPayload { .. })
        ));
        assert!(var.for_env_without_payload("local", "from-env").is_ok());
        assert!(var.for_env("local", "from-env", Some("OTHER".to_string())).is_ok());
    }

    #[test]
    fn test_binding_is_persistent() {
        let base = variable("PORT");
        let bound = base.dynamic_for("local", "port").unwrap();

        assert_eq!(base.definitions().count(), 0);
        assert!(base.dynamic_for("local", "port").is_ok());
        assert!(bound.is_defined_for("local"));
    }

    #[test]
    fn test_definition_serializes() {
        let var = variable("PORT")
            .for_env("local", "hardcoded", "8080".to_string())
            .unwrap()
            .dynamic_for("ci", "port")
            .unwrap();

        let json: Vec<serde_json::Value> = var
            .definitions()
            .map(|d| serde_json::to_value(d).unwrap())
            .collect();
        assert_eq!(
            json,
            vec![
                serde_json::json!({"env": "local", "type": "user-defined", "tag": "hardcoded"}),
                serde_json::json!({"env": "ci", "type": "dynamic", "dynamic_name": "port"}),
            ]
        );
    }
}
