//! Environments and their resolution strategies.

use crate::core::resolution::{ResolutionDefinition, ResolveInput};
use crate::core::{Payload, TypeDef};
use crate::error::{RegistryError, Result};
use crate::resolve::IntoResolvedValue;
use std::any::{Any, TypeId};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A registered environment: its name, data type, and resolutions.
///
/// This is the type-erased form stored by an
/// [`EnvironmentRegistry`](crate::core::EnvironmentRegistry). It is built
/// through [`Environment`].
#[derive(Clone)]
pub struct EnvironmentDefinition {
    name: String,
    data_type: TypeId,
    data_type_name: &'static str,
    resolutions: Vec<Arc<ResolutionDefinition>>,
}

impl EnvironmentDefinition {
    /// The environment's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the data type resolvers must supply for this environment.
    pub fn data_type_name(&self) -> &'static str {
        self.data_type_name
    }

    /// Resolution tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.resolutions.iter().map(|r| r.tag())
    }

    /// Look up a resolution by tag.
    pub fn resolution(&self, tag: &str) -> Option<&ResolutionDefinition> {
        self.resolutions
            .iter()
            .find(|r| r.tag() == tag)
            .map(|r| r.as_ref())
    }

    pub(crate) fn accepts_data(&self, data_type: TypeId) -> bool {
        self.data_type == data_type
    }

    pub(crate) fn check_data<D: Any>(&self) -> Result<()> {
        if self.accepts_data(TypeId::of::<D>()) {
            Ok(())
        } else {
            Err(RegistryError::EnvironmentDataMismatch {
                env: self.name.clone(),
                expected: self.data_type_name,
                found: std::any::type_name::<D>(),
            })
        }
    }
}

impl std::fmt::Debug for EnvironmentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentDefinition")
            .field("name", &self.name)
            .field("data_type", &self.data_type_name)
            .field("resolutions", &self.resolutions)
            .finish()
    }
}

/// Builder for one environment with data of type `D`.
///
/// Handed to the configure closure of
/// [`EnvironmentRegistry::add_env`](crate::core::EnvironmentRegistry::add_env).
/// Each `add_*` call returns a new `Environment` and leaves the receiver as it
/// was.
///
/// # Examples
///
/// ```rust
/// use envar_registry::core::{EnvironmentRegistry, define_type};
/// use std::collections::HashMap;
///
/// struct LocalData {
///     env: HashMap<String, String>,
/// }
///
/// # fn example() -> envar_registry::error::Result<()> {
/// let registry = EnvironmentRegistry::new().add_env(
///     "local",
///     define_type::<LocalData>(),
///     |env| {
///         env.add_resolution("hardcoded", define_type::<String>(), |input| {
///             input.payload.to_string()
///         })?
///         .add_resolution("from-env", define_type::<Option<String>>(), |input| {
///             let key = input.payload.as_deref().unwrap_or(&input.variable_name);
///             input.env_data.env.get(key).cloned()
///         })
///     },
/// )?;
/// assert_eq!(registry.environment_names().collect::<Vec<_>>(), ["local"]);
/// # Ok(())
/// # }
/// ```
pub struct Environment<D> {
    definition: EnvironmentDefinition,
    _data: PhantomData<fn() -> D>,
}

impl<D: Any + Send + Sync> Environment<D> {
    pub(crate) fn new(name: String) -> Self {
        Self {
            definition: EnvironmentDefinition {
                name,
                data_type: TypeId::of::<D>(),
                data_type_name: std::any::type_name::<D>(),
                resolutions: Vec::new(),
            },
            _data: PhantomData,
        }
    }

    /// The environment's name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Number of resolutions defined so far.
    pub fn resolution_count(&self) -> usize {
        self.definition.resolutions.len()
    }

    /// Add a synchronous resolution.
    ///
    /// `f` receives the environment data, the variable's payload of type `P`,
    /// and the variable name. It may return a `String`, an `Option` (where
    /// `None` is an error at resolution time), or a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateResolutionTag`] if `tag` already
    /// exists in this environment.
    pub fn add_resolution<P, F, O>(
        &self,
        tag: impl Into<String>,
        _payload: TypeDef<P>,
        f: F,
    ) -> Result<Self>
    where
        P: Payload,
        F: Fn(ResolveInput<D, P>) -> O + Send + Sync + 'static,
        O: IntoResolvedValue,
    {
        let tag = self.check_tag(tag.into())?;
        Ok(self.with_resolution(ResolutionDefinition::new_sync(tag, f)))
    }

    /// Add an asynchronous resolution.
    ///
    /// Variables bound to this resolution resolve through a future, and so does
    /// any lookup whose possible environments include it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateResolutionTag`] if `tag` already
    /// exists in this environment.
    pub fn add_async_resolution<P, F, Fut>(
        &self,
        tag: impl Into<String>,
        _payload: TypeDef<P>,
        f: F,
    ) -> Result<Self>
    where
        P: Payload,
        F: Fn(ResolveInput<D, P>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResolvedValue,
    {
        let tag = self.check_tag(tag.into())?;
        Ok(self.with_resolution(ResolutionDefinition::new_async(tag, f)))
    }

    fn check_tag(&self, tag: String) -> Result<String> {
        if self.definition.resolution(&tag).is_some() {
            return Err(RegistryError::DuplicateResolutionTag {
                env: self.definition.name.clone(),
                tag,
            });
        }
        Ok(tag)
    }

    fn with_resolution(&self, resolution: ResolutionDefinition) -> Self {
        let mut definition = self.definition.clone();
        definition.resolutions.push(Arc::new(resolution));
        Self {
            definition,
            _data: PhantomData,
        }
    }

    pub(crate) fn into_definition(self) -> EnvironmentDefinition {
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::define_type;
    use crate::resolve::AsyncStatus;

    struct Data;

    #[test]
    fn test_add_resolutions_in_order() {
        let env = Environment::<Data>::new("local".to_string())
            .add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
            .unwrap()
            .add_async_resolution("remote", define_type::<()>(), |_| async { "remote" })
            .unwrap();

        let definition = env.into_definition();
        assert_eq!(definition.tags().collect::<Vec<_>>(), ["hardcoded", "remote"]);
        assert_eq!(
            definition.resolution("remote").map(|r| r.status()),
            Some(AsyncStatus::Async)
        );
        assert!(definition.resolution("missing").is_none());
    }

    #[test]
    fn test_duplicate_tag_rejected_and_receiver_untouched() {
        let env = Environment::<Data>::new("local".to_string())
            .add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
            .unwrap();

        let result = env.add_resolution("hardcoded", define_type::<()>(), |_| "x");
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateResolutionTag { ref env, ref tag })
                if env == "local" && tag == "hardcoded"
        ));
        assert_eq!(env.resolution_count(), 1);
    }

    #[test]
    fn test_builder_is_persistent() {
        let base = Environment::<Data>::new("ci".to_string());
        let extended = base
            .add_resolution("a", define_type::<()>(), |_| "a")
            .unwrap();

        assert_eq!(base.resolution_count(), 0);
        assert_eq!(extended.resolution_count(), 1);
    }

    #[test]
    fn test_check_data() {
        let definition = Environment::<Data>::new("ci".to_string()).into_definition();
        assert!(definition.check_data::<Data>().is_ok());
        assert!(matches!(
            definition.check_data::<String>(),
            Err(RegistryError::EnvironmentDataMismatch { .. })
        ));
    }
}
