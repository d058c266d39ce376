//! Resolution strategies: one named function per environment.

use crate::core::Payload;
use crate::error::{RegistryError, Result};
use crate::resolve::{AsyncStatus, IntoResolvedValue, ResolvedValue};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::future::Future;
use std::sync::Arc;

/// Shared, type-erased value handed to resolution functions.
pub(crate) type SharedAny = Arc<dyn Any + Send + Sync>;

type SyncResolveFn = Arc<dyn Fn(ErasedInput) -> Result<ResolvedValue> + Send + Sync>;
type AsyncResolveFn =
    Arc<dyn Fn(ErasedInput) -> Result<BoxFuture<'static, ResolvedValue>> + Send + Sync>;

/// Input passed to a resolution function.
///
/// All fields are owned so asynchronous functions can move the input into
/// the returned future.
#[derive(Debug)]
pub struct ResolveInput<D, P> {
    /// Data supplied for the bound environment when the resolver was created.
    pub env_data: Arc<D>,
    /// Payload bound by the variable definition.
    pub payload: Arc<P>,
    /// Name of the variable being resolved.
    pub variable_name: String,
}

/// Type-erased resolve input, downcast inside the stored closure.
pub(crate) struct ErasedInput {
    pub(crate) env: String,
    pub(crate) tag: String,
    pub(crate) env_data: SharedAny,
    pub(crate) payload: SharedAny,
    pub(crate) variable_name: String,
}

impl ErasedInput {
    fn downcast<D, P>(self) -> Result<ResolveInput<D, P>>
    where
        D: Any + Send + Sync,
        P: Payload,
    {
        let ErasedInput {
            env,
            tag,
            env_data,
            payload,
            variable_name,
        } = self;

        let env_data = env_data
            .downcast::<D>()
            .map_err(|_| RegistryError::EnvironmentDataMismatch {
                env: env.clone(),
                expected: std::any::type_name::<D>(),
                found: "unknown",
            })?;
        let payload = payload
            .downcast::<P>()
            .map_err(|_| RegistryError::PayloadTypeMismatch {
                env,
                tag,
                expected: std::any::type_name::<P>(),
                found: "unknown",
            })?;

        Ok(ResolveInput {
            env_data,
            payload,
            variable_name,
        })
    }
}

/// The stored resolution function, tagged with its status.
#[derive(Clone)]
pub(crate) enum ResolveFn {
    Sync(SyncResolveFn),
    Async(AsyncResolveFn),
}

/// The result of invoking a resolution function.
pub(crate) enum Invocation {
    Ready(ResolvedValue),
    Pending(BoxFuture<'static, ResolvedValue>),
}

/// One named resolution strategy of an environment.
///
/// Holds the tag, the payload type it accepts, whether it runs synchronously,
/// and the function itself. The function is only ever called by a
/// [`Resolver`](crate::resolve::Resolver).
#[derive(Clone)]
pub struct ResolutionDefinition {
    tag: String,
    payload_type: TypeId,
    payload_type_name: &'static str,
    omitted_payload: Option<SharedAny>,
    resolve: ResolveFn,
}

impl ResolutionDefinition {
    pub(crate) fn new_sync<D, P, F, O>(tag: String, f: F) -> Self
    where
        D: Any + Send + Sync,
        P: Payload,
        F: Fn(ResolveInput<D, P>) -> O + Send + Sync + 'static,
        O: IntoResolvedValue,
    {
        let resolve = ResolveFn::Sync(Arc::new(move |input: ErasedInput| {
            let input = input.downcast::<D, P>()?;
            Ok(f(input).into_resolved_value())
        }));
        Self::with_fn::<P>(tag, resolve)
    }

    pub(crate) fn new_async<D, P, F, Fut>(tag: String, f: F) -> Self
    where
        D: Any + Send + Sync,
        P: Payload,
        F: Fn(ResolveInput<D, P>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResolvedValue,
    {
        let resolve = ResolveFn::Async(Arc::new(move |input: ErasedInput| {
            let input = input.downcast::<D, P>()?;
            Ok(f(input).map(IntoResolvedValue::into_resolved_value).boxed())
        }));
        Self::with_fn::<P>(tag, resolve)
    }

    fn with_fn<P: Payload>(tag: String, resolve: ResolveFn) -> Self {
        Self {
            tag,
            payload_type: TypeId::of::<P>(),
            payload_type_name: std::any::type_name::<P>(),
            omitted_payload: P::when_omitted().map(|p| Arc::new(p) as SharedAny),
            resolve,
        }
    }

    /// The resolution's tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the resolution function is synchronous or asynchronous.
    pub fn status(&self) -> AsyncStatus {
        match self.resolve {
            ResolveFn::Sync(_) => AsyncStatus::Sync,
            ResolveFn::Async(_) => AsyncStatus::Async,
        }
    }

    /// Name of the payload type this resolution accepts.
    pub fn payload_type_name(&self) -> &'static str {
        self.payload_type_name
    }

    /// Whether variables may bind this resolution without a payload.
    pub fn payload_optional(&self) -> bool {
        self.omitted_payload.is_some()
    }

    pub(crate) fn accepts_payload(&self, payload_type: TypeId) -> bool {
        self.payload_type == payload_type
    }

    pub(crate) fn omitted_payload(&self) -> Option<SharedAny> {
        self.omitted_payload.clone()
    }

    pub(crate) fn invoke(&self, input: ErasedInput) -> Result<Invocation> {
        match &self.resolve {
            ResolveFn::Sync(f) => f(input).map(Invocation::Ready),
            ResolveFn::Async(f) => f(input).map(Invocation::Pending),
        }
    }
}

impl std::fmt::Debug for ResolutionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionDefinition")
            .field("tag", &self.tag)
            .field("status", &self.status())
            .field("payload_type", &self.payload_type_name)
            .finish()
    }
}
