//! Synchronous/asynchronous status of a resolution and its runtime result form.

use crate::error::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::future::IntoFuture;

/// Whether a resolution completes synchronously or through a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AsyncStatus {
    /// The value is available immediately.
    #[default]
    Sync,
    /// The value is produced by a future.
    Async,
}

impl AsyncStatus {
    /// Combine two statuses; `Async` wins.
    pub fn merge(self, other: AsyncStatus) -> AsyncStatus {
        if self.is_async() || other.is_async() {
            AsyncStatus::Async
        } else {
            AsyncStatus::Sync
        }
    }

    /// Combine any number of statuses. An empty set is `Sync`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use envar_registry::resolve::AsyncStatus;
    ///
    /// let merged = AsyncStatus::merge_all([AsyncStatus::Sync, AsyncStatus::Async]);
    /// assert_eq!(merged, AsyncStatus::Async);
    /// assert_eq!(AsyncStatus::merge_all([]), AsyncStatus::Sync);
    /// ```
    pub fn merge_all(statuses: impl IntoIterator<Item = AsyncStatus>) -> AsyncStatus {
        statuses
            .into_iter()
            .fold(AsyncStatus::Sync, AsyncStatus::merge)
    }

    /// Returns true for `Async`.
    pub fn is_async(self) -> bool {
        matches!(self, AsyncStatus::Async)
    }
}

impl fmt::Display for AsyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncStatus::Sync => write!(f, "sync"),
            AsyncStatus::Async => write!(f, "async"),
        }
    }
}

/// A value that is either ready now or still pending.
///
/// Returned by resolver lookups. Which variant comes back is decided by the
/// resolver's possible environments, not by the call that happened to run, so
/// a call site sees the same shape whichever candidate environment is bound.
///
/// Both variants can be awaited:
///
/// ```rust
/// use envar_registry::resolve::Resolved;
///
/// # async fn example() -> envar_registry::error::Result<()> {
/// let value = Resolved::Ready("value".to_string());
/// assert_eq!(value.await?, "value");
/// # Ok(())
/// # }
/// ```
pub enum Resolved<T> {
    /// The value is available.
    Ready(T),
    /// The value will be produced by the future.
    Pending(BoxFuture<'static, Result<T>>),
}

impl<T: Send + 'static> Resolved<T> {
    /// Wrap a ready value in a future, keeping the pending shape.
    pub(crate) fn deferred(value: T) -> Self {
        Resolved::Pending(futures::future::ready(Ok(value)).boxed())
    }

    /// The status of this value.
    pub fn status(&self) -> AsyncStatus {
        match self {
            Resolved::Ready(_) => AsyncStatus::Sync,
            Resolved::Pending(_) => AsyncStatus::Async,
        }
    }

    /// Returns true if the value is available without awaiting.
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolved::Ready(_))
    }

    /// Take the ready value, or give back the pending one.
    pub fn try_ready(self) -> std::result::Result<T, Self> {
        match self {
            Resolved::Ready(value) => Ok(value),
            pending => Err(pending),
        }
    }

    /// Transform the value, whether ready or pending.
    pub fn map<U, F>(self, f: F) -> Resolved<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Resolved::Ready(value) => Resolved::Ready(f(value)),
            Resolved::Pending(fut) => Resolved::Pending(fut.map(|r| r.map(f)).boxed()),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Resolved<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Resolved::Ready(value) => futures::future::ready(Ok(value)).boxed(),
            Resolved::Pending(fut) => fut,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolved<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Resolved::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        use AsyncStatus::*;

        assert_eq!(Sync.merge(Sync), Sync);
        assert_eq!(Sync.merge(Async), Async);
        assert_eq!(Async.merge(Sync), Async);
        assert_eq!(AsyncStatus::merge_all([Sync, Sync, Sync]), Sync);
        assert_eq!(AsyncStatus::merge_all([Sync, Async, Sync]), Async);
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(AsyncStatus::Async.to_string(), "async");
        assert_eq!(
            serde_json::to_string(&AsyncStatus::Sync).unwrap(),
            "\"sync\""
        );
    }

    #[test]
    fn test_try_ready() {
        let ready: Resolved<u32> = Resolved::Ready(7);
        assert_eq!(ready.status(), AsyncStatus::Sync);
        assert_eq!(ready.try_ready().unwrap(), 7);

        let pending = Resolved::deferred(7u32);
        assert_eq!(pending.status(), AsyncStatus::Async);
        assert!(pending.try_ready().is_err());
    }

    #[tokio::test]
    async fn test_map_pending() {
        let pending = Resolved::deferred(20u32).map(|v| v + 1);
        assert!(!pending.is_ready());
        assert_eq!(pending.await.unwrap(), 21);
    }
}
