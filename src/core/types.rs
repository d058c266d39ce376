//! Type tags and payload support.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;

/// Zero-sized carrier naming a type at a call site.
///
/// Builders take a `TypeDef` so environment data and payload types are
/// stated once and the resolve function's signature is inferred from them.
///
/// # Examples
///
/// ```rust
/// use envar_registry::core::{TypeDef, define_type};
///
/// struct LocalData;
///
/// let tag: TypeDef<LocalData> = define_type();
/// assert!(tag.type_name().ends_with("LocalData"));
/// ```
pub struct TypeDef<T: ?Sized>(PhantomData<fn() -> T>);

/// Create a [`TypeDef`] for `T`.
pub const fn define_type<T: ?Sized>() -> TypeDef<T> {
    TypeDef(PhantomData)
}

impl<T: ?Sized> TypeDef<T> {
    /// Fully qualified name of the carried type.
    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: ?Sized> Clone for TypeDef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for TypeDef<T> {}

impl<T: ?Sized> Default for TypeDef<T> {
    fn default() -> Self {
        define_type()
    }
}

impl<T: ?Sized> fmt::Debug for TypeDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDef<{}>", self.type_name())
    }
}

/// A value that can be bound to a variable as a resolution payload.
///
/// The only decision a payload type makes is whether it may be omitted.
/// `when_omitted` returns `None` for required payloads (the default) and
/// the value to use otherwise. `Option<T>` and `()` may be omitted.
///
/// Implement it for your own payload types with an empty `impl`:
///
/// ```rust
/// use envar_registry::core::Payload;
///
/// struct SecretRef {
///     path: String,
///     field: String,
/// }
///
/// impl Payload for SecretRef {}
/// ```
pub trait Payload: Any + Send + Sync {
    /// Value used when a variable binds this resolution without a payload.
    fn when_omitted() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

impl Payload for () {
    fn when_omitted() -> Option<Self> {
        Some(())
    }
}

impl<T: Payload> Payload for Option<T> {
    fn when_omitted() -> Option<Self> {
        Some(None)
    }
}

macro_rules! required_payload {
    ($($ty:ty),* $(,)?) => {
        $(impl Payload for $ty {})*
    };
}

required_payload!(
    String,
    &'static str,
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    isize,
    f32,
    f64,
    HashMap<String, String>,
    BTreeMap<String, String>,
);

impl<T: Payload> Payload for Vec<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_def_is_zero_sized() {
        assert_eq!(std::mem::size_of::<TypeDef<String>>(), 0);
        assert_eq!(define_type::<String>().type_name(), "alloc::string::String");
    }

    #[test]
    fn test_omission_rules() {
        assert!(String::when_omitted().is_none());
        assert!(<Vec<String>>::when_omitted().is_none());
        assert_eq!(<()>::when_omitted(), Some(()));
        assert_eq!(<Option<String>>::when_omitted(), Some(None));
    }
}
