//! Values produced by resolution functions.

use crate::error::BoxError;
use std::borrow::Cow;

/// The raw outcome of a resolution function, before validation.
#[derive(Debug)]
pub enum ResolvedValue {
    /// A string value.
    Text(String),
    /// No value was produced.
    Nullish,
    /// A value that is not a string; carries the kind for diagnostics.
    NonString(&'static str),
    /// The resolution function failed.
    Failed(BoxError),
}

/// Conversion from a resolution function's return type into a [`ResolvedValue`].
///
/// Resolution functions may return a plain string, an `Option` (where `None`
/// is reported as a null result), or a `Result` carrying the caller's error.
///
/// # Examples
///
/// ```rust
/// use envar_registry::resolve::{IntoResolvedValue, ResolvedValue};
///
/// assert!(matches!("x".into_resolved_value(), ResolvedValue::Text(_)));
/// assert!(matches!(None::<String>.into_resolved_value(), ResolvedValue::Nullish));
/// ```
pub trait IntoResolvedValue {
    /// Convert into a resolved value.
    fn into_resolved_value(self) -> ResolvedValue;
}

impl IntoResolvedValue for ResolvedValue {
    fn into_resolved_value(self) -> ResolvedValue {
        self
    }
}

impl IntoResolvedValue for String {
    fn into_resolved_value(self) -> ResolvedValue {
        ResolvedValue::Text(self)
    }
}

impl IntoResolvedValue for &'static str {
    fn into_resolved_value(self) -> ResolvedValue {
        ResolvedValue::Text(self.to_string())
    }
}

impl IntoResolvedValue for Cow<'static, str> {
    fn into_resolved_value(self) -> ResolvedValue {
        ResolvedValue::Text(self.into_owned())
    }
}

impl<T: IntoResolvedValue> IntoResolvedValue for Option<T> {
    fn into_resolved_value(self) -> ResolvedValue {
        match self {
            Some(value) => value.into_resolved_value(),
            None => ResolvedValue::Nullish,
        }
    }
}

impl<T, E> IntoResolvedValue for Result<T, E>
where
    T: IntoResolvedValue,
    E: Into<BoxError>,
{
    fn into_resolved_value(self) -> ResolvedValue {
        match self {
            Ok(value) => value.into_resolved_value(),
            Err(err) => ResolvedValue::Failed(err.into()),
        }
    }
}

#[cfg(feature = "json")]
impl IntoResolvedValue for serde_json::Value {
    fn into_resolved_value(self) -> ResolvedValue {
        use serde_json::Value;

        match self {
            Value::String(s) => ResolvedValue::Text(s),
            Value::Null => ResolvedValue::Nullish,
            Value::Bool(_) => ResolvedValue::NonString("boolean"),
            Value::Number(_) => ResolvedValue::NonString("number"),
            Value::Array(_) => ResolvedValue::NonString("array"),
            Value::Object(_) => ResolvedValue::NonString("object"),
        }
    }
}
