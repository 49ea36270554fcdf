//! Key-path resolution over records of unknown shape.
//!
//! Every record exposes its attributes as [`serde_json::Value`] variants
//! (string, number, bool, list, mapping). A key-path such as `Env.VIRTUAL_HOST`
//! is walked one segment at a time; a segment that does not resolve makes the
//! whole path [absent](None) rather than failing.
//!
//! # Example
//!
//! ```
//! use dockergen::query::resolve;
//! use serde_json::json;
//!
//! let record = json!({"Env": {"VIRTUAL_HOST": "demo.local"}});
//! assert_eq!(resolve(&record, "Env.VIRTUAL_HOST").unwrap().as_str(), Some("demo.local"));
//! assert!(resolve(&record, "Env.MISSING").is_none());
//! ```

use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use super::error::{QueryError, Result};

/// A record whose attributes can be looked up by name.
///
/// Implementations return `None` for attributes they do not have. Values may
/// be borrowed from the record or built on demand.
pub trait Record {
    /// Returns the attribute called `name`, if the record has one.
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>>;

    /// Returns the whole record as a value, used for the empty key-path.
    fn as_value(&self) -> Option<Cow<'_, Value>>;
}

impl Record for Value {
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.as_object()?.get(name).map(Cow::Borrowed)
    }

    fn as_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Borrowed(self))
    }
}

// Collections of pointers behave like collections of records.
macro_rules! forward_record {
    ($($ptr:ty),*) => {$(
        impl<T: Record + ?Sized> Record for $ptr {
            fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
                (**self).attribute(name)
            }

            fn as_value(&self) -> Option<Cow<'_, Value>> {
                (**self).as_value()
            }
        }
    )*};
}

forward_record!(&T, Box<T>, Rc<T>, Arc<T>);

/// Resolves a dot-delimited key-path against a record.
///
/// A leading `.` is ignored and an empty path yields the record itself.
/// Returns `None` (absent) when any segment fails to resolve or the terminal
/// value is `null`.
pub fn resolve<'a, R: Record + ?Sized>(record: &'a R, path: &str) -> Option<Cow<'a, Value>> {
    let path = path.strip_prefix('.').unwrap_or(path);
    let value = if path.is_empty() {
        record.as_value()?
    } else {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = record.attribute(first)?;
        for segment in segments {
            current = match current {
                Cow::Borrowed(value) => Cow::Borrowed(value.as_object()?.get(segment)?),
                Cow::Owned(mut value) => Cow::Owned(value.as_object_mut()?.remove(segment)?),
            };
        }
        current
    };

    if value.is_null() { None } else { Some(value) }
}

/// Resolves `path` and requires the result to be a string.
///
/// Absent values yield `Ok(None)`; any other kind is a type mismatch.
pub fn resolve_string<R: Record + ?Sized>(
    func: &'static str,
    record: &R,
    path: &str,
) -> Result<Option<String>> {
    match resolve(record, path) {
        None => Ok(None),
        Some(value) => match value.as_ref() {
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(QueryError::TypeMismatch {
                func,
                key: path.to_string(),
                expected: "string",
                found: kind_of(other),
            }),
        },
    }
}

/// Human-readable name of a value's variant, used in error messages
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
