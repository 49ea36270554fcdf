//! Uniform indexable views over collection inputs.

use std::borrow::Borrow;

use serde_json::Value;

use super::error::{QueryError, Result};
use super::value::kind_of;

/// Normalizes a template value into a slice of records.
///
/// Only arrays qualify. Anything else fails with [`QueryError::NotACollection`],
/// naming the calling operation. Elements held behind pointers are handled by
/// the [`Record`](super::Record) impls for `&T`, `Box<T>`, `Rc<T>` and `Arc<T>`.
pub fn as_indexable<'a>(func: &'static str, input: &'a Value) -> Result<&'a [Value]> {
    match input {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(QueryError::NotACollection {
            func,
            kind: kind_of(other),
        }),
    }
}

/// Like [`as_indexable`], but treats `null` as an empty collection.
pub fn as_indexable_or_empty<'a>(func: &'static str, input: &'a Value) -> Result<&'a [Value]> {
    if input.is_null() {
        return Ok(&[]);
    }
    as_indexable(func, input)
}

/// Clones a selection of borrowed records back into an owned array value.
pub fn to_array<R: Borrow<Value>>(records: &[R]) -> Value {
    Value::Array(records.iter().map(|r| r.borrow().clone()).collect())
}
