//! Selection of records by a predicate over a key-path.
//!
//! The predicate sees the resolved value, or `None` when the path is absent,
//! so existence tests can select on absence directly.

use std::collections::BTreeSet;

use serde_json::Value;

use super::error::{QueryError, Result};
use super::value::{Record, kind_of, resolve};
use crate::core::utils::split;

/// Keeps the records for which `test` holds on the value at `key`.
pub fn generalized_where<'a, R, T>(records: &'a [R], key: &str, test: T) -> Result<Vec<&'a R>>
where
    R: Record,
    T: Fn(Option<&Value>) -> Result<bool>,
{
    let mut selection = Vec::new();
    for record in records {
        let value = resolve(record, key);
        if test(value.as_deref())? {
            selection.push(record);
        }
    }
    Ok(selection)
}

/// Records whose value at `key` equals `cmp`.
pub fn where_eq<'a, R: Record>(records: &'a [R], key: &str, cmp: &Value) -> Result<Vec<&'a R>> {
    generalized_where(records, key, |value| Ok(value == Some(cmp)))
}

/// Records whose value at `key` differs from `cmp`, absent values included.
pub fn where_not<'a, R: Record>(records: &'a [R], key: &str, cmp: &Value) -> Result<Vec<&'a R>> {
    generalized_where(records, key, |value| Ok(value != Some(cmp)))
}

/// Records where `key` resolves.
pub fn where_exist<'a, R: Record>(records: &'a [R], key: &str) -> Result<Vec<&'a R>> {
    generalized_where(records, key, |value| Ok(value.is_some()))
}

/// Records where `key` is absent.
pub fn where_not_exist<'a, R: Record>(records: &'a [R], key: &str) -> Result<Vec<&'a R>> {
    generalized_where(records, key, |value| Ok(value.is_none()))
}

/// Records whose `sep`-delimited value at `key` shares a token with `cmp`.
pub fn where_any<'a, R: Record>(
    records: &'a [R],
    key: &str,
    sep: &str,
    cmp: &[String],
) -> Result<Vec<&'a R>> {
    generalized_where(records, key, |value| {
        Ok(matching_tokens("whereAny", key, value, sep, cmp)?.is_some_and(|n| n > 0))
    })
}

/// Records whose `sep`-delimited value at `key` contains every token of `cmp`.
pub fn where_all<'a, R: Record>(
    records: &'a [R],
    key: &str,
    sep: &str,
    cmp: &[String],
) -> Result<Vec<&'a R>> {
    let required: BTreeSet<&str> = cmp.iter().map(String::as_str).collect();
    generalized_where(records, key, |value| {
        Ok(matching_tokens("whereAll", key, value, sep, cmp)?.is_some_and(|n| n == required.len()))
    })
}

/// Number of distinct candidates present among the tokens of `value`.
///
/// `None` when the value is absent.
fn matching_tokens(
    func: &'static str,
    key: &str,
    value: Option<&Value>,
    sep: &str,
    cmp: &[String],
) -> Result<Option<usize>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let text = value.as_str().ok_or_else(|| QueryError::TypeMismatch {
        func,
        key: key.to_string(),
        expected: "string",
        found: kind_of(value),
    })?;
    let tokens: BTreeSet<&str> = split(text, sep).into_iter().collect();
    let matched = cmp
        .iter()
        .map(String::as_str)
        .filter(|c| tokens.contains(c))
        .collect::<BTreeSet<_>>()
        .len();
    Ok(Some(matched))
}
