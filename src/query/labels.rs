//! Label predicates and grouping.
//!
//! Label keys routinely contain dots (`com.docker.compose.project`), so these
//! operations read the label map directly instead of walking a key-path. Any
//! record type that can expose its labels gets them through [`Labeled`].

use regex::Regex;
use serde_json::Value;

use super::error::{QueryError, Result};
use super::group::{Groups, generalized_group_by, insert};
use super::value::kind_of;

/// A record that carries a string-to-string label map.
pub trait Labeled {
    /// Returns the value of `label`, or `None` when the record lacks it.
    ///
    /// Fails when the record has no label map at all, or when the label
    /// value is not a string.
    fn label(&self, func: &'static str, label: &str) -> Result<Option<&str>>;
}

impl Labeled for Value {
    fn label(&self, func: &'static str, label: &str) -> Result<Option<&str>> {
        let not_labeled = || QueryError::NotLabeled {
            func,
            kind: kind_of(self),
        };
        match self.as_object().ok_or_else(not_labeled)?.get("Labels") {
            Some(Value::Object(labels)) => match labels.get(label) {
                Some(Value::String(value)) => Ok(Some(value.as_str())),
                Some(Value::Null) | None => Ok(None),
                Some(other) => Err(QueryError::TypeMismatch {
                    func,
                    key: label.to_string(),
                    expected: "string",
                    found: kind_of(other),
                }),
            },
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(not_labeled()),
        }
    }
}

impl<T: Labeled + ?Sized> Labeled for &T {
    fn label(&self, func: &'static str, label: &str) -> Result<Option<&str>> {
        (**self).label(func, label)
    }
}

fn generalized_where_label<'a, R, T>(
    func: &'static str,
    records: &'a [R],
    label: &str,
    test: T,
) -> Result<Vec<&'a R>>
where
    R: Labeled,
    T: Fn(Option<&str>) -> bool,
{
    let mut selection = Vec::new();
    for record in records {
        if test(record.label(func, label)?) {
            selection.push(record);
        }
    }
    Ok(selection)
}

/// Records that carry `label`.
pub fn where_label_exists<'a, R: Labeled>(records: &'a [R], label: &str) -> Result<Vec<&'a R>> {
    generalized_where_label("whereLabelExists", records, label, |value| value.is_some())
}

/// Records that do not carry `label`.
pub fn where_label_does_not_exist<'a, R: Labeled>(
    records: &'a [R],
    label: &str,
) -> Result<Vec<&'a R>> {
    generalized_where_label("whereLabelDoesNotExist", records, label, |value| {
        value.is_none()
    })
}

/// Records whose `label` value matches the regular expression `pattern`.
pub fn where_label_value_matches<'a, R: Labeled>(
    records: &'a [R],
    label: &str,
    pattern: &str,
) -> Result<Vec<&'a R>> {
    let rx = Regex::new(pattern).map_err(|source| QueryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    generalized_where_label("whereLabelValueMatches", records, label, |value| {
        value.is_some_and(|v| rx.is_match(v))
    })
}

/// Groups records by the value of `label`; records without it are skipped.
pub fn group_by_label<'a, R: Labeled>(records: &'a [R], label: &str) -> Result<Groups<'a, R>> {
    generalized_group_by(
        records,
        |record| Ok(record.label("groupByLabel", label)?.map(str::to_string)),
        insert,
    )
}
