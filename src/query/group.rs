//! Partitioning of records into named buckets.
//!
//! All variants share [`generalized_group_by`]: derive a string from each
//! record, skip records whose value is absent, and let the variant decide
//! which buckets the record joins. Within a bucket, records keep their source
//! order. The source collection is never modified.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::Result;
use super::value::{Record, resolve_string};
use crate::core::utils::{split, split_key_value_pairs};

/// Bucket name to member records, in source order
pub type Groups<'a, R> = BTreeMap<String, Vec<&'a R>>;

/// Groups `records` using a value-derivation rule and an insertion rule.
///
/// `derive` returns `Ok(None)` for records that join no bucket.
pub fn generalized_group_by<'a, R, D, A>(records: &'a [R], derive: D, add: A) -> Result<Groups<'a, R>>
where
    D: Fn(&R) -> Result<Option<String>>,
    A: Fn(&mut Groups<'a, R>, &str, &'a R),
{
    let mut groups = Groups::new();
    for record in records {
        if let Some(value) = derive(record)? {
            add(&mut groups, &value, record);
        }
    }
    Ok(groups)
}

fn generalized_group_by_key<'a, R, A>(
    func: &'static str,
    records: &'a [R],
    key: &str,
    add: A,
) -> Result<Groups<'a, R>>
where
    R: Record,
    A: Fn(&mut Groups<'a, R>, &str, &'a R),
{
    generalized_group_by(records, |record| resolve_string(func, record, key), add)
}

pub(crate) fn insert<'a, R>(groups: &mut Groups<'a, R>, bucket: &str, record: &'a R) {
    groups.entry(bucket.to_string()).or_default().push(record);
}

/// Groups records by the string found at `key`.
pub fn group_by<'a, R: Record>(records: &'a [R], key: &str) -> Result<Groups<'a, R>> {
    generalized_group_by_key("groupBy", records, key, insert)
}

/// Same grouping as [`group_by`], returning only the bucket names.
pub fn group_by_keys<R: Record>(records: &[R], key: &str) -> Result<Vec<String>> {
    let groups = generalized_group_by_key("groupByKeys", records, key, insert)?;
    Ok(groups.into_keys().collect())
}

/// Groups records by the tokens of the string at `key` split on `sep`.
///
/// A record whose value splits into k tokens joins k buckets.
pub fn group_by_multi<'a, R: Record>(records: &'a [R], key: &str, sep: &str) -> Result<Groups<'a, R>> {
    generalized_group_by_key("groupByMulti", records, key, |groups, value, record| {
        for item in split(value, sep) {
            insert(groups, item, record);
        }
    })
}

/// Groups records by the keys of the key-value-pair list found at `key`.
///
/// Only the parsed keys place a record; the parsed values are not used.
pub fn group_by_multi_key_value_pairs<'a, R: Record>(
    records: &'a [R],
    key: &str,
    list_sep: &str,
    kvp_sep: &str,
    default_key: Option<&str>,
) -> Result<Groups<'a, R>> {
    generalized_group_by_key(
        "groupByMultiKeyValuePairs",
        records,
        key,
        |groups, value, record| {
            for bucket in split_key_value_pairs(value, list_sep, kvp_sep, default_key).keys() {
                insert(groups, bucket, record);
            }
        },
    )
}

/// Converts buckets into a mapping of arrays for the template context.
pub fn groups_to_value(groups: Groups<'_, Value>) -> Value {
    Value::Object(
        groups
            .into_iter()
            .map(|(bucket, members)| {
                let members = members.into_iter().cloned().collect();
                (bucket, Value::Array(members))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;
    use serde_json::json;

    fn containers() -> Value {
        json!([
            {"Env": {"VIRTUAL_HOST": "demo1.localhost"}, "ID": "1"},
            {"Env": {"VIRTUAL_HOST": "demo1.localhost"}, "ID": "2"},
            {"Env": {"VIRTUAL_HOST": "demo2.localhost"}, "ID": "3"},
        ])
    }

    fn ids(members: &[&Value]) -> Vec<String> {
        members
            .iter()
            .map(|m| m["ID"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_group_by_existing_key() {
        let records = containers();
        let records = records.as_array().unwrap();
        let groups = group_by(records, "Env.VIRTUAL_HOST").unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups["demo1.localhost"]), vec!["1", "2"]);
        assert_eq!(ids(&groups["demo2.localhost"]), vec!["3"]);
    }

    #[test]
    fn test_group_by_skips_absent_values() {
        let records = json!([
            {"Env": {"VIRTUAL_HOST": "a"}, "ID": "1"},
            {"Env": {}, "ID": "2"},
            {"ID": "3"},
        ]);
        let records = records.as_array().unwrap();
        let groups = group_by(records, "Env.VIRTUAL_HOST").unwrap();

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, 1);
        assert_eq!(ids(&groups["a"]), vec!["1"]);
    }

    #[test]
    fn test_group_by_non_string_is_type_mismatch() {
        let records = json!([{"Value": 5}]);
        let err = group_by(records.as_array().unwrap(), "Value").unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch { func: "groupBy", .. }));
    }

    #[test]
    fn test_group_by_keys_matches_group_by() {
        let records = containers();
        let records = records.as_array().unwrap();

        let keys = group_by_keys(records, "Env.VIRTUAL_HOST").unwrap();
        assert_eq!(keys, vec!["demo1.localhost", "demo2.localhost"]);
        let buckets: Vec<String> = group_by(records, "Env.VIRTUAL_HOST")
            .unwrap()
            .into_keys()
            .collect();
        assert_eq!(keys, buckets);

        assert_eq!(group_by_keys(records, "ID").unwrap(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_group_by_multi_fans_out() {
        let records = json!([
            {"Env": {"VIRTUAL_HOST": "demo1.localhost"}, "ID": "1"},
            {"Env": {"VIRTUAL_HOST": "demo1.localhost,demo3.localhost"}, "ID": "2"},
            {"Env": {"VIRTUAL_HOST": "demo2.localhost"}, "ID": "3"},
        ]);
        let records = records.as_array().unwrap();
        let groups = group_by_multi(records, "Env.VIRTUAL_HOST", ",").unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(ids(&groups["demo1.localhost"]), vec!["1", "2"]);
        assert_eq!(ids(&groups["demo2.localhost"]), vec!["3"]);
        assert_eq!(ids(&groups["demo3.localhost"]), vec!["2"]);

        let memberships = groups
            .values()
            .filter(|members| ids(members).contains(&"2".to_string()))
            .count();
        assert_eq!(memberships, 2);
    }

    #[test]
    fn test_group_by_multi_key_value_pairs() {
        let records = json!([
            {"Env": {"VIRTUAL_PORT": "443:3000,3000:3000"}, "ID": "1"},
            {"Env": {"VIRTUAL_PORT": "1111,250:360"}, "ID": "2"},
            {"Env": {"VIRTUAL_PORT": "123"}, "ID": "3"},
        ]);
        let records = records.as_array().unwrap();
        let groups =
            group_by_multi_key_value_pairs(records, "Env.VIRTUAL_PORT", ",", ":", Some("445"))
                .unwrap();

        assert_eq!(groups.len(), 4);
        assert_eq!(ids(&groups["445"]), vec!["2", "3"]);
        assert_eq!(ids(&groups["443"]), vec!["1"]);
        assert_eq!(ids(&groups["3000"]), vec!["1"]);
        assert_eq!(ids(&groups["250"]), vec!["2"]);
    }

    #[test]
    fn test_groups_to_value() {
        let records = containers();
        let groups = group_by(records.as_array().unwrap(), "Env.VIRTUAL_HOST").unwrap();
        let value = groups_to_value(groups);

        assert_eq!(value["demo1.localhost"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["demo2.localhost"][0]["ID"], json!("3"));
    }
}
