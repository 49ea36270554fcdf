//! General-purpose template helpers.
//!
//! These back the non-query entries of the function table. They operate on
//! template values and report misuse through [`QueryError`].

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};
use tracing::warn;

use crate::query::{QueryError, Result, as_indexable_or_empty, kind_of};

/// Members present in both lists, without duplicates.
pub fn intersect(l1: &[String], l2: &[String]) -> Vec<String> {
    let right: BTreeSet<&str> = l2.iter().map(String::as_str).collect();
    l1.iter()
        .map(String::as_str)
        .filter(|item| right.contains(item))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Keys of a mapping; `null` yields `null`.
pub fn keys(input: &Value) -> Result<Value> {
    match input {
        Value::Null => Ok(Value::Null),
        Value::Object(map) => Ok(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        other => Err(QueryError::NotAMapping {
            func: "keys",
            kind: kind_of(other),
        }),
    }
}

/// Whether a mapping has `key`. Anything but a mapping has no keys.
pub fn contains(input: &Value, key: &Value) -> bool {
    match (input, key) {
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

/// Builds a mapping from alternating keys and values.
pub fn dict(values: &[Value]) -> Result<Map<String, Value>> {
    if values.len() % 2 != 0 {
        return Err(QueryError::OddArgumentCount(values.len()));
    }
    let mut dict = Map::new();
    for pair in values.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| QueryError::NonStringKey(kind_of(&pair[0])))?;
        dict.insert(key.to_string(), pair[1].clone());
    }
    Ok(dict)
}

/// Hex-encoded SHA-1 digest of `input`.
pub fn sha1(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Encodes any value as compact JSON.
pub fn marshal_json(input: &Value) -> Result<String> {
    Ok(serde_json::to_string(input)?)
}

/// Decodes JSON text into a value.
pub fn unmarshal_json(input: &str) -> Result<Value> {
    Ok(serde_json::from_str(input)?)
}

/// First element, or `null` for `null` and empty arrays.
pub fn first(input: &Value) -> Result<Value> {
    Ok(as_indexable_or_empty("first", input)?
        .first()
        .cloned()
        .unwrap_or(Value::Null))
}

/// Last element. Callers must guard against empty arrays.
pub fn last(input: &Value) -> Result<Value> {
    as_indexable_or_empty("last", input)?
        .last()
        .cloned()
        .ok_or(QueryError::EmptyCollection("last"))
}

/// Longest candidate that occurs inside `input`, or `""`.
pub fn closest<'a>(values: &'a [String], input: &str) -> &'a str {
    let mut best = "";
    for value in values {
        if input.contains(value.as_str()) && value.len() > best.len() {
            best = value;
        }
    }
    best
}

/// Names of the entries of a directory, sorted.
///
/// A directory that cannot be read is logged and treated as empty.
pub fn dir_list(path: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Template error: unable to list directory");
            return Vec::new();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Whether `path` exists.
pub fn path_exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

/// First argument that is not `null`.
pub fn coalesce(values: &[Value]) -> Value {
    values
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

/// `true_value` when `condition` holds, `false_value` otherwise.
pub fn when(condition: bool, true_value: Value, false_value: Value) -> Value {
    if condition { true_value } else { false_value }
}

/// Replaces the first `n` occurrences of `old`; a negative `n` replaces all.
pub fn replace(s: &str, old: &str, new: &str, n: i64) -> String {
    if n < 0 {
        s.replace(old, new)
    } else {
        s.replacen(old, new, n as usize)
    }
}

/// Parses `1`, `t`, `true` and `0`, `f`, `false` in their usual spellings.
pub fn parse_bool(input: &str) -> Result<bool> {
    match input {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(QueryError::ParseBool(other.to_string())),
    }
}

/// Escapes `s` for use in a URL query; spaces become `+`.
pub fn query_escape(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_intersect() {
        let i = intersect(&strings(&["foo.fo.com", "bar.com"]), &strings(&["foo.bar.com"]));
        assert!(i.is_empty());

        let i = intersect(
            &strings(&["foo.fo.com", "bar.com"]),
            &strings(&["bar.com", "foo.com"]),
        );
        assert_eq!(i, vec!["bar.com"]);

        let a = strings(&["foo.fo.com", "foo.com", "bar.com"]);
        let b = strings(&["bar.com", "foo.com"]);
        assert_eq!(intersect(&a, &b).len(), 2);
        assert_eq!(intersect(&a, &b), intersect(&b, &a));
    }

    #[test]
    fn test_keys() {
        assert_eq!(keys(&json!({"VIRTUAL_HOST": "demo.local"})).unwrap(), json!(["VIRTUAL_HOST"]));
        assert_eq!(keys(&json!({})).unwrap(), json!([]));
        assert_eq!(keys(&Value::Null).unwrap(), Value::Null);
        assert!(matches!(
            keys(&json!("nope")),
            Err(QueryError::NotAMapping { func: "keys", .. })
        ));
    }

    #[test]
    fn test_contains() {
        let env = json!({"PORT": "1234"});
        assert!(contains(&env, &json!("PORT")));
        assert!(!contains(&env, &json!("MISSING")));
        assert!(!contains(&env, &json!(42)));
        assert!(!contains(&Value::Null, &json!("")));
    }

    #[test]
    fn test_dict() {
        let containers = json!([{"ID": "1"}, {"ID": "2"}]);
        let d = dict(&[json!("/"), containers.clone()]).unwrap();
        assert_eq!(d["/"], containers);
        assert!(!d.contains_key("MISSING"));

        assert!(matches!(dict(&[json!("a")]), Err(QueryError::OddArgumentCount(1))));
        assert!(matches!(
            dict(&[json!(1), json!("b")]),
            Err(QueryError::NonStringKey("number"))
        ));
        assert!(dict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sha1() {
        assert_eq!(sha1("/path"), "4f26609ad3f5185faaa9edf1e93aa131e2131352");
        assert_ne!(sha1("/path"), sha1("/patH"));
    }

    #[test]
    fn test_json_round_trip() {
        let value = json!({"enabled": true, "hosts": ["a", "b"], "port": 80, "ratio": 0.5});
        let text = marshal_json(&value).unwrap();
        assert!(!text.ends_with('\n'));
        assert_eq!(unmarshal_json(&text).unwrap(), value);
    }

    #[test]
    fn test_parse_json() {
        assert_eq!(unmarshal_json("null").unwrap(), Value::Null);
        assert_eq!(unmarshal_json("true").unwrap(), json!(true));
        assert_eq!(unmarshal_json("0.5").unwrap(), json!(0.5));
        assert!(matches!(unmarshal_json("{"), Err(QueryError::InvalidJson(_))));
    }

    #[test]
    fn test_first_and_last() {
        let values = json!(["a", "b", "c"]);
        assert_eq!(first(&values).unwrap(), json!("a"));
        assert_eq!(last(&values).unwrap(), json!("c"));
        assert_eq!(first(&json!([])).unwrap(), Value::Null);
        assert_eq!(first(&Value::Null).unwrap(), Value::Null);
        assert!(matches!(last(&json!([])), Err(QueryError::EmptyCollection("last"))));
        assert!(first(&json!("abc")).is_err());
    }

    #[test]
    fn test_closest() {
        let candidates = strings(&["foo.bar.com", "bar.com"]);
        assert_eq!(closest(&candidates, "foo.bar.com"), "foo.bar.com");
        let candidates = strings(&["foo.fo.com", "bar.com"]);
        assert_eq!(closest(&candidates, "foo.bar.com"), "bar.com");
        let candidates = strings(&["foo.fo.com", "bip.com"]);
        assert_eq!(closest(&candidates, "foo.bar.com"), "");
    }

    #[test]
    fn test_dir_list() {
        let dir = TempDir::new().unwrap();
        for name in ["ccc", "aaa", "bbb"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        assert_eq!(dir_list(dir.path()), vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    #[traced_test]
    fn test_dir_list_logs_and_returns_empty_on_error() {
        assert!(dir_list(Path::new("/wrong/path")).is_empty());
        assert!(logs_contain("unable to list directory"));
    }

    #[test]
    fn test_path_exists() {
        let dir = TempDir::new().unwrap();
        assert!(path_exists(dir.path()));
        assert!(!path_exists(&dir.path().join("missing")));
    }

    #[test]
    fn test_coalesce() {
        assert_eq!(
            coalesce(&[Value::Null, json!("second"), json!("third")]),
            json!("second")
        );
        assert_eq!(coalesce(&[Value::Null, Value::Null]), Value::Null);
    }

    #[test]
    fn test_when() {
        assert_eq!(when(true, json!("first"), json!("second")), json!("first"));
        assert_eq!(when(false, json!("first"), json!("second")), json!("second"));
    }

    #[test]
    fn test_replace() {
        assert_eq!(replace("a-b-c", "-", ".", -1), "a.b.c");
        assert_eq!(replace("a-b-c", "-", ".", 1), "a.b-c");
        assert_eq!(replace("a-b-c", "-", ".", 0), "a-b-c");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("T").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(matches!(parse_bool("yes"), Err(QueryError::ParseBool(_))));
    }

    #[test]
    fn test_query_escape() {
        assert_eq!(query_escape("example.com"), "example.com");
        assert_eq!(query_escape(".example.com"), ".example.com");
        assert_eq!(query_escape("*.example.com"), "%2A.example.com");
        assert_eq!(
            query_escape(r"~^example\.com(\..*\.xip\.io)?$"),
            "~%5Eexample%5C.com%28%5C..%2A%5C.xip%5C.io%29%3F%24"
        );
        assert_eq!(query_escape("a b"), "a+b");
    }
}
