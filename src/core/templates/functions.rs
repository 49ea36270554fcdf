//! The function table exposed to templates.
//!
//! A [`FunctionRegistry`] is assembled with a builder and installed into a
//! [`Tera`] instance right before rendering. Operations receive their
//! arguments by name; the collection argument of every query or grouping
//! operation is called `entries`, which lets those operations double as
//! filters:
//!
//! ```text
//! {% for host, group in groupBy(entries=containers, key="Env.VIRTUAL_HOST") %}
//! {% for c in containers | whereLabelExists(label="com.example.proxy") %}
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tera::Tera;

use super::helpers;
use crate::core::utils;
use crate::query::{self, QueryError, Result as QueryResult, as_indexable, kind_of, to_array};

/// Named arguments of a template call
pub type Args = HashMap<String, Value>;

type Operation = Arc<dyn Fn(&Args) -> QueryResult<Value> + Send + Sync>;

impl From<QueryError> for tera::Error {
    fn from(error: QueryError) -> Self {
        tera::Error::msg(error)
    }
}

/// Builder for the set of operations a template may call
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<&'static str, Operation>,
    filters: BTreeSet<&'static str>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("filters", &self.filters)
            .finish()
    }
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation, including those that read the filesystem
    pub fn standard() -> Self {
        Self::new().with_queries().with_helpers().with_filesystem()
    }

    /// Every operation except those that read the filesystem
    pub fn sandboxed() -> Self {
        Self::new().with_queries().with_helpers()
    }

    /// Adds a function, replacing any previous one of the same name
    pub fn with_function<F>(mut self, name: &'static str, operation: F) -> Self
    where
        F: Fn(&Args) -> QueryResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name, Arc::new(operation));
        self
    }

    /// Adds a function that is also usable as a filter over `entries`
    pub fn with_query<F>(mut self, name: &'static str, operation: F) -> Self
    where
        F: Fn(&Args) -> QueryResult<Value> + Send + Sync + 'static,
    {
        self.filters.insert(name);
        self.with_function(name, operation)
    }

    /// Filtering and grouping operations
    pub fn with_queries(self) -> Self {
        self.with_query("where", |args| {
            let entries = entries("where", args)?;
            let selected = query::where_eq(
                entries,
                str_arg("where", args, "key")?,
                arg("where", args, "cmp")?,
            )?;
            Ok(to_array(&selected))
        })
        .with_query("whereNot", |args| {
            let entries = entries("whereNot", args)?;
            let selected = query::where_not(
                entries,
                str_arg("whereNot", args, "key")?,
                arg("whereNot", args, "cmp")?,
            )?;
            Ok(to_array(&selected))
        })
        .with_query("whereExist", |args| {
            let entries = entries("whereExist", args)?;
            let selected = query::where_exist(entries, str_arg("whereExist", args, "key")?)?;
            Ok(to_array(&selected))
        })
        .with_query("whereNotExist", |args| {
            let entries = entries("whereNotExist", args)?;
            let selected = query::where_not_exist(entries, str_arg("whereNotExist", args, "key")?)?;
            Ok(to_array(&selected))
        })
        .with_query("whereAny", |args| {
            let entries = entries("whereAny", args)?;
            let selected = query::where_any(
                entries,
                str_arg("whereAny", args, "key")?,
                str_arg("whereAny", args, "sep")?,
                &string_list_arg("whereAny", args, "cmp")?,
            )?;
            Ok(to_array(&selected))
        })
        .with_query("whereAll", |args| {
            let entries = entries("whereAll", args)?;
            let selected = query::where_all(
                entries,
                str_arg("whereAll", args, "key")?,
                str_arg("whereAll", args, "sep")?,
                &string_list_arg("whereAll", args, "cmp")?,
            )?;
            Ok(to_array(&selected))
        })
        .with_query("whereLabelExists", |args| {
            let entries = entries("whereLabelExists", args)?;
            let selected =
                query::where_label_exists(entries, str_arg("whereLabelExists", args, "label")?)?;
            Ok(to_array(&selected))
        })
        .with_query("whereLabelDoesNotExist", |args| {
            let entries = entries("whereLabelDoesNotExist", args)?;
            let selected = query::where_label_does_not_exist(
                entries,
                str_arg("whereLabelDoesNotExist", args, "label")?,
            )?;
            Ok(to_array(&selected))
        })
        .with_query("whereLabelValueMatches", |args| {
            let entries = entries("whereLabelValueMatches", args)?;
            let selected = query::where_label_value_matches(
                entries,
                str_arg("whereLabelValueMatches", args, "label")?,
                str_arg("whereLabelValueMatches", args, "pattern")?,
            )?;
            Ok(to_array(&selected))
        })
        .with_query("groupBy", |args| {
            let entries = entries("groupBy", args)?;
            let groups = query::group_by(entries, str_arg("groupBy", args, "key")?)?;
            Ok(query::groups_to_value(groups))
        })
        .with_query("groupByKeys", |args| {
            let entries = entries("groupByKeys", args)?;
            let keys = query::group_by_keys(entries, str_arg("groupByKeys", args, "key")?)?;
            Ok(Value::from(keys))
        })
        .with_query("groupByMulti", |args| {
            let entries = entries("groupByMulti", args)?;
            let groups = query::group_by_multi(
                entries,
                str_arg("groupByMulti", args, "key")?,
                str_arg("groupByMulti", args, "sep")?,
            )?;
            Ok(query::groups_to_value(groups))
        })
        .with_query("groupByMultiKeyValuePairs", |args| {
            const FUNC: &str = "groupByMultiKeyValuePairs";
            let entries = entries(FUNC, args)?;
            let groups = query::group_by_multi_key_value_pairs(
                entries,
                str_arg(FUNC, args, "key")?,
                str_arg(FUNC, args, "listSep")?,
                str_arg(FUNC, args, "kvpSep")?,
                opt_str_arg(FUNC, args, "defaultKey")?,
            )?;
            Ok(query::groups_to_value(groups))
        })
        .with_query("groupByLabel", |args| {
            let entries = entries("groupByLabel", args)?;
            let groups = query::group_by_label(entries, str_arg("groupByLabel", args, "label")?)?;
            Ok(query::groups_to_value(groups))
        })
    }

    /// General-purpose helpers that do not touch the filesystem
    pub fn with_helpers(self) -> Self {
        self.with_function("intersect", |args| {
            Ok(Value::from(helpers::intersect(
                &string_list_arg("intersect", args, "l1")?,
                &string_list_arg("intersect", args, "l2")?,
            )))
        })
        .with_function("keys", |args| helpers::keys(arg_or_null(args, "input")))
        .with_function("contains", |args| {
            Ok(Value::Bool(helpers::contains(
                arg_or_null(args, "input"),
                arg("contains", args, "key")?,
            )))
        })
        .with_function("dict", |args| match args.get("values") {
            Some(values) => Ok(Value::Object(helpers::dict(as_indexable("dict", values)?)?)),
            None => Ok(Value::Object(
                args.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )),
        })
        .with_function("sha1", |args| {
            Ok(Value::from(helpers::sha1(str_arg("sha1", args, "input")?)))
        })
        .with_function("json", |args| {
            Ok(Value::from(helpers::marshal_json(arg("json", args, "input")?)?))
        })
        .with_function("parseJson", |args| {
            helpers::unmarshal_json(str_arg("parseJson", args, "input")?)
        })
        .with_function("first", |args| helpers::first(arg_or_null(args, "input")))
        .with_function("last", |args| helpers::last(arg_or_null(args, "input")))
        .with_function("closest", |args| {
            let values = string_list_arg("closest", args, "values")?;
            Ok(Value::from(helpers::closest(&values, str_arg("closest", args, "input")?)))
        })
        .with_function("coalesce", |args| {
            Ok(helpers::coalesce(as_indexable("coalesce", arg("coalesce", args, "values")?)?))
        })
        .with_function("hasPrefix", |args| {
            let s = str_arg("hasPrefix", args, "s")?;
            Ok(Value::Bool(s.starts_with(str_arg("hasPrefix", args, "prefix")?)))
        })
        .with_function("hasSuffix", |args| {
            let s = str_arg("hasSuffix", args, "s")?;
            Ok(Value::Bool(s.ends_with(str_arg("hasSuffix", args, "suffix")?)))
        })
        .with_function("trimPrefix", |args| {
            let s = str_arg("trimPrefix", args, "s")?;
            let prefix = str_arg("trimPrefix", args, "prefix")?;
            Ok(Value::from(s.strip_prefix(prefix).unwrap_or(s)))
        })
        .with_function("trimSuffix", |args| {
            let s = str_arg("trimSuffix", args, "s")?;
            let suffix = str_arg("trimSuffix", args, "suffix")?;
            Ok(Value::from(s.strip_suffix(suffix).unwrap_or(s)))
        })
        .with_function("trim", |args| Ok(Value::from(str_arg("trim", args, "s")?.trim())))
        .with_function("toLower", |args| {
            Ok(Value::from(str_arg("toLower", args, "s")?.to_lowercase()))
        })
        .with_function("toUpper", |args| {
            Ok(Value::from(str_arg("toUpper", args, "s")?.to_uppercase()))
        })
        .with_function("split", |args| {
            let s = str_arg("split", args, "s")?;
            Ok(Value::from(utils::split(s, str_arg("split", args, "sep")?)))
        })
        .with_function("splitN", |args| {
            let s = str_arg("splitN", args, "s")?;
            let sep = str_arg("splitN", args, "sep")?;
            Ok(Value::from(utils::split_n(s, sep, int_arg("splitN", args, "n")?)))
        })
        .with_function("replace", |args| {
            let n = match args.get("n") {
                Some(_) => int_arg("replace", args, "n")?,
                None => -1,
            };
            Ok(Value::from(helpers::replace(
                str_arg("replace", args, "s")?,
                str_arg("replace", args, "old")?,
                str_arg("replace", args, "new")?,
                n,
            )))
        })
        .with_function("parseBool", |args| {
            Ok(Value::Bool(helpers::parse_bool(str_arg("parseBool", args, "str")?)?))
        })
        .with_function("queryEscape", |args| {
            Ok(Value::from(helpers::query_escape(str_arg("queryEscape", args, "s")?)))
        })
        .with_function("splitKeyValuePairs", |args| {
            const FUNC: &str = "splitKeyValuePairs";
            let pairs = utils::split_key_value_pairs(
                str_arg(FUNC, args, "input")?,
                str_arg(FUNC, args, "listSep")?,
                str_arg(FUNC, args, "kvpSep")?,
                opt_str_arg(FUNC, args, "defaultKey")?,
            );
            Ok(Value::Object(
                pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
            ))
        })
        .with_function("when", |args| {
            Ok(helpers::when(
                bool_arg("when", args, "condition")?,
                arg_or_null(args, "trueValue").clone(),
                arg_or_null(args, "falseValue").clone(),
            ))
        })
    }

    /// Helpers that read the local filesystem
    pub fn with_filesystem(self) -> Self {
        self.with_function("dir", |args| {
            Ok(Value::from(helpers::dir_list(Path::new(str_arg("dir", args, "path")?))))
        })
        .with_function("exists", |args| {
            Ok(Value::Bool(helpers::path_exists(Path::new(str_arg("exists", args, "path")?))))
        })
    }

    /// Whether an operation called `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Names of all registered operations, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    /// Registers every operation with `tera`
    pub fn install(&self, tera: &mut Tera) {
        for (name, operation) in &self.functions {
            let function = Arc::clone(operation);
            tera.register_function(name, move |args: &Args| {
                function(args).map_err(tera::Error::from)
            });

            if self.filters.contains(name) {
                let filter = Arc::clone(operation);
                tera.register_filter(name, move |value: &Value, args: &Args| {
                    let mut args = args.clone();
                    args.insert("entries".to_string(), value.clone());
                    filter(&args).map_err(tera::Error::from)
                });
            }
        }
    }
}

fn arg<'a>(func: &'static str, args: &'a Args, name: &'static str) -> QueryResult<&'a Value> {
    args.get(name)
        .ok_or(QueryError::MissingArgument { func, name })
}

fn arg_or_null<'a>(args: &'a Args, name: &str) -> &'a Value {
    args.get(name).unwrap_or(&Value::Null)
}

fn entries<'a>(func: &'static str, args: &'a Args) -> QueryResult<&'a [Value]> {
    as_indexable(func, arg(func, args, "entries")?)
}

fn invalid(func: &'static str, name: &'static str, expected: &'static str, found: &Value) -> QueryError {
    QueryError::InvalidArgument {
        func,
        name,
        expected,
        found: kind_of(found),
    }
}

fn str_arg<'a>(func: &'static str, args: &'a Args, name: &'static str) -> QueryResult<&'a str> {
    let value = arg(func, args, name)?;
    value.as_str().ok_or_else(|| invalid(func, name, "string", value))
}

fn opt_str_arg<'a>(
    func: &'static str,
    args: &'a Args,
    name: &'static str,
) -> QueryResult<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => str_arg(func, args, name).map(Some),
    }
}

fn int_arg(func: &'static str, args: &Args, name: &'static str) -> QueryResult<i64> {
    let value = arg(func, args, name)?;
    value.as_i64().ok_or_else(|| invalid(func, name, "integer", value))
}

fn bool_arg(func: &'static str, args: &Args, name: &'static str) -> QueryResult<bool> {
    let value = arg(func, args, name)?;
    value.as_bool().ok_or_else(|| invalid(func, name, "boolean", value))
}

fn string_list_arg(func: &'static str, args: &Args, name: &'static str) -> QueryResult<Vec<String>> {
    let value = arg(func, args, name)?;
    as_indexable(func, value)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| invalid(func, name, "list of strings", value))
        })
        .collect()
}
