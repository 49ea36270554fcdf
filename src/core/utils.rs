//! String utilities shared by the query engine and template helpers

use std::collections::BTreeMap;

/// Splits `s` on every occurrence of `sep`.
///
/// An empty separator splits after each character, and an empty input yields
/// a single empty token.
///
/// # Examples
/// ```
/// use dockergen::core::utils::split;
///
/// assert_eq!(split("a,b,,c", ","), vec!["a", "b", "", "c"]);
/// assert_eq!(split("abc", ""), vec!["a", "b", "c"]);
/// ```
pub fn split<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    split_n(s, sep, -1)
}

/// Splits `s` on `sep` into at most `n` tokens; the last token holds the
/// unsplit remainder. `n == 0` yields nothing and a negative `n` is unlimited.
pub fn split_n<'a>(s: &'a str, sep: &str, n: i64) -> Vec<&'a str> {
    if n == 0 {
        return Vec::new();
    }
    let limit = if n < 0 { usize::MAX } else { n as usize };

    if !sep.is_empty() {
        return s.splitn(limit, sep).collect();
    }

    let mut tokens = Vec::new();
    let mut rest = s;
    while let Some(ch) = rest.chars().next() {
        if tokens.len() + 1 == limit {
            break;
        }
        let (head, tail) = rest.split_at(ch.len_utf8());
        tokens.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        tokens.push(rest);
    }
    tokens
}

/// Parses a key-value-pair list such as `key=value,1=2,test`.
///
/// The input is split into items on `list_sep`, and each item on `kvp_sep`
/// into a key and a value. Items without `kvp_sep` are stored under
/// `default_key`, or under themselves when no default key is given.
///
/// # Examples
/// ```
/// use dockergen::core::utils::split_key_value_pairs;
///
/// let pairs = split_key_value_pairs("key=value,1=2,test", ",", "=", None);
/// assert_eq!(pairs["key"], "value");
/// assert_eq!(pairs["test"], "test");
/// ```
pub fn split_key_value_pairs(
    input: &str,
    list_sep: &str,
    kvp_sep: &str,
    default_key: Option<&str>,
) -> BTreeMap<String, String> {
    let mut output = BTreeMap::new();
    for item in split(input, list_sep) {
        let (key, value) = if !kvp_sep.is_empty() && item.contains(kvp_sep) {
            let mut parts = item.split(kvp_sep);
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            (key, value)
        } else {
            match default_key {
                Some(default) if !default.is_empty() => (default, item),
                _ => (item, item),
            }
        };
        output.insert(key.to_string(), value.to_string());
    }
    output
}

/// Removes every empty or whitespace-only line, keeping all other lines
/// byte-for-byte (including their line terminators).
pub fn remove_blank_lines(input: &str) -> String {
    input
        .split_inclusive('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}
