//! URL-encoded parsing with bracket expansion.
//!
//! Shared by the query and form extractors. Pairs are percent-decoded by
//! `serde_urlencoded`; keys are then expanded into nested structure:
//!
//! | Input | Raw tree |
//! |-------|----------|
//! | `a=1&a=2` | `{"a": "2"}` (last wins) |
//! | `a[]=1&a[]=2` | `{"a": ["1", "2"]}` |
//! | `user[name]=x` | `{"user": {"name": "x"}}` |
//! | `a[b][]=1&a[b][]=2` | `{"a": {"b": ["1", "2"]}}` |
//! | `a[][x]=1&a[][y]=2&a[][x]=3` | `{"a": [{"x": "1", "y": "2"}, {"x": "3"}]}` |
//! | `a[b=1` | `{"a[b": "1"}` (unbalanced, taken literally) |
//!
//! Conflicting shapes such as `a=1&a[b]=2` are rejected as malformed input.

use crate::{BindingError, SourceKind};
use http::Uri;
use serde_json::{Map, Value};

/// Deepest bracket nesting accepted in a single key.
pub const MAX_NESTING_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Append,
}

/// Parses the query component of a URI into a raw tree.
///
/// A URI with no query yields an empty object.
///
/// # Errors
///
/// Returns a malformed-input [`BindingError`] on undecodable input or
/// conflicting key shapes.
pub fn parse_query(uri: &Uri) -> Result<Value, BindingError> {
    match uri.query() {
        Some(query) => parse_nested(query.as_bytes(), SourceKind::Query),
        None => Ok(Value::Object(Map::new())),
    }
}

/// Parses URL-encoded bytes into a raw tree of string leaves.
///
/// # Errors
///
/// Returns a malformed-input [`BindingError`] attributed to `source`.
pub fn parse_nested(input: &[u8], source: SourceKind) -> Result<Value, BindingError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(input).map_err(|e| BindingError::malformed(source, e))?;

    let mut root = Map::new();
    for (raw_key, value) in pairs {
        if raw_key.is_empty() {
            continue;
        }
        let (head, segments) = split_key(&raw_key);
        if segments.len() > MAX_NESTING_DEPTH {
            return Err(BindingError::malformed_at(
                source,
                raw_key.as_str(),
                format!("nesting deeper than {MAX_NESTING_DEPTH} levels"),
            ));
        }
        insert(&mut root, head, &segments, value).map_err(|Conflict| {
            BindingError::malformed_at(source, raw_key.as_str(), "conflicting parameter shapes")
        })?;
    }
    Ok(Value::Object(root))
}

/// Splits `a[b][]` into `("a", [Key("b"), Append])`.
///
/// Keys that do not follow the bracket grammar are returned whole.
fn split_key(key: &str) -> (&str, Vec<Segment>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 {
        return (key, Vec::new());
    }

    let head = &key[..open];
    let mut rest = &key[open..];
    let mut segments = Vec::new();
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return (key, Vec::new());
        };
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        let name = &inner[..close];
        if name.contains('[') {
            return (key, Vec::new());
        }
        segments.push(if name.is_empty() {
            Segment::Append
        } else {
            Segment::Key(name.to_string())
        });
        rest = &inner[close + 1..];
    }
    (head, segments)
}

struct Conflict;

fn insert(
    map: &mut Map<String, Value>,
    key: &str,
    rest: &[Segment],
    value: String,
) -> Result<(), Conflict> {
    let Some((first, tail)) = rest.split_first() else {
        return match map.get(key) {
            Some(Value::Object(_) | Value::Array(_)) => Err(Conflict),
            _ => {
                map.insert(key.to_string(), Value::String(value));
                Ok(())
            }
        };
    };

    match first {
        Segment::Key(child) => {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(inner) = entry else {
                return Err(Conflict);
            };
            insert(inner, child, tail, value)
        }
        Segment::Append => {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(items) = entry else {
                return Err(Conflict);
            };
            append(items, tail, value)
        }
    }
}

fn append(items: &mut Vec<Value>, rest: &[Segment], value: String) -> Result<(), Conflict> {
    let Some((first, tail)) = rest.split_first() else {
        items.push(Value::String(value));
        return Ok(());
    };

    match first {
        Segment::Key(child) => {
            if let Some(Value::Object(last)) = items.last_mut() {
                if !has_path(last, child, tail) {
                    return insert(last, child, tail, value);
                }
            }
            let mut fresh = Map::new();
            insert(&mut fresh, child, tail, value)?;
            items.push(Value::Object(fresh));
            Ok(())
        }
        Segment::Append => {
            let mut nested = Vec::new();
            append(&mut nested, tail, value)?;
            items.push(Value::Array(nested));
            Ok(())
        }
    }
}

/// Returns `true` if following `key` then the leading keys of `rest`
/// reaches an existing value.
///
/// An existing array counts as reached, so `a[][t][]=1&a[][t][]=2` starts a
/// second element instead of appending to the first one's `t`.
fn has_path(map: &Map<String, Value>, key: &str, rest: &[Segment]) -> bool {
    let Some(found) = map.get(key) else {
        return false;
    };
    match (rest.first(), found) {
        (Some(Segment::Key(next)), Value::Object(inner)) => has_path(inner, next, &rest[1..]),
        _ => true,
    }
}
