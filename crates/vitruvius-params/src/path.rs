//! Path parameters handed over by the router.
//!
//! The router has already split the path, so extraction is a plain copy of
//! the matched `(name, value)` pairs into a raw tree. Storage uses a
//! small-vector so the common 1-4 parameter case never allocates the list.

use serde_json::{Map, Value};
use smallvec::SmallVec;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Matched path segments for one request.
///
/// # Example
///
/// ```rust
/// use vitruvius_params::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("user_id", "123");
///
/// assert_eq!(params.get("user_id"), Some("123"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. A later push with the same name shadows the earlier one.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters in match order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Converts the pairs into a raw tree of string leaves.
    #[must_use]
    pub fn to_raw_tree(&self) -> Value {
        let mut map = Map::with_capacity(self.inner.len());
        for (name, value) in &self.inner {
            map.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_push_and_get() {
        let mut params = PathParams::new();
        params.push("id", "123");
        params.push("name", "alice");

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("name"), Some("alice"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_from_iterator() {
        let params: PathParams = [("a", "1"), ("b", "2")].into_iter().collect();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_raw_tree_keeps_strings() {
        let params: PathParams = [("id", "42")].into_iter().collect();
        assert_eq!(params.to_raw_tree(), json!({"id": "42"}));
    }

    #[test]
    fn test_many_params_spill_to_heap() {
        let mut params = PathParams::new();
        for i in 0..10 {
            params.push(format!("key{i}"), format!("value{i}"));
        }
        assert_eq!(params.len(), 10);
        assert_eq!(params.get("key7"), Some("value7"));
    }

    #[test]
    fn test_later_push_shadows() {
        let mut params = PathParams::new();
        params.push("id", "1");
        params.push("id", "2");
        assert_eq!(params.get("id"), Some("2"));
        assert_eq!(params.to_raw_tree(), json!({"id": "2"}));
    }
}
