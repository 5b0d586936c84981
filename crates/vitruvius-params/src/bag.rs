//! Bags of bound parameters.

use crate::{ParamValue, SourceKind};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Typed container of bound values for one source (or one nested object).
///
/// A bag holds exactly the declared fields, in declaration order. Fields
/// that were absent and nilable hold [`ParamValue::Nil`].
///
/// # Example
///
/// ```rust
/// use vitruvius_params::{Bag, ParamValue};
///
/// let mut bag = Bag::new();
/// bag.insert("page", ParamValue::Int(2));
///
/// assert_eq!(bag.int("page"), Some(2));
/// assert_eq!(bag.str("page"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Bag {
    fields: IndexMap<String, ParamValue>,
}

impl Bag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a value, replacing any previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.fields.insert(name.into(), value);
    }

    /// Returns a value by field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.fields.get(name)
    }

    /// Returns `true` if the field is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns `true` if the field is declared and nil.
    #[must_use]
    pub fn is_nil(&self, name: &str) -> bool {
        self.get(name).is_some_and(ParamValue::is_nil)
    }

    /// Returns a string field.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Returns an integer field.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    /// Returns a float field.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    /// Returns a boolean field.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    /// Returns a nested object field.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Bag> {
        self.get(name).and_then(ParamValue::as_object)
    }

    /// Returns an array field.
    #[must_use]
    pub fn array(&self, name: &str) -> Option<&[ParamValue]> {
        self.get(name).and_then(ParamValue::as_array)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the bag has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the bag into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Reads the bag into a typed parameter struct.
    ///
    /// # Errors
    ///
    /// Returns an error if the bag's shape does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

/// The bound parameters of one request, one sub-bag per declared source.
///
/// A source is `None` when it was not declared, or when it was declared
/// optional and the request's content type did not select it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamBag {
    /// Path parameters.
    pub path: Option<Bag>,
    /// Query string parameters.
    pub query: Option<Bag>,
    /// URL-encoded form body parameters.
    pub form: Option<Bag>,
    /// JSON body parameters.
    pub json: Option<Bag>,
}

impl ParamBag {
    /// Creates a bag with every source nil.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bag for a source.
    #[must_use]
    pub fn source(&self, kind: SourceKind) -> Option<&Bag> {
        match kind {
            SourceKind::Path => self.path.as_ref(),
            SourceKind::Query => self.query.as_ref(),
            SourceKind::Form => self.form.as_ref(),
            SourceKind::Json => self.json.as_ref(),
        }
    }

    /// Sets the bag for a source.
    pub fn set(&mut self, kind: SourceKind, bag: Option<Bag>) {
        let slot = match kind {
            SourceKind::Path => &mut self.path,
            SourceKind::Query => &mut self.query,
            SourceKind::Form => &mut self.form,
            SourceKind::Json => &mut self.json,
        };
        *slot = bag;
    }

    /// Returns whichever body bag was bound, JSON first.
    ///
    /// Handy for endpoints that accept either form or JSON bodies.
    #[must_use]
    pub fn body(&self) -> Option<&Bag> {
        self.json.as_ref().or(self.form.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Paging {
        page: i64,
        per_page: Option<i64>,
    }

    fn paging_bag() -> Bag {
        let mut bag = Bag::new();
        bag.insert("page", ParamValue::Int(3));
        bag.insert("per_page", ParamValue::Nil);
        bag
    }

    #[test]
    fn test_typed_getters() {
        let bag = paging_bag();
        assert_eq!(bag.int("page"), Some(3));
        assert!(bag.is_nil("per_page"));
        assert!(!bag.is_nil("missing"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_deserialize_into_struct() {
        let paging: Paging = paging_bag().deserialize().unwrap();
        assert_eq!(
            paging,
            Paging {
                page: 3,
                per_page: None
            }
        );
    }

    #[test]
    fn test_to_json_preserves_declaration_order() {
        let mut bag = Bag::new();
        bag.insert("z", ParamValue::Int(1));
        bag.insert("a", ParamValue::Int(2));
        let keys: Vec<_> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(bag.to_json(), json!({"z": 1, "a": 2}));
    }

    #[test]
    fn test_param_bag_source_lookup() {
        let mut params = ParamBag::new();
        params.set(SourceKind::Form, Some(paging_bag()));

        assert!(params.source(SourceKind::Json).is_none());
        assert_eq!(params.source(SourceKind::Form), Some(&paging_bag()));
        assert_eq!(params.body(), Some(&paging_bag()));
    }
}
