//! Type coercion of raw trees against a compiled schema.
//!
//! Coercion is fail-fast: the first [`BindingError`] aborts the whole pass
//! for that source and no partial bag is produced.
//!
//! Absence rules, in order:
//!
//! 1. A JSON `null`, or an empty string on a nilable leaf, counts as absent.
//! 2. An absent field with a default binds to the default, even if nilable.
//! 3. An absent nilable field binds to [`ParamValue::Nil`].
//! 4. Anything else absent is [`BindingErrorKind::MissingRequiredField`].
//!
//! A present value that does not parse is always a type mismatch, never
//! treated as absence.
//!
//! [`BindingErrorKind::MissingRequiredField`]: crate::BindingErrorKind::MissingRequiredField

use crate::convert::convert_default;
use crate::field_path::FieldPath;
use crate::schema::{NodeShape, SchemaNode, SourceSchema};
use crate::{Bag, BindingError, ParamValue, SourceKind};
use serde_json::{Map, Value};

/// Coerces the raw tree of one source into a bag.
pub(crate) fn coerce_source(schema: &SourceSchema, raw: &Value) -> Result<Bag, BindingError> {
    let source = schema.kind();
    let Value::Object(map) = raw else {
        return Err(BindingError::type_mismatch(
            source,
            None,
            raw_repr(raw),
            "expected an object",
        ));
    };
    let mut path = FieldPath::new();
    coerce_fields(schema.fields(), map, &mut path, source)
}

/// Coerces a declared default against its own node.
pub(crate) fn coerce_default(
    node: &SchemaNode,
    raw: &Value,
    source: SourceKind,
) -> Result<ParamValue, BindingError> {
    let mut path = FieldPath::new();
    path.push_key(node.name());
    coerce_node(node, Some(raw), &mut path, source)
}

fn coerce_fields(
    fields: &[SchemaNode],
    map: &Map<String, Value>,
    path: &mut FieldPath,
    source: SourceKind,
) -> Result<Bag, BindingError> {
    let mut bag = Bag::with_capacity(fields.len());
    for field in fields {
        path.push_key(field.name());
        let value = coerce_node(field, map.get(field.key()), path, source)?;
        path.pop();
        bag.insert(field.name(), value);
    }
    Ok(bag)
}

fn coerce_node(
    node: &SchemaNode,
    raw: Option<&Value>,
    path: &mut FieldPath,
    source: SourceKind,
) -> Result<ParamValue, BindingError> {
    let Some(raw) = raw.filter(|value| !is_absent(node, value)) else {
        if let Some(default) = node.default_value() {
            return Ok(default.clone());
        }
        if node.is_nilable() {
            return Ok(ParamValue::Nil);
        }
        return Err(BindingError::missing(source, path.to_string()));
    };

    match node.shape() {
        NodeShape::Leaf(leaf) => {
            let converted = match node.converter() {
                Some(converter) => converter.converter().convert(raw, *leaf, node.options()),
                None => convert_default(raw, *leaf, node.options()),
            };
            converted.map_err(|failed| {
                BindingError::type_mismatch(source, Some(path.to_string()), raw_repr(raw), failed)
            })
        }
        NodeShape::Object(children) => match raw {
            Value::Object(map) => coerce_fields(children, map, path, source).map(ParamValue::Object),
            other => Err(BindingError::type_mismatch(
                source,
                Some(path.to_string()),
                raw_repr(other),
                "expected an object",
            )),
        },
        NodeShape::Array(item) => match raw {
            Value::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    path.push_index(index);
                    values.push(coerce_node(item, Some(element), path, source)?);
                    path.pop();
                }
                Ok(ParamValue::Array(values))
            }
            other => Err(BindingError::type_mismatch(
                source,
                Some(path.to_string()),
                raw_repr(other),
                "expected an array",
            )),
        },
    }
}

fn is_absent(node: &SchemaNode, raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => {
            s.is_empty() && node.is_nilable() && matches!(node.shape(), NodeShape::Leaf(_))
        }
        _ => false,
    }
}

fn raw_repr(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConverterRegistry;
    use crate::decl::{FieldDecl, ParamsDecl, SourceDecl};
    use crate::{BindingErrorKind, ParamsSchema};
    use serde_json::json;

    fn query_schema(fields: Vec<FieldDecl>) -> SourceSchema {
        let decl = ParamsDecl::new().with_query(SourceDecl::new(fields));
        ParamsSchema::compile(&decl, &ConverterRegistry::default())
            .unwrap()
            .source(SourceKind::Query)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_present_value_is_coerced() {
        let schema = query_schema(vec![FieldDecl::int("page")]);
        let bag = coerce_source(&schema, &json!({"page": "3"})).unwrap();
        assert_eq!(bag.int("page"), Some(3));
    }

    #[test]
    fn test_default_beats_nil() {
        let schema = query_schema(vec![FieldDecl::int("page").nilable().with_default(1)]);
        let bag = coerce_source(&schema, &json!({})).unwrap();
        assert_eq!(bag.int("page"), Some(1));
    }

    #[test]
    fn test_absent_nilable_is_nil() {
        let schema = query_schema(vec![FieldDecl::string("q").nilable()]);
        let bag = coerce_source(&schema, &json!({})).unwrap();
        assert!(bag.is_nil("q"));
    }

    #[test]
    fn test_empty_string_on_nilable_scalar_is_nil() {
        let schema = query_schema(vec![FieldDecl::int("limit").nilable()]);
        let bag = coerce_source(&schema, &json!({"limit": ""})).unwrap();
        assert!(bag.is_nil("limit"));
    }

    #[test]
    fn test_empty_string_on_required_int_is_mismatch() {
        let schema = query_schema(vec![FieldDecl::int("limit")]);
        let err = coerce_source(&schema, &json!({"limit": ""})).unwrap_err();
        assert_eq!(err.kind(), BindingErrorKind::TypeMismatch);
    }

    #[test]
    fn test_unparsable_nilable_value_is_still_mismatch() {
        let schema = query_schema(vec![FieldDecl::int("limit").nilable()]);
        let err = coerce_source(&schema, &json!({"limit": "ten"})).unwrap_err();
        assert_eq!(err.kind(), BindingErrorKind::TypeMismatch);
        assert_eq!(err.field(), Some("limit"));
        assert_eq!(err.raw_value(), Some("ten"));
    }

    #[test]
    fn test_missing_nested_field_reports_full_path() {
        let schema = query_schema(vec![FieldDecl::object(
            "user",
            vec![FieldDecl::object(
                "address",
                vec![FieldDecl::string("city")],
            )],
        )]);
        let err = coerce_source(&schema, &json!({"user": {"address": {}}})).unwrap_err();
        assert_eq!(err.kind(), BindingErrorKind::MissingRequiredField);
        assert_eq!(err.field(), Some("user.address.city"));
    }

    #[test]
    fn test_array_elements_are_coerced_in_order() {
        let schema = query_schema(vec![FieldDecl::array("ids", FieldDecl::int(""))]);
        let bag = coerce_source(&schema, &json!({"ids": ["3", "1", "2"]})).unwrap();
        let ids: Vec<_> = bag.array("ids").unwrap().iter().map(|v| v.as_int()).collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_array_element_error_path() {
        let schema = query_schema(vec![FieldDecl::array(
            "items",
            FieldDecl::object("", vec![FieldDecl::string("sku")]),
        )]);
        let err =
            coerce_source(&schema, &json!({"items": [{"sku": "a"}, {"qty": 1}]})).unwrap_err();
        assert_eq!(err.field(), Some("items[1].sku"));
    }

    #[test]
    fn test_empty_array_is_valid_but_absent_array_is_missing() {
        let schema = query_schema(vec![FieldDecl::array("tags", FieldDecl::string(""))]);
        let bag = coerce_source(&schema, &json!({"tags": []})).unwrap();
        assert_eq!(bag.array("tags"), Some(&[][..]));

        let err = coerce_source(&schema, &json!({})).unwrap_err();
        assert_eq!(err.kind(), BindingErrorKind::MissingRequiredField);
    }

    #[test]
    fn test_alternate_key_reported_under_name() {
        let schema = query_schema(vec![FieldDecl::int("per_page").with_key("perPage")]);
        let bag = coerce_source(&schema, &json!({"perPage": "20"})).unwrap();
        assert_eq!(bag.int("per_page"), Some(20));

        let err = coerce_source(&schema, &json!({"perPage": "x"})).unwrap_err();
        assert_eq!(err.field(), Some("per_page"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let schema = query_schema(vec![FieldDecl::string("a")]);
        let bag = coerce_source(&schema, &json!({"a": "1", "b": "2"})).unwrap();
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let schema = query_schema(vec![FieldDecl::string("a").with_default("x")]);
        let bag = coerce_source(&schema, &json!({"a": null})).unwrap();
        assert_eq!(bag.str("a"), Some("x"));
    }

    #[test]
    fn test_converter_replaces_default_strategy() {
        let schema = query_schema(vec![FieldDecl::int("n").with_converter("lenient_int")]);
        let bag = coerce_source(&schema, &json!({"n": "1,024"})).unwrap();
        assert_eq!(bag.int("n"), Some(1024));
    }

    #[test]
    fn test_root_must_be_object() {
        let schema = query_schema(vec![FieldDecl::string("a")]);
        let err = coerce_source(&schema, &json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), BindingErrorKind::TypeMismatch);
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_object_expected_but_scalar_given() {
        let schema = query_schema(vec![FieldDecl::object("user", vec![FieldDecl::string("a")])]);
        let err = coerce_source(&schema, &json!({"user": "bob"})).unwrap_err();
        assert_eq!(err.field(), Some("user"));
        assert!(err.to_string().contains("expected an object"));
    }
}
