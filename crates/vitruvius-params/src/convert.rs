//! Leaf converters.
//!
//! Every leaf type has a default parse strategy. A field may name a
//! [`Converter`] instead, which replaces the strategy for that field only
//! without changing the schema's shape.
//!
//! | Converter | Type | Accepts |
//! |-----------|------|---------|
//! | `unix_seconds` | `time` | integer seconds since the epoch |
//! | `unix_millis` | `time` | integer milliseconds since the epoch |
//! | `trimmed` | `string` | any string, surrounding whitespace removed |
//! | `strict_bool` | `bool` | only `true` / `false` |
//! | `lenient_int` | `int` | digits with `_` or `,` separators |

use crate::schema::LeafType;
use crate::ParamValue;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Per-field options passed through to converters.
pub type FieldOptions = BTreeMap<String, String>;

/// A raw value that could not be converted.
///
/// The message describes what was expected; the caller adds the field path
/// and the raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailed {
    expected: String,
}

impl ConversionFailed {
    /// Creates a failure with the given expectation (e.g. `"expected integer"`).
    #[must_use]
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Creates the standard failure for a leaf type.
    #[must_use]
    pub fn expected(ty: LeafType) -> Self {
        Self::new(ty.expected())
    }
}

impl fmt::Display for ConversionFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expected)
    }
}

/// A field-level parse strategy.
///
/// # Example
///
/// ```rust
/// use vitruvius_params::{ConversionFailed, Converter, FieldOptions, LeafType, ParamValue};
/// use serde_json::Value;
///
/// struct Upper;
///
/// impl Converter for Upper {
///     fn supports(&self, ty: LeafType) -> bool {
///         ty == LeafType::String
///     }
///
///     fn convert(
///         &self,
///         raw: &Value,
///         _ty: LeafType,
///         _options: &FieldOptions,
///     ) -> Result<ParamValue, ConversionFailed> {
///         raw.as_str()
///             .map(|s| ParamValue::String(s.to_uppercase()))
///             .ok_or_else(|| ConversionFailed::new("expected string"))
///     }
/// }
/// ```
pub trait Converter: Send + Sync + 'static {
    /// Returns `true` if this converter can produce values of `ty`.
    fn supports(&self, ty: LeafType) -> bool;

    /// Converts one raw leaf.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionFailed`] if the raw value is not acceptable.
    fn convert(
        &self,
        raw: &Value,
        ty: LeafType,
        options: &FieldOptions,
    ) -> Result<ParamValue, ConversionFailed>;
}

/// Default parse strategy for a leaf type.
///
/// Query, form and path leaves arrive as strings; JSON leaves keep their
/// JSON type. `date` and `time` honor a `format` option (chrono syntax).
pub(crate) fn convert_default(
    raw: &Value,
    ty: LeafType,
    options: &FieldOptions,
) -> Result<ParamValue, ConversionFailed> {
    let fail = || ConversionFailed::expected(ty);
    match ty {
        LeafType::String => raw
            .as_str()
            .map(|s| ParamValue::String(s.to_string()))
            .ok_or_else(fail),
        LeafType::Int => match raw {
            Value::String(s) => s.parse::<i64>().map(ParamValue::Int).map_err(|_| fail()),
            Value::Number(n) => n.as_i64().map(ParamValue::Int).ok_or_else(fail),
            _ => Err(fail()),
        },
        LeafType::Float => {
            let value = match raw {
                Value::String(s) => s.parse::<f64>().ok(),
                Value::Number(n) => n.as_f64(),
                _ => None,
            };
            value
                .filter(|f| f.is_finite())
                .map(ParamValue::Float)
                .ok_or_else(fail)
        }
        LeafType::Bool => match raw {
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::String(s) => parse_bool(s).map(ParamValue::Bool).ok_or_else(fail),
            _ => Err(fail()),
        },
        LeafType::Uuid => raw
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(ParamValue::Uuid)
            .ok_or_else(fail),
        LeafType::Date => {
            let format = options.get("format").map_or("%Y-%m-%d", String::as_str);
            raw.as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, format).ok())
                .map(ParamValue::Date)
                .ok_or_else(fail)
        }
        LeafType::Time => {
            let parsed = raw.as_str().and_then(|s| match options.get("format") {
                Some(format) => DateTime::parse_from_str(s, format).ok(),
                None => DateTime::parse_from_rfc3339(s).ok(),
            });
            parsed.map(ParamValue::Time).ok_or_else(fail)
        }
        LeafType::Any => Ok(ParamValue::Any(raw.clone())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn integer_of(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Timestamps from integer seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSeconds;

impl Converter for UnixSeconds {
    fn supports(&self, ty: LeafType) -> bool {
        ty == LeafType::Time
    }

    fn convert(
        &self,
        raw: &Value,
        _ty: LeafType,
        _options: &FieldOptions,
    ) -> Result<ParamValue, ConversionFailed> {
        integer_of(raw)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|t| ParamValue::Time(t.fixed_offset()))
            .ok_or_else(|| ConversionFailed::new("expected unix timestamp in seconds"))
    }
}

/// Timestamps from integer milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixMillis;

impl Converter for UnixMillis {
    fn supports(&self, ty: LeafType) -> bool {
        ty == LeafType::Time
    }

    fn convert(
        &self,
        raw: &Value,
        _ty: LeafType,
        _options: &FieldOptions,
    ) -> Result<ParamValue, ConversionFailed> {
        integer_of(raw)
            .and_then(DateTime::from_timestamp_millis)
            .map(|t| ParamValue::Time(t.fixed_offset()))
            .ok_or_else(|| ConversionFailed::new("expected unix timestamp in milliseconds"))
    }
}

/// Strings with surrounding whitespace removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trimmed;

impl Converter for Trimmed {
    fn supports(&self, ty: LeafType) -> bool {
        ty == LeafType::String
    }

    fn convert(
        &self,
        raw: &Value,
        ty: LeafType,
        _options: &FieldOptions,
    ) -> Result<ParamValue, ConversionFailed> {
        raw.as_str()
            .map(|s| ParamValue::String(s.trim().to_string()))
            .ok_or_else(|| ConversionFailed::expected(ty))
    }
}

/// Booleans spelled exactly `true` or `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictBool;

impl Converter for StrictBool {
    fn supports(&self, ty: LeafType) -> bool {
        ty == LeafType::Bool
    }

    fn convert(
        &self,
        raw: &Value,
        _ty: LeafType,
        _options: &FieldOptions,
    ) -> Result<ParamValue, ConversionFailed> {
        match raw {
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::String(s) if s == "true" => Ok(ParamValue::Bool(true)),
            Value::String(s) if s == "false" => Ok(ParamValue::Bool(false)),
            _ => Err(ConversionFailed::new("expected 'true' or 'false'")),
        }
    }
}

/// Integers that may contain `_` or `,` digit separators.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientInt;

impl Converter for LenientInt {
    fn supports(&self, ty: LeafType) -> bool {
        ty == LeafType::Int
    }

    fn convert(
        &self,
        raw: &Value,
        ty: LeafType,
        _options: &FieldOptions,
    ) -> Result<ParamValue, ConversionFailed> {
        let parsed = match raw {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => {
                let digits: String = s.chars().filter(|c| !matches!(c, '_' | ',')).collect();
                digits.parse().ok()
            }
            _ => None,
        };
        parsed
            .map(ParamValue::Int)
            .ok_or_else(|| ConversionFailed::expected(ty))
    }
}

/// Named converters available to schema compilation.
///
/// # Example
///
/// ```rust
/// use vitruvius_params::{ConverterRegistry, Trimmed};
///
/// let mut registry = ConverterRegistry::new();
/// registry.register("squish", Trimmed);
///
/// assert!(registry.get("squish").is_some());
/// assert!(registry.get("unix_seconds").is_some());
/// ```
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Creates a registry holding the built-in converters.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("unix_seconds", UnixSeconds);
        registry.register("unix_millis", UnixMillis);
        registry.register("trimmed", Trimmed);
        registry.register("strict_bool", StrictBool);
        registry.register("lenient_int", LenientInt);
        registry
    }

    /// Creates a registry with no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registers a converter, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, converter: impl Converter) -> &mut Self {
        self.converters.insert(name.into(), Arc::new(converter));
        self
    }

    /// Looks up a converter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.converters.get(name).cloned()
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_options() -> FieldOptions {
        FieldOptions::new()
    }

    #[test]
    fn test_int_from_string_and_number() {
        let opts = no_options();
        assert_eq!(
            convert_default(&json!("42"), LeafType::Int, &opts),
            Ok(ParamValue::Int(42))
        );
        assert_eq!(
            convert_default(&json!(-7), LeafType::Int, &opts),
            Ok(ParamValue::Int(-7))
        );
        assert!(convert_default(&json!("4.2"), LeafType::Int, &opts).is_err());
        assert!(convert_default(&json!(4.2), LeafType::Int, &opts).is_err());
        assert!(convert_default(&json!("ten"), LeafType::Int, &opts).is_err());
    }

    #[test]
    fn test_float_must_be_finite() {
        let opts = no_options();
        assert_eq!(
            convert_default(&json!("1.5"), LeafType::Float, &opts),
            Ok(ParamValue::Float(1.5))
        );
        assert!(convert_default(&json!("NaN"), LeafType::Float, &opts).is_err());
        assert!(convert_default(&json!("inf"), LeafType::Float, &opts).is_err());
    }

    #[test]
    fn test_bool_spellings() {
        let opts = no_options();
        for raw in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(
                convert_default(&json!(raw), LeafType::Bool, &opts),
                Ok(ParamValue::Bool(true)),
                "{raw}"
            );
        }
        for raw in ["false", "0", "No", "off"] {
            assert_eq!(
                convert_default(&json!(raw), LeafType::Bool, &opts),
                Ok(ParamValue::Bool(false)),
                "{raw}"
            );
        }
        assert!(convert_default(&json!("maybe"), LeafType::Bool, &opts).is_err());
    }

    #[test]
    fn test_string_rejects_json_numbers() {
        let err = convert_default(&json!(5), LeafType::String, &no_options()).unwrap_err();
        assert_eq!(err.to_string(), "expected string");
    }

    #[test]
    fn test_date_honors_format_option() {
        let mut opts = no_options();
        assert!(convert_default(&json!("2024-03-01"), LeafType::Date, &opts).is_ok());

        opts.insert("format".into(), "%d/%m/%Y".into());
        assert_eq!(
            convert_default(&json!("01/03/2024"), LeafType::Date, &opts),
            Ok(ParamValue::Date(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ))
        );
    }

    #[test]
    fn test_time_rfc3339() {
        let value =
            convert_default(&json!("2024-03-01T12:00:00Z"), LeafType::Time, &no_options()).unwrap();
        assert_eq!(value.as_time().unwrap().timestamp(), 1_709_294_400);
    }

    #[test]
    fn test_unix_seconds_converter() {
        let value = UnixSeconds
            .convert(&json!(1_709_294_400), LeafType::Time, &no_options())
            .unwrap();
        assert_eq!(
            value.to_json(),
            json!("2024-03-01T12:00:00Z")
        );
    }

    #[test]
    fn test_lenient_int_separators() {
        let opts = no_options();
        assert_eq!(
            LenientInt.convert(&json!("1,000"), LeafType::Int, &opts),
            Ok(ParamValue::Int(1000))
        );
        assert_eq!(
            LenientInt.convert(&json!("1_000_000"), LeafType::Int, &opts),
            Ok(ParamValue::Int(1_000_000))
        );
    }

    #[test]
    fn test_strict_bool_rejects_aliases() {
        let opts = no_options();
        assert!(StrictBool.convert(&json!("yes"), LeafType::Bool, &opts).is_err());
        assert_eq!(
            StrictBool.convert(&json!("false"), LeafType::Bool, &opts),
            Ok(ParamValue::Bool(false))
        );
    }

    #[test]
    fn test_registry_builtins() {
        let registry = ConverterRegistry::default();
        assert_eq!(
            registry.names(),
            vec!["lenient_int", "strict_bool", "trimmed", "unix_millis", "unix_seconds"]
        );
        assert!(ConverterRegistry::empty().get("trimmed").is_none());
    }
}
