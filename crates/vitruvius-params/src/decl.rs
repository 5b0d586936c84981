//! Declarative parameter surface.
//!
//! These types are what configuration files and builder code produce. They
//! carry no behavior of their own: [`ParamsSchema::compile`] validates them
//! once and turns them into the immutable schema model used per request.
//!
//! ```toml
//! [params.query]
//! fields = [
//!     { name = "page", type = "int", default = 1 },
//!     { name = "tags", type = "array", items = { type = "string" }, nilable = true },
//! ]
//! ```
//!
//! [`ParamsSchema::compile`]: crate::ParamsSchema::compile

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// Hyphenated UUID
    Uuid,
    /// Calendar date
    Date,
    /// Timestamp with offset
    Time,
    /// Any JSON value, passed through untouched
    Any,
    /// Nested object with declared `fields`
    Object,
    /// Array whose elements match `items`
    Array,
}

impl TypeName {
    /// Returns the lowercase type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Time => "time",
            Self::Any => "any",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    /// Field name as exposed in the bag. May be empty for array `items`.
    #[serde(default)]
    pub name: String,

    /// Declared type.
    #[serde(rename = "type")]
    pub type_name: TypeName,

    /// Whether an absent value binds to nil instead of failing.
    #[serde(default)]
    pub nilable: bool,

    /// Value used when the field is absent. Takes priority over `nilable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Alternate wire key to read the field from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Named converter replacing the default parse strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,

    /// Children of an `object` field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,

    /// Element declaration of an `array` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDecl>>,

    /// Opaque options handed to the field's converter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl FieldDecl {
    /// Creates a field of the given type with no options.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: TypeName) -> Self {
        Self {
            name: name.into(),
            type_name,
            nilable: false,
            default: None,
            key: None,
            converter: None,
            fields: Vec::new(),
            items: None,
            options: BTreeMap::new(),
        }
    }

    /// Creates a `string` field.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::String)
    }

    /// Creates an `int` field.
    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Int)
    }

    /// Creates a `float` field.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Float)
    }

    /// Creates a `bool` field.
    #[must_use]
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Bool)
    }

    /// Creates a `uuid` field.
    #[must_use]
    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Uuid)
    }

    /// Creates a `date` field.
    #[must_use]
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Date)
    }

    /// Creates a `time` field.
    #[must_use]
    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Time)
    }

    /// Creates an `any` field.
    #[must_use]
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, TypeName::Any)
    }

    /// Creates an `object` field with the given children.
    #[must_use]
    pub fn object(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            fields,
            ..Self::new(name, TypeName::Object)
        }
    }

    /// Creates an `array` field whose elements match `items`.
    #[must_use]
    pub fn array(name: impl Into<String>, items: FieldDecl) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(name, TypeName::Array)
        }
    }

    /// Marks the field nilable.
    #[must_use]
    pub fn nilable(mut self) -> Self {
        self.nilable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Reads the field from an alternate wire key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Selects a named converter.
    #[must_use]
    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = Some(converter.into());
        self
    }

    /// Adds a converter option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Returns the wire key: the alternate key if set, otherwise the name.
    #[must_use]
    pub fn wire_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// Declaration of one request-data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDecl {
    /// Attempt this source even when the content type does not select it.
    #[serde(default)]
    pub required: bool,

    /// Top-level fields.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl SourceDecl {
    /// Creates an optional source with the given fields.
    #[must_use]
    pub fn new(fields: Vec<FieldDecl>) -> Self {
        Self {
            required: false,
            fields,
        }
    }

    /// Marks the source required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Parameter declarations for one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsDecl {
    /// Path parameters. Always treated as required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<SourceDecl>,
    /// Query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<SourceDecl>,
    /// URL-encoded form body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<SourceDecl>,
    /// JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<SourceDecl>,
}

impl ParamsDecl {
    /// Creates an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares path parameters.
    #[must_use]
    pub fn with_path(mut self, source: SourceDecl) -> Self {
        self.path = Some(source);
        self
    }

    /// Declares query parameters.
    #[must_use]
    pub fn with_query(mut self, source: SourceDecl) -> Self {
        self.query = Some(source);
        self
    }

    /// Declares form body parameters.
    #[must_use]
    pub fn with_form(mut self, source: SourceDecl) -> Self {
        self.form = Some(source);
        self
    }

    /// Declares JSON body parameters.
    #[must_use]
    pub fn with_json(mut self, source: SourceDecl) -> Self {
        self.json = Some(source);
        self
    }
}
