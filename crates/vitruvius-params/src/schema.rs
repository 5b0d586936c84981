//! Compiled schema model.
//!
//! A [`ParamsSchema`] is compiled once per action from a [`ParamsDecl`] and
//! then shared read-only across all requests. Each node is exactly one of a
//! leaf, an object with children, or an array with an element schema; the
//! [`NodeShape`] sum type makes any other combination unrepresentable.
//!
//! Compilation rejects declarations that could never bind correctly:
//!
//! | Rejected | Error |
//! |----------|-------|
//! | two siblings with the same name or wire key | [`SchemaError::DuplicateKey`] |
//! | `object` without fields | [`SchemaError::EmptyObject`] |
//! | `array` without items | [`SchemaError::MissingItems`] |
//! | `fields` or `items` on the wrong type | [`SchemaError::UnexpectedChildren`] |
//! | a default that does not coerce | [`SchemaError::InvalidDefault`] |
//! | an unknown or mismatched converter | [`SchemaError::UnknownConverter`], [`SchemaError::UnsupportedConverter`] |
//! | a nilable path field | [`SchemaError::NilablePathField`] |

use crate::coerce;
use crate::convert::{Converter, ConverterRegistry, FieldOptions};
use crate::decl::{FieldDecl, ParamsDecl, SourceDecl, TypeName};
use crate::{ParamValue, SourceKind};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Scalar leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafType {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Int,
    /// Finite 64-bit float
    Float,
    /// Boolean
    Bool,
    /// UUID
    Uuid,
    /// Calendar date
    Date,
    /// Timestamp with offset
    Time,
    /// Uninterpreted JSON
    Any,
}

impl LeafType {
    /// Maps a declared type to a leaf type. Containers have none.
    #[must_use]
    pub const fn from_type_name(type_name: TypeName) -> Option<Self> {
        match type_name {
            TypeName::String => Some(Self::String),
            TypeName::Int => Some(Self::Int),
            TypeName::Float => Some(Self::Float),
            TypeName::Bool => Some(Self::Bool),
            TypeName::Uuid => Some(Self::Uuid),
            TypeName::Date => Some(Self::Date),
            TypeName::Time => Some(Self::Time),
            TypeName::Any => Some(Self::Any),
            TypeName::Object | TypeName::Array => None,
        }
    }

    /// Returns the default expectation message for this type.
    #[must_use]
    pub const fn expected(&self) -> &'static str {
        match self {
            Self::String => "expected string",
            Self::Int => "expected integer",
            Self::Float => "expected number",
            Self::Bool => "expected boolean",
            Self::Uuid => "expected UUID",
            Self::Date => "expected date",
            Self::Time => "expected RFC 3339 timestamp",
            Self::Any => "expected any value",
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Time => "time",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// Structural shape of a schema node.
#[derive(Debug, Clone)]
pub enum NodeShape {
    /// A scalar of the given type.
    Leaf(LeafType),
    /// An object with at least one child.
    Object(Vec<SchemaNode>),
    /// An array whose elements match the boxed schema.
    Array(Box<SchemaNode>),
}

/// A named converter bound to a field.
#[derive(Clone)]
pub struct ConverterRef {
    name: String,
    converter: Arc<dyn Converter>,
}

impl ConverterRef {
    /// Returns the converter's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }
}

impl fmt::Debug for ConverterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConverterRef").field(&self.name).finish()
    }
}

/// One compiled field.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    name: String,
    key: String,
    nilable: bool,
    default: Option<ParamValue>,
    converter: Option<ConverterRef>,
    options: FieldOptions,
    shape: NodeShape,
}

impl SchemaNode {
    /// Returns the field name used in the bag and in error paths.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wire key the field is read from.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if an absent value binds to nil.
    #[must_use]
    pub fn is_nilable(&self) -> bool {
        self.nilable
    }

    /// Returns the coerced default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    /// Returns the field's converter, if one was named.
    #[must_use]
    pub fn converter(&self) -> Option<&ConverterRef> {
        self.converter.as_ref()
    }

    /// Returns the pass-through converter options.
    #[must_use]
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Returns the node's shape.
    #[must_use]
    pub fn shape(&self) -> &NodeShape {
        &self.shape
    }
}

/// A compiled source declaration.
#[derive(Debug, Clone)]
pub struct SourceSchema {
    kind: SourceKind,
    required: bool,
    fields: Vec<SchemaNode>,
}

impl SourceSchema {
    /// Returns the source kind.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Returns `true` if the source is attempted regardless of content type.
    ///
    /// Path sources are always required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the top-level fields.
    #[must_use]
    pub fn fields(&self) -> &[SchemaNode] {
        &self.fields
    }
}

/// The compiled parameter schema of one action.
///
/// # Example
///
/// ```rust
/// use vitruvius_params::{ConverterRegistry, FieldDecl, ParamsDecl, ParamsSchema, SourceDecl, SourceKind};
///
/// let decl = ParamsDecl::new()
///     .with_path(SourceDecl::new(vec![FieldDecl::int("id")]))
///     .with_json(SourceDecl::new(vec![FieldDecl::string("name")]));
///
/// let schema = ParamsSchema::compile(&decl, &ConverterRegistry::default()).unwrap();
/// assert!(schema.source(SourceKind::Path).unwrap().is_required());
/// assert!(schema.source(SourceKind::Query).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamsSchema {
    sources: Vec<SourceSchema>,
}

impl ParamsSchema {
    /// Creates a schema with no declared sources.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles a declaration.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing the first invalid field.
    pub fn compile(decl: &ParamsDecl, converters: &ConverterRegistry) -> Result<Self, SchemaError> {
        let declared = [
            (SourceKind::Path, &decl.path),
            (SourceKind::Query, &decl.query),
            (SourceKind::Form, &decl.form),
            (SourceKind::Json, &decl.json),
        ];

        let mut sources = Vec::new();
        for (kind, source) in declared {
            if let Some(source) = source {
                sources.push(compile_source(kind, source, converters)?);
            }
        }
        Ok(Self { sources })
    }

    /// Returns the compiled schema for a source, if declared.
    #[must_use]
    pub fn source(&self, kind: SourceKind) -> Option<&SourceSchema> {
        self.sources.iter().find(|s| s.kind == kind)
    }

    /// Iterates over the declared sources in binding order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceSchema> {
        self.sources.iter()
    }

    /// Returns `true` if no source is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn compile_source(
    kind: SourceKind,
    decl: &SourceDecl,
    converters: &ConverterRegistry,
) -> Result<SourceSchema, SchemaError> {
    let fields = compile_fields(kind, &decl.fields, "", converters)?;
    Ok(SourceSchema {
        kind,
        required: decl.required || kind == SourceKind::Path,
        fields,
    })
}

fn compile_fields(
    kind: SourceKind,
    decls: &[FieldDecl],
    parent: &str,
    converters: &ConverterRegistry,
) -> Result<Vec<SchemaNode>, SchemaError> {
    let mut names = HashSet::with_capacity(decls.len());
    let mut keys = HashSet::with_capacity(decls.len());
    let mut nodes = Vec::with_capacity(decls.len());

    for decl in decls {
        let path = join(parent, &decl.name);
        if decl.name.is_empty() {
            return Err(SchemaError::EmptyName {
                source_kind: kind,
                path: parent.to_string(),
            });
        }
        if !names.insert(decl.name.as_str()) || !keys.insert(decl.wire_key()) {
            return Err(SchemaError::DuplicateKey {
                source_kind: kind,
                field: path,
            });
        }
        nodes.push(compile_field(kind, decl, path, converters)?);
    }
    Ok(nodes)
}

fn compile_field(
    kind: SourceKind,
    decl: &FieldDecl,
    path: String,
    converters: &ConverterRegistry,
) -> Result<SchemaNode, SchemaError> {
    if kind == SourceKind::Path && decl.nilable {
        return Err(SchemaError::NilablePathField { field: path });
    }

    let shape = if let Some(leaf) = LeafType::from_type_name(decl.type_name) {
        if !decl.fields.is_empty() || decl.items.is_some() {
            return Err(SchemaError::UnexpectedChildren {
                source_kind: kind,
                field: path,
            });
        }
        NodeShape::Leaf(leaf)
    } else if decl.type_name == TypeName::Object {
        if decl.items.is_some() {
            return Err(SchemaError::UnexpectedChildren {
                source_kind: kind,
                field: path,
            });
        }
        if decl.fields.is_empty() {
            return Err(SchemaError::EmptyObject {
                source_kind: kind,
                field: path,
            });
        }
        NodeShape::Object(compile_fields(kind, &decl.fields, &path, converters)?)
    } else {
        if !decl.fields.is_empty() {
            return Err(SchemaError::UnexpectedChildren {
                source_kind: kind,
                field: path,
            });
        }
        let Some(items) = &decl.items else {
            return Err(SchemaError::MissingItems {
                source_kind: kind,
                field: path,
            });
        };
        let item_path = format!("{path}[]");
        NodeShape::Array(Box::new(compile_field(kind, items, item_path, converters)?))
    };

    let converter = match &decl.converter {
        None => None,
        Some(name) => Some(resolve_converter(kind, &path, name, &shape, converters)?),
    };

    let mut node = SchemaNode {
        name: decl.name.clone(),
        key: decl.wire_key().to_string(),
        nilable: decl.nilable,
        default: None,
        converter,
        options: decl.options.clone(),
        shape,
    };

    if let Some(default) = &decl.default {
        let value = coerce::coerce_default(&node, default, kind).map_err(|err| {
            SchemaError::InvalidDefault {
                source_kind: kind,
                field: path.clone(),
                reason: err.to_string(),
            }
        })?;
        node.default = Some(value);
    }

    Ok(node)
}

fn resolve_converter(
    kind: SourceKind,
    path: &str,
    name: &str,
    shape: &NodeShape,
    converters: &ConverterRegistry,
) -> Result<ConverterRef, SchemaError> {
    let NodeShape::Leaf(leaf) = shape else {
        return Err(SchemaError::ConverterOnContainer {
            source_kind: kind,
            field: path.to_string(),
        });
    };
    let converter = converters
        .get(name)
        .ok_or_else(|| SchemaError::UnknownConverter {
            source_kind: kind,
            field: path.to_string(),
            converter: name.to_string(),
        })?;
    if !converter.supports(*leaf) {
        return Err(SchemaError::UnsupportedConverter {
            source_kind: kind,
            field: path.to_string(),
            converter: name.to_string(),
            leaf: *leaf,
        });
    }
    Ok(ConverterRef {
        name: name.to_string(),
        converter,
    })
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Errors raised while compiling parameter declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field other than an array element has an empty name.
    #[error("{source_kind} field under '{path}' has an empty name")]
    EmptyName {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Parent path.
        path: String,
    },

    /// Two siblings share a name or wire key.
    #[error("duplicate {source_kind} field or key '{field}'")]
    DuplicateKey {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
    },

    /// An object field declares no children.
    #[error("{source_kind} object field '{field}' declares no fields")]
    EmptyObject {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
    },

    /// An array field declares no element schema.
    #[error("{source_kind} array field '{field}' declares no items")]
    MissingItems {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
    },

    /// `fields` or `items` appear on a type that cannot hold them.
    #[error("{source_kind} field '{field}' has children its type cannot hold")]
    UnexpectedChildren {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
    },

    /// A default value does not coerce to the declared type.
    #[error("invalid default for {source_kind} field '{field}': {reason}")]
    InvalidDefault {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
        /// Coercion failure.
        reason: String,
    },

    /// A converter name is not registered.
    #[error("unknown converter '{converter}' on {source_kind} field '{field}'")]
    UnknownConverter {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
        /// Converter name.
        converter: String,
    },

    /// A converter does not produce the field's type.
    #[error("converter '{converter}' cannot produce {leaf} for {source_kind} field '{field}'")]
    UnsupportedConverter {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
        /// Converter name.
        converter: String,
        /// Declared leaf type.
        leaf: LeafType,
    },

    /// A converter is attached to an object or array.
    #[error("converter on {source_kind} container field '{field}'")]
    ConverterOnContainer {
        /// Source being compiled.
        source_kind: SourceKind,
        /// Offending field path.
        field: String,
    },

    /// A path field is marked nilable.
    #[error("path field '{field}' cannot be nilable")]
    NilablePathField {
        /// Offending field path.
        field: String,
    },
}
