//! # Vitruvius Params
//!
//! Declarative parameter schemas, source extraction and type coercion.
//!
//! An action declares, per request-data source, a tree of typed fields. The
//! declaration is compiled once into a [`ParamsSchema`]; each request is then
//! bound against it into a [`ParamBag`] holding one typed [`Bag`] per source.
//!
//! ## Sources
//!
//! | Source | Raw input | Attempted when |
//! |--------|-----------|----------------|
//! | [`SourceKind::Path`] | router-matched segments | always (always required) |
//! | [`SourceKind::Query`] | URL query string, bracket-expanded | always |
//! | [`SourceKind::Form`] | URL-encoded body, bracket-expanded | form content type, or `required` |
//! | [`SourceKind::Json`] | JSON body | JSON content type, or `required` |
//!
//! An optional body source whose content type does not match binds to
//! `None`, which lets one endpoint accept either form or JSON bodies.
//!
//! ## Example
//!
//! ```rust
//! use vitruvius_params::{
//!     ConverterRegistry, FieldDecl, ParamsDecl, ParamsSchema, RawRequest, SourceDecl,
//! };
//! use http::Uri;
//!
//! let decl = ParamsDecl::new()
//!     .with_path(SourceDecl::new(vec![FieldDecl::int("id")]))
//!     .with_query(SourceDecl::new(vec![
//!         FieldDecl::array("tags", FieldDecl::string("")).with_default(serde_json::json!([])),
//!         FieldDecl::int("limit").nilable(),
//!     ]));
//! let schema = ParamsSchema::compile(&decl, &ConverterRegistry::default()).unwrap();
//!
//! let req = RawRequest::builder()
//!     .uri(Uri::from_static("/users/7?tags[]=a&tags[]=b&limit="))
//!     .path_param("id", "7")
//!     .build();
//! let params = schema.bind(&req).unwrap();
//!
//! let query = params.query.as_ref().unwrap();
//! assert_eq!(params.path.as_ref().unwrap().int("id"), Some(7));
//! assert_eq!(query.array("tags").unwrap().len(), 2);
//! assert!(query.is_nil("limit"));
//! ```
//!
//! ## Errors
//!
//! Binding fails fast with a [`BindingError`] naming the source and the
//! offending field path:
//!
//! ```rust
//! use vitruvius_params::{BindingError, SourceKind};
//!
//! let err = BindingError::missing(SourceKind::Json, "user.email");
//! assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
//! assert_eq!(err.field(), Some("user.email"));
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-params/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bag;
mod binder;
mod coerce;
pub mod content_type;
mod convert;
mod decl;
mod error;
mod extract;
mod field_path;
mod form;
mod json;
mod path;
mod query;
mod request;
mod schema;
mod source;
mod value;

pub use bag::{Bag, ParamBag};
pub use binder::RawSources;
pub use convert::{
    ConversionFailed, Converter, ConverterRegistry, FieldOptions, LenientInt, StrictBool,
    Trimmed, UnixMillis, UnixSeconds,
};
pub use decl::{FieldDecl, ParamsDecl, SourceDecl, TypeName};
pub use error::{BindingError, BindingErrorKind};
pub use extract::extract;
pub use form::parse_form;
pub use json::parse_json;
pub use path::PathParams;
pub use query::{parse_nested, parse_query, MAX_NESTING_DEPTH};
pub use request::{RawRequest, RawRequestBuilder};
pub use schema::{
    ConverterRef, LeafType, NodeShape, ParamsSchema, SchemaError, SchemaNode, SourceSchema,
};
pub use source::SourceKind;
pub use value::ParamValue;
