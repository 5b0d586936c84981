//! Binding: selection, extraction and coercion of every declared source.
//!
//! Binding runs in two phases so callers can tell them apart:
//!
//! 1. [`ParamsSchema::extract`] selects the sources to attempt and parses
//!    each into a raw tree.
//! 2. [`ParamsSchema::coerce`] coerces the raw trees into a [`ParamBag`].
//!
//! A source is attempted when it is required, or when it does not depend on
//! the body (path, query), or when the request's content type selects it.
//! An optional body source that is not selected binds to `None` and never
//! raises. A required body source with an empty body is malformed input.

use crate::coerce::coerce_source;
use crate::{content_type, extract, BindingError, ParamBag, ParamsSchema, RawRequest, SourceKind};
use http::HeaderMap;
use serde_json::Value;

/// Raw trees for the sources of one request, in binding order.
///
/// A `None` tree marks a declared source that was not selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSources {
    trees: Vec<(SourceKind, Option<Value>)>,
}

impl RawSources {
    /// Returns the raw tree for a source, if it was declared and selected.
    #[must_use]
    pub fn get(&self, kind: SourceKind) -> Option<&Value> {
        self.trees
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, tree)| tree.as_ref())
    }

    /// Returns `true` if the source was declared but skipped.
    #[must_use]
    pub fn is_skipped(&self, kind: SourceKind) -> bool {
        self.trees.iter().any(|(k, tree)| *k == kind && tree.is_none())
    }
}

impl ParamsSchema {
    /// Returns the declared sources that this request will attempt.
    pub fn selected<'a>(&'a self, headers: &HeaderMap) -> impl Iterator<Item = SourceKind> + 'a {
        let content_type = content_type::from_headers(headers);
        self.sources()
            .filter(move |source| {
                source.is_required() || content_type::selects(source.kind(), content_type.as_ref())
            })
            .map(crate::SourceSchema::kind)
    }

    /// Returns `true` if binding this request needs the body.
    ///
    /// The transport can skip reading the body entirely when this is false.
    #[must_use]
    pub fn needs_body(&self, headers: &HeaderMap) -> bool {
        self.selected(headers).any(|kind| kind.is_body())
    }

    /// Extracts the raw tree of every selected source.
    ///
    /// # Errors
    ///
    /// Returns the first extraction failure.
    pub fn extract(&self, request: &RawRequest) -> Result<RawSources, BindingError> {
        let content_type = request.content_type();
        let mut trees = Vec::with_capacity(4);
        for source in self.sources() {
            let kind = source.kind();
            if source.is_required() && kind.is_body() && is_blank(request.body()) {
                return Err(BindingError::malformed(kind, "empty request body"));
            }
            let tree = if source.is_required()
                || content_type::selects(kind, content_type.as_ref())
            {
                Some(extract(kind, request)?)
            } else {
                tracing::trace!(source = %kind, "source not selected by content type");
                None
            };
            trees.push((kind, tree));
        }
        Ok(RawSources { trees })
    }

    /// Coerces extracted trees into a param bag.
    ///
    /// # Errors
    ///
    /// Returns the first coercion failure.
    pub fn coerce(&self, raw: &RawSources) -> Result<ParamBag, BindingError> {
        let mut bag = ParamBag::new();
        for source in self.sources() {
            let kind = source.kind();
            let bound = match raw.get(kind) {
                Some(tree) => Some(coerce_source(source, tree)?),
                None => None,
            };
            bag.set(kind, bound);
        }
        Ok(bag)
    }

    /// Extracts and coerces in one step.
    ///
    /// # Errors
    ///
    /// Returns the first extraction or coercion failure.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vitruvius_params::{ConverterRegistry, FieldDecl, ParamsDecl, ParamsSchema, RawRequest, SourceDecl};
    /// use http::Uri;
    ///
    /// let decl = ParamsDecl::new()
    ///     .with_query(SourceDecl::new(vec![FieldDecl::int("page").with_default(1)]));
    /// let schema = ParamsSchema::compile(&decl, &ConverterRegistry::default()).unwrap();
    ///
    /// let req = RawRequest::builder().uri(Uri::from_static("/?page=4")).build();
    /// let params = schema.bind(&req).unwrap();
    ///
    /// assert_eq!(params.query.unwrap().int("page"), Some(4));
    /// ```
    pub fn bind(&self, request: &RawRequest) -> Result<ParamBag, BindingError> {
        let raw = self.extract(request)?;
        self.coerce(&raw)
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}
