//! Per-request dispatch context.
//!
//! A [`DispatchContext`] is created after binding succeeds and is handed, by
//! mutable reference, to every hook and to the action body in turn. It is
//! owned by exactly one dispatch and dropped when the response is built.

use crate::{HookResult, Raise};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use vitruvius_core::{RequestId, ResponseMeta, View};
use vitruvius_params::{Bag, ParamBag};

/// Mutable state shared by the hooks and the body of one dispatch.
///
/// # Example
///
/// ```rust
/// use http::{HeaderMap, Method, StatusCode, Uri};
/// use vitruvius_action::DispatchContext;
/// use vitruvius_core::{RequestId, View};
/// use vitruvius_params::ParamBag;
///
/// let mut ctx = DispatchContext::new(
///     RequestId::new(),
///     "users.show",
///     Method::GET,
///     Uri::from_static("/users/1"),
///     HeaderMap::new(),
///     ParamBag::new(),
/// );
///
/// ctx.set_status(StatusCode::ACCEPTED);
/// ctx.set_view(View::text("queued"));
///
/// assert_eq!(ctx.meta().status(), Some(StatusCode::ACCEPTED));
/// assert!(ctx.view().is_some());
/// ```
#[derive(Debug)]
pub struct DispatchContext {
    request_id: RequestId,
    action_id: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: ParamBag,
    view: Option<View>,
    meta: ResponseMeta,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl DispatchContext {
    /// Creates a context for a bound request.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        action_id: impl Into<String>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        params: ParamBag,
    ) -> Self {
        Self {
            request_id,
            action_id: action_id.into(),
            method,
            uri,
            headers,
            params,
            view: None,
            meta: ResponseMeta::new(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the action id.
    #[must_use]
    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns all bound parameters.
    #[must_use]
    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// Bound path parameters.
    #[must_use]
    pub fn path(&self) -> Option<&Bag> {
        self.params.path.as_ref()
    }

    /// Bound query parameters.
    #[must_use]
    pub fn query(&self) -> Option<&Bag> {
        self.params.query.as_ref()
    }

    /// Bound form parameters.
    #[must_use]
    pub fn form(&self) -> Option<&Bag> {
        self.params.form.as_ref()
    }

    /// Bound JSON parameters.
    #[must_use]
    pub fn json(&self) -> Option<&Bag> {
        self.params.json.as_ref()
    }

    /// Whichever body source was bound, JSON first.
    #[must_use]
    pub fn body(&self) -> Option<&Bag> {
        self.params.body()
    }

    // ------------------------------------------------------------------
    // View slot
    // ------------------------------------------------------------------

    /// Sets the view explicitly.
    ///
    /// An explicitly set view takes precedence over whatever the action
    /// body returns. Setting it again replaces the previous view.
    pub fn set_view(&mut self, view: impl Into<View>) {
        self.view = Some(view.into());
    }

    /// Returns the explicitly set view, if any.
    #[must_use]
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub(crate) fn take_view(&mut self) -> Option<View> {
        self.view.take()
    }

    // ------------------------------------------------------------------
    // Response metadata
    // ------------------------------------------------------------------

    /// Returns the response metadata.
    #[must_use]
    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    /// Returns the response metadata mutably.
    pub fn meta_mut(&mut self) -> &mut ResponseMeta {
        &mut self.meta
    }

    /// Overrides the success status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.meta.set_status(status);
    }

    /// Inserts a response header.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.meta.insert_header(name, value);
    }

    /// Sets a `302 Found` redirect.
    ///
    /// Control flow is unaffected: later hooks and the action body still
    /// run. With no view set, the response has an empty body.
    pub fn redirect_to(&mut self, location: &str) -> HookResult {
        self.meta.redirect_to(location).map_err(Raise::from)
    }

    /// Responds with a bare status and no body.
    ///
    /// Equivalent to setting the status and explicitly setting
    /// [`View::Empty`].
    pub fn head(&mut self, status: StatusCode) {
        self.meta.set_status(status);
        self.view = Some(View::Empty);
    }

    pub(crate) fn into_meta(self) -> ResponseMeta {
        self.meta
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    /// Stores a value for later hooks or the body, keyed by its type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a stored value by type.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Returns a stored value by type, mutably.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Removes and returns a stored value by type.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }

    /// Returns `true` if a value of type `T` is stored.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}
