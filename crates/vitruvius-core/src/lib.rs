//! # Vitruvius Core
//!
//! Core types shared by every layer of the Vitruvius engine:
//!
//! - [`RequestId`] - UUID v7 identifier assigned to each dispatch
//! - [`View`] - the renderable result an action produces
//! - [`ResponseMeta`] - status override, headers and redirect target set during dispatch
//! - [`ClassifiedError`] - the single failure shape handed to renderers
//!
//! Nothing in this crate knows how parameters are bound or how actions run;
//! it only fixes the vocabulary the binding, dispatch and rendering layers
//! exchange.

#![doc(html_root_url = "https://docs.rs/vitruvius-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request_id;
mod view;

pub use error::{ClassifiedError, ErrorBody, ErrorClass, UNDECLARED_ERROR_NAME};
pub use request_id::RequestId;
pub use view::{ResponseMeta, View};
