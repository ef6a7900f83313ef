//! The `XMLHttpRequest` object.
//!
//! This module implements the legacy request object on top of a [`Transport`](crate::net::Transport).
//! A single asynchronous exchange (headers, a body stream, then completion or failure) is
//! turned into the ready states and events existing callers depend on.
//!
//! # Lifecycle
//!
//! ```text
//! UNSENT --open()--> OPENED --send()--> HEADERS_RECEIVED --> LOADING --> DONE
//! ```
//!
//! `open()` may be called again at any time and starts over at `OPENED`. An exchange that
//! fails, times out or is aborted lands in `DONE` with status 0. `abort()` on a finished
//! request rewinds it to `UNSENT`.
//!
//! # Events
//!
//! On success the main target sees `loadstart`, a `readystatechange` per state change and
//! per received chunk, a `progress` after every chunk, then `load` and `loadend`. Failures
//! replace `load` with `error`, `abort` or `timeout`. The [`XmlHttpRequestUpload`] target only
//! receives synthetic events for the request body.
//!
//! # Available types
//!
//! - [`XmlHttpRequest`], [`WeakXmlHttpRequest`]: the request object and a non-owning handle.
//! - [`XmlHttpRequestUpload`]: upload sub-target.
//! - [`XmlHttpRequestEventTarget`]: handler and listener registration for both targets.
//! - [`ReadyState`], [`ResponseType`], [`XhrResponse`], [`Blob`]: request and response values.
//! - [`Event`], [`EventType`], [`ProgressInfo`]: what listeners receive.

/// Byte accumulation for received bodies.
pub mod body;
/// Events, listener registration and dispatch.
pub mod event;
/// Header and MIME type helpers.
pub mod headers;
/// The request state machine.
pub mod request;
/// Response types and body interpretation.
pub mod response;
/// Ready states.
pub mod state;
/// Upload event target.
pub mod upload;

pub(crate) mod timeout;

pub use event::{Event, EventType, ListenerId, ProgressInfo, XmlHttpRequestEventTarget};
pub use headers::MimeType;
pub use request::{RequestBody, WeakXmlHttpRequest, XmlHttpRequest};
pub use response::{Blob, Document, ResponseType, XhrResponse};
pub use state::ReadyState;
pub use upload::XmlHttpRequestUpload;
