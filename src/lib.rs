//! `XMLHttpRequest` for the Gosub engine, built on an asynchronous fetch transport.
//!
//! The request object lives in [`xhr`]. It talks to the network through the
//! [`Transport`](net::Transport) trait; [`ReqwestTransport`](net::ReqwestTransport) is the
//! production implementation. Hosts expose the constructors to scripts with
//! [`bootstrap::install`].

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod net;
pub mod xhr;

pub use config::XhrConfig;
pub use errors::{ErrorKind, NetError, XhrError};
pub use net::{ReqwestTransport, Transport};
pub use xhr::{
    Blob, Event, EventType, ListenerId, MimeType, ProgressInfo, ReadyState, RequestBody, ResponseType, WeakXmlHttpRequest,
    XhrResponse, XmlHttpRequest, XmlHttpRequestEventTarget, XmlHttpRequestUpload,
};
