//! Network layer consumed by the request state machine.
//!
//! The state machine never talks to sockets itself. It hands a [`FetchRequest`] and a
//! cancellation token to a [`Transport`] and gets a streaming [`Response`] back. The
//! production transport is [`ReqwestTransport`]; tests plug in scripted ones.

use crate::errors::NetError;
use futures::future::LocalBoxFuture;
use http::{HeaderMap, Method};
use tokio_util::sync::CancellationToken;
use url::Url;

mod fetch;
mod response;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::ReqwestTransport;
pub use response::{BodyStream, Response};

/// Whether credentials (cookies, auth) travel with a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

impl CredentialsMode {
    /// Mode derived from the `withCredentials` flag of a request.
    pub fn from_with_credentials(with_credentials: bool) -> Self {
        if with_credentials {
            CredentialsMode::Include
        } else {
            CredentialsMode::SameOrigin
        }
    }
}

/// Everything a transport needs to issue one request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub credentials: CredentialsMode,
}

/// Asynchronous HTTP client used by [`XmlHttpRequest`](crate::xhr::XmlHttpRequest).
///
/// The returned future resolves once response headers are available. Implementations should
/// stop work as soon as `cancel` fires and resolve with [`NetError::Canceled`].
pub trait Transport {
    fn fetch(&self, request: FetchRequest, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Response, NetError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_credentials_maps_to_include() {
        assert_eq!(CredentialsMode::from_with_credentials(true), CredentialsMode::Include);
        assert_eq!(CredentialsMode::from_with_credentials(false), CredentialsMode::SameOrigin);
    }
}
