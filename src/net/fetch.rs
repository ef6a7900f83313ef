use crate::config::XhrConfig;
use crate::errors::NetError;
use crate::net::{CredentialsMode, FetchRequest, Response, Transport};
use futures::future::LocalBoxFuture;
use futures::StreamExt;
use http::Method;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::{Origin, Url};

/// Transport backed by `reqwest`.
///
/// Two clients are kept: one without cookie handling for anonymous requests and one that
/// shares a cookie jar for credentialed requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    anonymous: reqwest::Client,
    credentialed: reqwest::Client,
    origin: Option<Origin>,
}

impl ReqwestTransport {
    pub fn new(config: &XhrConfig) -> Result<Self, NetError> {
        let anonymous = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        let credentialed = if config.cookies {
            let jar = Arc::new(reqwest::cookie::Jar::default());
            reqwest::Client::builder()
                .user_agent(config.user_agent.as_str())
                .cookie_provider(jar)
                .build()?
        } else {
            anonymous.clone()
        };

        Ok(Self {
            anonymous,
            credentialed,
            origin: config.base_url.as_ref().map(Url::origin),
        })
    }

    fn client_for(&self, request: &FetchRequest) -> &reqwest::Client {
        if sends_credentials(request.credentials, &request.url, self.origin.as_ref()) {
            &self.credentialed
        } else {
            &self.anonymous
        }
    }
}

/// Decides whether cookies travel with a request to `url` given the credentials mode and the
/// origin the requests are made from.
fn sends_credentials(mode: CredentialsMode, url: &Url, origin: Option<&Origin>) -> bool {
    match mode {
        CredentialsMode::Omit => false,
        CredentialsMode::Include => true,
        CredentialsMode::SameOrigin => origin.is_some_and(|o| *o == url.origin()),
    }
}

impl Transport for ReqwestTransport {
    fn fetch(&self, request: FetchRequest, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Response, NetError>> {
        let client = self.client_for(&request).clone();

        Box::pin(async move {
            let head_only = request.method == Method::HEAD;

            let mut builder = client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let res = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(NetError::Canceled),
                r = builder.send() => r?,
            };

            let url = res.url().clone();
            let status = res.status().as_u16();
            let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
            let headers = res.headers().clone();

            let body = if head_only || res.content_length() == Some(0) {
                None
            } else {
                let stream = res
                    .bytes_stream()
                    .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(NetError::from));
                Some(stream.boxed_local())
            };

            Ok(Response {
                url,
                status,
                status_text,
                headers,
                body,
            })
        })
    }
}
