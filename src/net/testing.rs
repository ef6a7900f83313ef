//! Scripted transport used by the unit tests of the request state machine.

use crate::errors::NetError;
use crate::net::{FetchRequest, Response, Transport};
use futures::future::LocalBoxFuture;
use futures::{stream, StreamExt};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What happens after the last scripted body chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Tail {
    End,
    Stall,
    Fail,
}

#[derive(Debug, Clone)]
pub(crate) struct Reply {
    status: u16,
    status_text: String,
    url: Option<Url>,
    headers: HeaderMap,
    chunks: Option<Vec<Vec<u8>>>,
    tail: Tail,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            status: 200,
            status_text: "OK".into(),
            url: None,
            headers: HeaderMap::new(),
            chunks: None,
            tail: Tail::End,
        }
    }

    pub fn status(mut self, status: u16, text: &str) -> Self {
        self.status = status;
        self.status_text = text.into();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(Url::parse(url).unwrap());
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.append(HeaderName::from_static(name), HeaderValue::from_str(value).unwrap());
        self
    }

    pub fn body(self, body: &[u8]) -> Self {
        self.chunks(&[body])
    }

    pub fn chunks(mut self, chunks: &[&[u8]]) -> Self {
        self.chunks = Some(chunks.iter().map(|c| c.to_vec()).collect());
        self
    }

    pub fn tail(mut self, tail: Tail) -> Self {
        self.tail = tail;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Reply(Reply),
    Fail,
    Hang,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: RefCell<VecDeque<Script>>,
    requests: RefCell<Vec<FetchRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with(script: Script) -> Rc<Self> {
        let transport = Self::new();
        transport.push(script);
        transport
    }

    pub fn push(&self, script: Script) {
        self.script.borrow_mut().push_back(script);
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn fetch(&self, request: FetchRequest, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Response, NetError>> {
        let url = request.url.clone();
        self.requests.borrow_mut().push(request);
        let script = self.script.borrow_mut().pop_front().unwrap_or(Script::Hang);

        Box::pin(async move {
            let reply = match script {
                Script::Reply(reply) => reply,
                Script::Fail => return Err(NetError::Transport("connection refused".into())),
                Script::Hang => {
                    cancel.cancelled().await;
                    return Err(NetError::Canceled);
                }
            };

            let body = reply.chunks.map(|chunks| {
                let head = stream::iter(chunks.into_iter().map(Ok));
                match reply.tail {
                    Tail::End => head.boxed_local(),
                    Tail::Stall => head.chain(stream::pending()).boxed_local(),
                    Tail::Fail => head
                        .chain(stream::once(async { Err(NetError::Transport("connection reset".into())) }))
                        .boxed_local(),
                }
            });

            Ok(Response {
                url: reply.url.unwrap_or(url),
                status: reply.status,
                status_text: reply.status_text,
                headers: reply.headers,
                body,
            })
        })
    }
}
