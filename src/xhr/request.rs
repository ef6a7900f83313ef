use crate::config::XhrConfig;
use crate::errors::{NetError, XhrError};
use crate::net::{CredentialsMode, FetchRequest, Transport};
use crate::xhr::body::ByteAccumulator;
use crate::xhr::event::{Event, EventDispatcher, EventType, XmlHttpRequestEventTarget};
use crate::xhr::headers::{self, MimeType};
use crate::xhr::response::{self, CachedResponse, Document, ResponseType, XhrResponse};
use crate::xhr::state::ReadyState;
use crate::xhr::timeout::{self, Race};
use crate::xhr::upload::XmlHttpRequestUpload;
use bitflags::bitflags;
use futures::StreamExt;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Methods `open()` refuses outright.
const FORBIDDEN_METHODS: [&str; 3] = ["CONNECT", "TRACE", "TRACK"];

/// Methods `open()` uppercases. Anything else keeps the casing it was given.
const NORMALIZED_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];

const TEXT_PLAIN_UTF8: &str = "text/plain;charset=UTF-8";

bitflags! {
    #[derive(Default)]
    struct Flags: u8 {
        const SEND             = 0b0000_0001;
        const ABORTED          = 0b0000_0010;
        const TIMED_OUT        = 0b0000_0100;
        const UPLOAD_COMPLETE  = 0b0000_1000;
        const UPLOAD_LISTENER  = 0b0001_0000;
        const WITH_CREDENTIALS = 0b0010_0000;
    }
}

/// Payload handed to [`XmlHttpRequest::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// UTF-8 text, sent as `text/plain;charset=UTF-8` unless a content type was set
    Text(String),
    /// Opaque bytes, sent without a default content type
    Bytes(Vec<u8>),
}

impl RequestBody {
    fn into_parts(self) -> (Vec<u8>, Option<&'static str>) {
        match self {
            RequestBody::Text(text) => (text.into_bytes(), Some(TEXT_PLAIN_UTF8)),
            RequestBody::Bytes(bytes) => (bytes, None),
        }
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

/// Response data kept once headers have arrived.
#[derive(Debug)]
struct ResponseHead {
    url: Url,
    status: u16,
    status_text: String,
    headers: HeaderMap,
}

/// Mutable state of a request. Only ever borrowed for short, non-suspending sections: no
/// borrow is held while events are dispatched or while the exchange awaits the network.
#[derive(Default)]
struct RequestState {
    ready_state: ReadyState,
    method: Method,
    url: Option<Url>,
    request_headers: HeaderMap,
    response_type: ResponseType,
    override_mime: Option<MimeType>,
    timeout_ms: u64,
    flags: Flags,
    response: Option<ResponseHead>,
    received: ByteAccumulator,
    cached: CachedResponse,
    cancel: Option<CancellationToken>,
}

impl RequestState {
    /// Clears everything tied to the previous exchange.
    fn reset_exchange(&mut self) {
        self.request_headers = HeaderMap::new();
        self.discard_response();
        self.flags
            .remove(Flags::SEND | Flags::ABORTED | Flags::TIMED_OUT | Flags::UPLOAD_COMPLETE | Flags::UPLOAD_LISTENER);
    }

    /// Drops the response together with the bytes and the typed value derived from it.
    fn discard_response(&mut self) {
        self.response = None;
        self.received.reset();
        self.cached = CachedResponse::Empty;
    }

    fn in_flight(&self) -> bool {
        match self.ready_state {
            ReadyState::Opened => self.flags.contains(Flags::SEND),
            ReadyState::HeadersReceived | ReadyState::Loading => true,
            ReadyState::Unsent | ReadyState::Done => false,
        }
    }

    fn error_event(&self) -> EventType {
        if self.flags.contains(Flags::TIMED_OUT) {
            EventType::Timeout
        } else if self.flags.contains(Flags::ABORTED) {
            EventType::Abort
        } else {
            EventType::Error
        }
    }

    fn effective_mime(&self) -> Option<MimeType> {
        let announced = self
            .response
            .as_ref()
            .and_then(|r| headers::response_mime_type(&r.headers));
        response::effective_mime_type(self.override_mime.as_ref(), announced)
    }

    fn text(&self) -> String {
        if self.ready_state < ReadyState::HeadersReceived || self.response.is_none() {
            return String::new();
        }
        response::decode_text(self.received.as_slice(), self.effective_mime().as_ref())
    }
}

struct Inner {
    transport: Rc<dyn Transport>,
    base_url: Option<Url>,
    events: EventDispatcher,
    upload: XmlHttpRequestUpload,
    state: RefCell<RequestState>,
}

/// Client-side HTTP request object with the legacy `XMLHttpRequest` lifecycle.
///
/// A request walks through [`ReadyState`]s as a single exchange progresses and reports every
/// step through events. The handle is cheap to clone; all clones drive the same request. It is
/// meant for a single thread: event handlers run synchronously and may call back into the
/// request (for instance `abort()` from a `readystatechange` handler).
///
/// Handlers that need to reach the request should capture a [`WeakXmlHttpRequest`] to avoid
/// keeping it alive through its own handler table.
///
/// ```no_run
/// use gosub_xhr::{EventType, ReqwestTransport, XhrConfig, XmlHttpRequest, XmlHttpRequestEventTarget};
/// use std::rc::Rc;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let config = XhrConfig::default();
/// let xhr = XmlHttpRequest::with_config(Rc::new(ReqwestTransport::new(&config)?), &config);
///
/// xhr.set_handler(EventType::Progress, |ev| println!("{} / {}", ev.loaded(), ev.total()));
/// xhr.open("GET", "https://example.com/data.json")?;
/// xhr.send(None).await?;
///
/// println!("{} {}", xhr.status(), xhr.response_text()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct XmlHttpRequest {
    inner: Rc<Inner>,
}

/// Non-owning handle to a [`XmlHttpRequest`].
#[derive(Clone)]
pub struct WeakXmlHttpRequest {
    inner: Weak<Inner>,
}

impl WeakXmlHttpRequest {
    pub fn upgrade(&self) -> Option<XmlHttpRequest> {
        self.inner.upgrade().map(|inner| XmlHttpRequest { inner })
    }
}

impl Debug for XmlHttpRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("XmlHttpRequest");
        if let Ok(state) = self.inner.state.try_borrow() {
            dbg.field("ready_state", &state.ready_state)
                .field("method", &state.method)
                .field("url", &state.url.as_ref().map(Url::as_str))
                .field("response_type", &state.response_type);
        }
        dbg.finish_non_exhaustive()
    }
}

impl XmlHttpRequestEventTarget for XmlHttpRequest {
    fn dispatcher(&self) -> &EventDispatcher {
        &self.inner.events
    }
}

impl XmlHttpRequest {
    pub const UNSENT: u16 = ReadyState::Unsent as u16;
    pub const OPENED: u16 = ReadyState::Opened as u16;
    pub const HEADERS_RECEIVED: u16 = ReadyState::HeadersReceived as u16;
    pub const LOADING: u16 = ReadyState::Loading as u16;
    pub const DONE: u16 = ReadyState::Done as u16;

    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self::with_config(transport, &XhrConfig::default())
    }

    pub fn with_config(transport: Rc<dyn Transport>, config: &XhrConfig) -> Self {
        let state = RequestState {
            timeout_ms: config.default_timeout_ms,
            ..RequestState::default()
        };

        Self {
            inner: Rc::new(Inner {
                transport,
                base_url: config.base_url.clone(),
                events: EventDispatcher::new(&EventType::ALL),
                upload: XmlHttpRequestUpload::new(),
                state: RefCell::new(state),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakXmlHttpRequest {
        WeakXmlHttpRequest {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn state(&self) -> Ref<'_, RequestState> {
        self.inner.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, RequestState> {
        self.inner.state.borrow_mut()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state().ready_state
    }

    /// The upload sub-target.
    pub fn upload(&self) -> &XmlHttpRequestUpload {
        &self.inner.upload
    }

    // ****************************************
    // ** Request setup

    /// Opens an asynchronous request. See [`XmlHttpRequest::open_with`].
    pub fn open(&self, method: &str, url: &str) -> Result<(), XhrError> {
        self.open_with(method, url, true, None, None)
    }

    /// Starts a fresh exchange.
    ///
    /// Any in-flight exchange is canceled silently and all request and response state is
    /// cleared. `is_async = false` is always rejected: synchronous requests are not supported.
    pub fn open_with(
        &self,
        method: &str,
        url: &str,
        is_async: bool,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), XhrError> {
        let method = normalize_method(method)?;
        let mut url = self.parse_url(url)?;

        if let Some(username) = username {
            if url.set_username(username).is_err() {
                log::debug!("XmlHttpRequest: cannot carry a username in {url}");
            }
        }
        if let Some(password) = password {
            if url.set_password(Some(password)).is_err() {
                log::debug!("XmlHttpRequest: cannot carry a password in {url}");
            }
        }

        if !is_async {
            return Err(XhrError::NotSupported("synchronous requests are not supported"));
        }

        let previous = {
            let mut state = self.state_mut();
            let previous = state.cancel.take();
            state.reset_exchange();
            state.method = method;
            state.url = Some(url);
            state.ready_state = ReadyState::Opened;
            previous
        };
        if let Some(token) = previous {
            token.cancel();
        }

        log::debug!("XmlHttpRequest: opened {:?}", self);
        self.fire_ready_state_change();
        Ok(())
    }

    fn parse_url(&self, url: &str) -> Result<Url, XhrError> {
        let parsed = match &self.inner.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|e| XhrError::Syntax(format!("invalid URL {url:?}: {e}")))
    }

    /// Appends a request header. Values for the same name accumulate.
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<(), XhrError> {
        let mut state = self.state_mut();
        if state.ready_state != ReadyState::Opened || state.flags.contains(Flags::SEND) {
            return Err(XhrError::InvalidState("setRequestHeader() needs an opened, unsent request"));
        }

        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| XhrError::Syntax(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_str(value.trim_matches([' ', '\t', '\r', '\n']))
            .map_err(|_| XhrError::Syntax(format!("invalid value for header {name}")))?;

        state.request_headers.append(name, value);
        Ok(())
    }

    /// Overrides the MIME type used to interpret the response. Unparsable values fall back to
    /// `application/octet-stream`.
    pub fn override_mime_type(&self, mime: &str) -> Result<(), XhrError> {
        let mut state = self.state_mut();
        if matches!(state.ready_state, ReadyState::Loading | ReadyState::Done) {
            return Err(XhrError::InvalidState("overrideMimeType() is not allowed once loading started"));
        }

        state.override_mime = Some(MimeType::parse(mime).unwrap_or_else(MimeType::octet_stream));
        Ok(())
    }

    pub fn response_type(&self) -> ResponseType {
        self.state().response_type
    }

    /// Sets how `response` is exposed. `"document"` is accepted but ignored.
    pub fn set_response_type(&self, response_type: ResponseType) -> Result<(), XhrError> {
        if response_type == ResponseType::Document {
            log::debug!("XmlHttpRequest: responseType \"document\" is not supported, ignored");
            return Ok(());
        }

        let mut state = self.state_mut();
        if matches!(state.ready_state, ReadyState::Loading | ReadyState::Done) {
            return Err(XhrError::InvalidState("responseType cannot change once loading started"));
        }
        state.response_type = response_type;
        Ok(())
    }

    /// Timeout in milliseconds. 0 means no timeout.
    pub fn timeout(&self) -> u64 {
        self.state().timeout_ms
    }

    pub fn set_timeout(&self, timeout_ms: u64) {
        self.state_mut().timeout_ms = timeout_ms;
    }

    pub fn with_credentials(&self) -> bool {
        self.state().flags.contains(Flags::WITH_CREDENTIALS)
    }

    pub fn set_with_credentials(&self, with_credentials: bool) -> Result<(), XhrError> {
        let mut state = self.state_mut();
        if state.ready_state > ReadyState::Opened || state.flags.contains(Flags::SEND) {
            return Err(XhrError::InvalidState("withCredentials cannot change once sending started"));
        }
        state.flags.set(Flags::WITH_CREDENTIALS, with_credentials);
        Ok(())
    }

    // ****************************************
    // ** Exchange

    /// Sends the request and drives the exchange to its end.
    ///
    /// Precondition failures are returned before anything is sent. Once the request is under
    /// way the future only resolves with `Ok(())`: network failures, aborts and timeouts are
    /// reported through events and leave the request in [`ReadyState::Done`] with status 0.
    /// The body is ignored for `GET` and `HEAD`.
    pub async fn send(&self, body: Option<RequestBody>) -> Result<(), XhrError> {
        let (request, cancel, deadline) = self.prepare_send(body)?;
        log::debug!("XmlHttpRequest: sending {} {}", request.method, request.url);

        self.inner.events.dispatch(&Event::progress(EventType::LoadStart, 0, 0));
        if cancel.is_cancelled() {
            return Ok(());
        }
        self.inner.upload.dispatch_event(&Event::progress(EventType::LoadStart, 0, 0));
        if cancel.is_cancelled() {
            return Ok(());
        }

        match timeout::race(self.run_exchange(request, &cancel), deadline, &cancel).await {
            Race::Finished(Ok(())) | Race::Canceled => {}
            Race::Finished(Err(e)) => {
                // A canceled token means abort() or open() already took over.
                if !cancel.is_cancelled() {
                    log::warn!("XmlHttpRequest: request failed: {e}");
                    self.request_error();
                }
            }
            Race::TimedOut => {
                log::warn!("XmlHttpRequest: timed out after {}ms", self.timeout());
                self.state_mut().flags.insert(Flags::TIMED_OUT);
                self.request_error();
            }
        }

        Ok(())
    }

    fn prepare_send(&self, body: Option<RequestBody>) -> Result<(FetchRequest, CancellationToken, Option<Duration>), XhrError> {
        let upload_listener = self.inner.upload.has_listeners();

        let mut state = self.state_mut();
        if state.ready_state != ReadyState::Opened || state.flags.contains(Flags::SEND) {
            return Err(XhrError::InvalidState("send() needs an opened request that is not already sending"));
        }
        let url = state
            .url
            .clone()
            .ok_or(XhrError::InvalidState("send() called before open()"))?;

        let body = if state.method == Method::GET || state.method == Method::HEAD {
            None
        } else {
            body
        };

        let mut request_headers = state.request_headers.clone();
        let body = body.map(|body| {
            let (bytes, default_type) = body.into_parts();
            if let Some(content_type) = default_type {
                if !request_headers.contains_key(CONTENT_TYPE) {
                    request_headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                }
            }
            bytes
        });

        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());
        state.flags.insert(Flags::SEND);
        state.flags.remove(Flags::ABORTED | Flags::TIMED_OUT);
        state.flags.set(Flags::UPLOAD_COMPLETE, body.as_ref().map_or(true, Vec::is_empty));
        state.flags.set(Flags::UPLOAD_LISTENER, upload_listener);

        let request = FetchRequest {
            method: state.method.clone(),
            url,
            headers: request_headers,
            body,
            credentials: CredentialsMode::from_with_credentials(state.flags.contains(Flags::WITH_CREDENTIALS)),
        };
        let deadline = (state.timeout_ms > 0).then(|| Duration::from_millis(state.timeout_ms));

        Ok((request, cancel, deadline))
    }

    /// Network side of an exchange: headers, then the body chunk by chunk, then completion.
    ///
    /// Handlers may abort or reopen the request during any dispatch, which cancels `cancel`.
    /// The exchange checks the token after every dispatch and stops without touching state.
    async fn run_exchange(&self, request: FetchRequest, cancel: &CancellationToken) -> Result<(), NetError> {
        let transport = self.inner.transport.clone();
        let mut response = transport.fetch(request, cancel.clone()).await?;
        if cancel.is_cancelled() {
            return Ok(());
        }

        self.upload_complete();
        if cancel.is_cancelled() {
            return Ok(());
        }

        let total = match headers::content_length(&response.headers) {
            Ok(length) => length.unwrap_or(0),
            Err(e) => {
                log::debug!("XmlHttpRequest: {e}, reporting an unknown total");
                0
            }
        };
        let body = response.take_body();

        {
            let mut state = self.state_mut();
            state.response = Some(ResponseHead {
                url: response.url,
                status: response.status,
                status_text: response.status_text,
                headers: response.headers,
            });
            state.ready_state = ReadyState::HeadersReceived;
        }
        log::debug!("XmlHttpRequest: headers received, status {}", self.status());

        self.fire_ready_state_change();
        if cancel.is_cancelled() || self.ready_state() != ReadyState::HeadersReceived {
            return Ok(());
        }

        if let Some(mut body) = body {
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                if cancel.is_cancelled() {
                    return Ok(());
                }

                let loaded = {
                    let mut state = self.state_mut();
                    if state.ready_state == ReadyState::HeadersReceived {
                        state.ready_state = ReadyState::Loading;
                    }
                    state.received.append(&chunk)
                };
                log::trace!("XmlHttpRequest: received {} bytes ({loaded}/{total})", chunk.len());

                self.fire_ready_state_change();
                if cancel.is_cancelled() {
                    return Ok(());
                }
                self.inner.events.dispatch(&Event::progress(EventType::Progress, loaded, total));
                if cancel.is_cancelled() {
                    return Ok(());
                }
            }
        }

        self.complete(total);
        Ok(())
    }

    /// The request body has gone out. Notifies the upload target once, if anyone listens.
    fn upload_complete(&self) {
        let notify = {
            let mut state = self.state_mut();
            if state.flags.contains(Flags::UPLOAD_COMPLETE) {
                return;
            }
            state.flags.insert(Flags::UPLOAD_COMPLETE);
            state.flags.contains(Flags::UPLOAD_LISTENER)
        };

        if notify {
            let upload = &self.inner.upload;
            upload.dispatch_event(&Event::progress(EventType::Progress, 0, 0));
            upload.dispatch_event(&Event::progress(EventType::Load, 0, 0));
            upload.dispatch_event(&Event::progress(EventType::LoadEnd, 0, 0));
        }
    }

    fn complete(&self, total: u64) {
        let loaded = {
            let mut state = self.state_mut();
            state.ready_state = ReadyState::Done;
            state.flags.remove(Flags::SEND);
            state.cancel = None;
            state.received.len()
        };
        log::debug!("XmlHttpRequest: done, {loaded} bytes received");

        self.fire_ready_state_change();
        self.inner.events.dispatch(&Event::progress(EventType::Load, loaded, total));
        self.inner.events.dispatch(&Event::progress(EventType::LoadEnd, loaded, total));
    }

    /// Shared failure path for network errors, aborts and timeouts.
    fn request_error(&self) {
        let kind = {
            let mut state = self.state_mut();
            if !state.flags.contains(Flags::SEND) {
                return;
            }
            state.ready_state = ReadyState::Done;
            state.flags.remove(Flags::SEND);
            state.cancel = None;
            state.discard_response();
            state.error_event()
        };

        self.fire_ready_state_change();

        let notify_upload = {
            let mut state = self.state_mut();
            if state.flags.contains(Flags::UPLOAD_COMPLETE) {
                false
            } else {
                state.flags.insert(Flags::UPLOAD_COMPLETE);
                state.flags.contains(Flags::UPLOAD_LISTENER)
            }
        };
        if notify_upload {
            let upload = &self.inner.upload;
            upload.dispatch_event(&Event::progress(kind, 0, 0));
            upload.dispatch_event(&Event::progress(EventType::LoadEnd, 0, 0));
        }

        self.inner.events.dispatch(&Event::progress(kind, 0, 0));
        self.inner.events.dispatch(&Event::progress(EventType::LoadEnd, 0, 0));
    }

    /// Cancels the exchange.
    ///
    /// Mid-exchange this reports `abort` + `loadend` and leaves the request [`ReadyState::Done`].
    /// On a finished request it rewinds to [`ReadyState::Unsent`] and drops the response.
    pub fn abort(&self) {
        let (token, in_flight, done) = {
            let mut state = self.state_mut();
            state.flags.insert(Flags::ABORTED);
            (state.cancel.take(), state.in_flight(), state.ready_state == ReadyState::Done)
        };

        // Canceling a token cannot fail; late transport errors are ignored by send().
        if let Some(token) = token {
            token.cancel();
        }

        if in_flight {
            log::debug!("XmlHttpRequest: aborted");
            self.request_error();
        } else if done {
            let mut state = self.state_mut();
            state.ready_state = ReadyState::Unsent;
            state.discard_response();
        }
    }

    fn fire_ready_state_change(&self) {
        self.inner.events.dispatch(&Event::new(EventType::ReadyStateChange));
    }

    // ****************************************
    // ** Response

    /// HTTP status, 0 until headers arrive and after a network error.
    pub fn status(&self) -> u16 {
        self.state().response.as_ref().map(|r| r.status).unwrap_or(0)
    }

    pub fn status_text(&self) -> String {
        self.state()
            .response
            .as_ref()
            .map(|r| r.status_text.clone())
            .unwrap_or_default()
    }

    /// Final URL of the response without its fragment, `""` without a response.
    pub fn response_url(&self) -> String {
        self.state()
            .response
            .as_ref()
            .map(|r| {
                let mut url = r.url.clone();
                url.set_fragment(None);
                url.to_string()
            })
            .unwrap_or_default()
    }

    pub fn get_response_header(&self, name: &str) -> Option<String> {
        let state = self.state();
        let head = state.response.as_ref()?;
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        headers::combined_value(&head.headers, &name)
    }

    /// All response headers as `name: value` lines sorted by name and joined by CRLF.
    /// Repeated headers are combined into one line. `None` until headers arrive.
    pub fn get_all_response_headers(&self) -> Option<String> {
        let state = self.state();
        let head = state.response.as_ref()?;

        let mut names: Vec<&HeaderName> = head.headers.keys().collect();
        names.sort_by_key(|name| name.as_str().to_ascii_lowercase());

        let lines: Vec<String> = names
            .into_iter()
            .filter_map(|name| {
                headers::combined_value(&head.headers, name).map(|value| format!("{}: {value}", name.as_str()))
            })
            .collect();
        Some(lines.join("\r\n"))
    }

    /// The decoded body text. Only available for the `""` and `"text"` response types.
    pub fn response_text(&self) -> Result<String, XhrError> {
        let state = self.state();
        if !state.response_type.is_textual() {
            return Err(XhrError::InvalidState("responseText needs responseType \"\" or \"text\""));
        }
        Ok(state.text())
    }

    /// Typed response for the current response type.
    ///
    /// Text is decoded on every read. Other types are only available once the exchange is done
    /// and are computed once; a value that could not be produced stays `None`.
    pub fn response(&self) -> Option<XhrResponse> {
        let mut state = self.state_mut();
        if state.response_type.is_textual() {
            return Some(XhrResponse::Text(state.text()));
        }
        if state.ready_state != ReadyState::Done || state.response.is_none() {
            return None;
        }

        match &state.cached {
            CachedResponse::Ready(value) => return Some(value.clone()),
            CachedResponse::Failed => return None,
            CachedResponse::Empty => {}
        }

        let mime = state.effective_mime();
        let value = response::materialize(state.response_type, state.received.as_slice(), mime.as_ref());
        state.cached = match &value {
            Some(value) => CachedResponse::Ready(value.clone()),
            None => CachedResponse::Failed,
        };
        value
    }

    /// Always `None`: responses are never parsed into documents.
    pub fn response_xml(&self) -> Option<Document> {
        let state = self.state();
        if state.ready_state != ReadyState::Done {
            return None;
        }
        response::document_response(state.response_type, state.effective_mime().as_ref())
    }
}

/// Validates `method`, refuses forbidden ones and uppercases the standard ones.
fn normalize_method(method: &str) -> Result<Method, XhrError> {
    let invalid = || XhrError::Syntax(format!("invalid method {method:?}"));
    Method::from_bytes(method.as_bytes()).map_err(|_| invalid())?;

    if FORBIDDEN_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method)) {
        return Err(XhrError::Security(format!("method {method:?} is forbidden")));
    }

    let canonical = NORMALIZED_METHODS
        .iter()
        .find(|m| m.eq_ignore_ascii_case(method))
        .copied()
        .unwrap_or(method);
    Method::from_bytes(canonical.as_bytes()).map_err(|_| invalid())
}
