//! Explicit installation of the request constructors into a host namespace.
//!
//! The host calls [`install`] once with the namespace it exposes to scripts. Names that are
//! already defined there are left alone, so a host that ships its own implementation keeps it.

use crate::config::XhrConfig;
use crate::net::Transport;
use crate::xhr::{Event, EventType, XmlHttpRequest};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";
pub const XML_HTTP_REQUEST_UPLOAD: &str = "XMLHttpRequestUpload";
pub const XML_HTTP_REQUEST_EVENT_TARGET: &str = "XMLHttpRequestEventTarget";
pub const PROGRESS_EVENT: &str = "ProgressEvent";

/// Creates requests sharing one transport and configuration.
#[derive(Clone)]
pub struct XhrFactory {
    transport: Rc<dyn Transport>,
    config: XhrConfig,
}

impl XhrFactory {
    pub fn new(transport: Rc<dyn Transport>, config: XhrConfig) -> Self {
        Self { transport, config }
    }

    pub fn create(&self) -> XmlHttpRequest {
        XmlHttpRequest::with_config(self.transport.clone(), &self.config)
    }

    pub fn config(&self) -> &XhrConfig {
        &self.config
    }
}

impl Debug for XhrFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XhrFactory").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Value bound to a name in a [`Namespace`].
#[derive(Clone)]
pub enum Constructor {
    /// Builds new requests
    XmlHttpRequest(XhrFactory),
    /// Builds progress events: `(type, loaded, total)`
    ProgressEvent(fn(EventType, u64, u64) -> Event),
    /// Name-only interface that cannot be constructed directly
    Interface(&'static str),
}

impl Debug for Constructor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constructor::XmlHttpRequest(factory) => f.debug_tuple("XmlHttpRequest").field(factory).finish(),
            Constructor::ProgressEvent(_) => f.write_str("ProgressEvent"),
            Constructor::Interface(name) => f.debug_tuple("Interface").field(name).finish(),
        }
    }
}

/// Host-supplied map from global names to constructors.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: HashMap<String, Constructor>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Constructor> {
        self.entries.get(name)
    }

    /// Binds `name` unless it is already bound. Returns true when the binding was added.
    pub fn define(&mut self, name: &str, constructor: Constructor) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.insert(name.to_string(), constructor);
        true
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Installs the request constructors where absent and returns the names actually installed.
pub fn install(namespace: &mut Namespace, factory: XhrFactory) -> Vec<&'static str> {
    let bindings = [
        (XML_HTTP_REQUEST, Constructor::XmlHttpRequest(factory)),
        (XML_HTTP_REQUEST_UPLOAD, Constructor::Interface(XML_HTTP_REQUEST_UPLOAD)),
        (XML_HTTP_REQUEST_EVENT_TARGET, Constructor::Interface(XML_HTTP_REQUEST_EVENT_TARGET)),
        (PROGRESS_EVENT, Constructor::ProgressEvent(Event::progress)),
    ];

    let mut installed = Vec::new();
    for (name, constructor) in bindings {
        if namespace.define(name, constructor) {
            installed.push(name);
        } else {
            log::debug!("bootstrap: {name} already defined, leaving it in place");
        }
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::testing::ScriptedTransport;
    use crate::xhr::ReadyState;

    fn factory() -> XhrFactory {
        XhrFactory::new(ScriptedTransport::new(), XhrConfig::default())
    }

    #[test]
    fn installs_everything_into_an_empty_namespace() {
        let mut ns = Namespace::new();
        let installed = install(&mut ns, factory());
        assert_eq!(
            installed,
            [XML_HTTP_REQUEST, XML_HTTP_REQUEST_UPLOAD, XML_HTTP_REQUEST_EVENT_TARGET, PROGRESS_EVENT]
        );
        assert_eq!(
            ns.names(),
            ["ProgressEvent", "XMLHttpRequest", "XMLHttpRequestEventTarget", "XMLHttpRequestUpload"]
        );
    }

    #[test]
    fn existing_bindings_are_kept() {
        let mut ns = Namespace::new();
        assert!(ns.define(XML_HTTP_REQUEST, Constructor::Interface("HostXhr")));

        let installed = install(&mut ns, factory());
        assert!(!installed.contains(&XML_HTTP_REQUEST));
        assert!(matches!(ns.get(XML_HTTP_REQUEST), Some(Constructor::Interface("HostXhr"))));

        // A second install finds everything in place.
        assert!(install(&mut ns, factory()).is_empty());
    }

    #[test]
    fn installed_constructors_work() {
        let mut ns = Namespace::new();
        install(&mut ns, factory());

        match ns.get(XML_HTTP_REQUEST) {
            Some(Constructor::XmlHttpRequest(factory)) => {
                let xhr = factory.create();
                assert_eq!(xhr.ready_state(), ReadyState::Unsent);
            }
            other => panic!("unexpected binding {:?}", other),
        }

        match ns.get(PROGRESS_EVENT) {
            Some(Constructor::ProgressEvent(make)) => {
                let ev = make(EventType::Progress, 3, 10);
                assert_eq!(ev.loaded(), 3);
                assert_eq!(ev.total(), 10);
            }
            other => panic!("unexpected binding {:?}", other),
        }
    }
}
