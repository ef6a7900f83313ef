use crate::xhr::event::{EventDispatcher, EventType, XmlHttpRequestEventTarget};

/// Event surface for the transmission of the request body.
///
/// Only synthetic events are ever fired here: `loadstart` when sending starts and, once the
/// body has gone out, a single zero-length `progress` followed by `load` and `loadend`. Byte
/// level upload progress is not tracked.
#[derive(Debug)]
pub struct XmlHttpRequestUpload {
    dispatcher: EventDispatcher,
}

impl Default for XmlHttpRequestUpload {
    fn default() -> Self {
        Self {
            dispatcher: EventDispatcher::new(&EventType::PROGRESS_EVENTS),
        }
    }
}

impl XmlHttpRequestUpload {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// True when any handler or listener is attached. Sampled by `send()`.
    pub fn has_listeners(&self) -> bool {
        self.dispatcher.has_listeners()
    }
}

impl XmlHttpRequestEventTarget for XmlHttpRequestUpload {
    fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }
}
