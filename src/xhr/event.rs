//! Event types and dispatch.
//!
//! Two layers are provided:
//!
//! - [`EventTarget`]: a plain multi-listener broadcast. Listeners run in registration order.
//! - [`EventDispatcher`]: wraps an `EventTarget` with one assignable handler slot per event
//!   type (the `onload`, `onprogress`, ... properties). The slot runs first, then the listeners.
//!
//! Handlers run synchronously and may re-enter the request (e.g. call `abort()`), or add and
//! remove listeners while an event is being dispatched. Dispatch therefore always works on a
//! snapshot of the registered callbacks and never holds a borrow while invoking one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;
use std::str::FromStr;
use uuid::Uuid;

/// Callback invoked for a dispatched event.
pub type Listener = Rc<dyn Fn(&Event)>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    LoadStart,
    Progress,
    Abort,
    Error,
    Load,
    Timeout,
    LoadEnd,
    ReadyStateChange,
}

impl EventType {
    /// Events shared by the request and its upload target.
    pub const PROGRESS_EVENTS: [EventType; 7] = [
        EventType::LoadStart,
        EventType::Progress,
        EventType::Abort,
        EventType::Error,
        EventType::Load,
        EventType::Timeout,
        EventType::LoadEnd,
    ];

    pub const ALL: [EventType; 8] = [
        EventType::LoadStart,
        EventType::Progress,
        EventType::Abort,
        EventType::Error,
        EventType::Load,
        EventType::Timeout,
        EventType::LoadEnd,
        EventType::ReadyStateChange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventType::LoadStart => "loadstart",
            EventType::Progress => "progress",
            EventType::Abort => "abort",
            EventType::Error => "error",
            EventType::Load => "load",
            EventType::Timeout => "timeout",
            EventType::LoadEnd => "loadend",
            EventType::ReadyStateChange => "readystatechange",
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0:?}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Byte counters carried by progress events.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ProgressInfo {
    pub loaded: u64,
    pub total: u64,
    pub length_computable: bool,
}

impl ProgressInfo {
    /// The length is computable whenever a non-zero total is known.
    pub fn new(loaded: u64, total: u64) -> Self {
        Self {
            loaded,
            total,
            length_computable: total != 0,
        }
    }
}

/// A dispatched event.
#[derive(Debug)]
pub struct Event {
    kind: EventType,
    cancelable: bool,
    default_prevented: Cell<bool>,
    progress: Option<ProgressInfo>,
}

impl Event {
    /// Plain, non-cancelable event (used for `readystatechange`).
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            cancelable: false,
            default_prevented: Cell::new(false),
            progress: None,
        }
    }

    /// Progress event carrying `loaded`/`total` counters.
    pub fn progress(kind: EventType, loaded: u64, total: u64) -> Self {
        Self {
            progress: Some(ProgressInfo::new(loaded, total)),
            ..Self::new(kind)
        }
    }

    pub fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    pub fn kind(&self) -> EventType {
        self.kind
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Marks the default action as prevented. Has no effect on non-cancelable events.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn progress_info(&self) -> Option<ProgressInfo> {
        self.progress
    }

    pub fn loaded(&self) -> u64 {
        self.progress.map(|p| p.loaded).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.progress.map(|p| p.total).unwrap_or(0)
    }
}

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct Registration {
    id: ListenerId,
    kind: EventType,
    listener: Listener,
}

/// Multi-listener broadcast.
#[derive(Default)]
pub struct EventTarget {
    listeners: RefCell<Vec<Registration>>,
}

impl Debug for EventTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener(&self, kind: EventType, listener: impl Fn(&Event) + 'static) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.borrow_mut().push(Registration {
            id,
            kind,
            listener: Rc::new(listener),
        });
        id
    }

    /// Removes a listener. Returns false when the id is unknown.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.borrow().is_empty()
    }

    pub fn listener_count(&self, kind: EventType) -> usize {
        self.listeners.borrow().iter().filter(|r| r.kind == kind).count()
    }

    /// Invokes every listener registered for the event type, in registration order.
    ///
    /// Returns false when the event is cancelable and one of the listeners prevented it.
    pub fn dispatch(&self, event: &Event) -> bool {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|r| r.kind == event.kind())
            .map(|r| r.listener.clone())
            .collect();

        for listener in snapshot {
            listener(event);
        }

        !(event.is_cancelable() && event.default_prevented())
    }
}

/// Handler slots plus listeners: the event surface of the request and of its upload target.
pub struct EventDispatcher {
    supported: &'static [EventType],
    handlers: RefCell<HashMap<EventType, Listener>>,
    target: EventTarget,
}

impl Debug for EventDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<&'static str> = self.handlers.borrow().keys().map(EventType::name).collect();
        handlers.sort_unstable();
        f.debug_struct("EventDispatcher")
            .field("handlers", &handlers)
            .field("target", &self.target)
            .finish()
    }
}

impl EventDispatcher {
    /// Creates a dispatcher with handler slots for the given event types.
    pub fn new(supported: &'static [EventType]) -> Self {
        Self {
            supported,
            handlers: RefCell::new(HashMap::new()),
            target: EventTarget::new(),
        }
    }

    pub fn supports(&self, kind: EventType) -> bool {
        self.supported.contains(&kind)
    }

    /// Assigns the handler slot for `kind`, replacing any previous handler.
    /// Returns false (and assigns nothing) when this surface has no slot for `kind`.
    pub fn set_handler(&self, kind: EventType, handler: impl Fn(&Event) + 'static) -> bool {
        if !self.supports(kind) {
            log::warn!("EventDispatcher: no {kind} handler slot on this target");
            return false;
        }
        self.handlers.borrow_mut().insert(kind, Rc::new(handler));
        true
    }

    pub fn clear_handler(&self, kind: EventType) {
        self.handlers.borrow_mut().remove(&kind);
    }

    /// The handler currently assigned to the slot for `kind`, if any.
    pub fn handler(&self, kind: EventType) -> Option<Listener> {
        self.handlers.borrow().get(&kind).cloned()
    }

    pub fn has_handler(&self, kind: EventType) -> bool {
        self.handlers.borrow().contains_key(&kind)
    }

    /// True when any handler slot is assigned or any listener is registered.
    pub fn has_listeners(&self) -> bool {
        !self.handlers.borrow().is_empty() || self.target.has_listeners()
    }

    pub fn target(&self) -> &EventTarget {
        &self.target
    }

    /// Runs the handler slot for the event, then the listeners.
    ///
    /// Returns false when the event is cancelable and its default was prevented anywhere in
    /// that chain, otherwise the result of the listener broadcast.
    pub fn dispatch(&self, event: &Event) -> bool {
        if let Some(handler) = self.handler(event.kind()) {
            handler(event);
        }

        let broadcast = self.target.dispatch(event);
        if event.is_cancelable() && event.default_prevented() {
            return false;
        }
        broadcast
    }
}

/// Event registration shared by the request object and its upload target.
pub trait XmlHttpRequestEventTarget {
    fn dispatcher(&self) -> &EventDispatcher;

    /// Assigns the single handler for `kind` (the `on<event>` property).
    fn set_handler(&self, kind: EventType, handler: impl Fn(&Event) + 'static) -> bool
    where
        Self: Sized,
    {
        self.dispatcher().set_handler(kind, handler)
    }

    fn clear_handler(&self, kind: EventType) {
        self.dispatcher().clear_handler(kind)
    }

    fn add_event_listener(&self, kind: EventType, listener: impl Fn(&Event) + 'static) -> ListenerId
    where
        Self: Sized,
    {
        self.dispatcher().target().add_event_listener(kind, listener)
    }

    fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.dispatcher().target().remove_event_listener(id)
    }

    fn dispatch_event(&self, event: &Event) -> bool {
        self.dispatcher().dispatch(event)
    }
}
