use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lifecycle stage of an exchange. Ordered: a running exchange only ever moves forward.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReadyState {
    /// Created, `open()` not called yet
    #[default]
    Unsent = 0,
    /// `open()` has been called
    Opened = 1,
    /// Response headers are available
    HeadersReceived = 2,
    /// Body bytes are being received
    Loading = 3,
    /// The exchange is finished, successfully or not
    Done = 4,
}

impl ReadyState {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReadyState::Unsent => "UNSENT",
            ReadyState::Opened => "OPENED",
            ReadyState::HeadersReceived => "HEADERS_RECEIVED",
            ReadyState::Loading => "LOADING",
            ReadyState::Done => "DONE",
        }
    }
}

impl From<ReadyState> for u16 {
    fn from(state: ReadyState) -> Self {
        state.as_u16()
    }
}

impl Display for ReadyState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_legacy_constants() {
        assert_eq!(ReadyState::Unsent.as_u16(), 0);
        assert_eq!(ReadyState::Opened.as_u16(), 1);
        assert_eq!(ReadyState::HeadersReceived.as_u16(), 2);
        assert_eq!(u16::from(ReadyState::Loading), 3);
        assert_eq!(u16::from(ReadyState::Done), 4);
        assert!(ReadyState::Loading > ReadyState::HeadersReceived);
        assert_eq!(ReadyState::HeadersReceived.to_string(), "HEADERS_RECEIVED");
    }
}
