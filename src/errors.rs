use std::fmt::{Display, Formatter};

/// Label carried by every thrown [`XhrError`]. These are the names legacy callers match on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Security,
    InvalidState,
    NotSupported,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Security => "SecurityError",
            ErrorKind::InvalidState => "InvalidStateError",
            ErrorKind::NotSupported => "NotSupportedError",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures thrown synchronously by the request API.
///
/// Network failures, aborts and timeouts are never reported through this type. They surface
/// as events on the request instead.
#[derive(Debug, thiserror::Error)]
pub enum XhrError {
    #[error("SyntaxError: {0}")]
    Syntax(String),

    #[error("SecurityError: {0}")]
    Security(String),

    #[error("InvalidStateError: {0}")]
    InvalidState(&'static str),

    #[error("NotSupportedError: {0}")]
    NotSupported(&'static str),
}

impl XhrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            XhrError::Syntax(_) => ErrorKind::Syntax,
            XhrError::Security(_) => ErrorKind::Security,
            XhrError::InvalidState(_) => ErrorKind::InvalidState,
            XhrError::NotSupported(_) => ErrorKind::NotSupported,
        }
    }
}

/// Failures produced by a [`Transport`](crate::net::Transport).
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("request canceled")]
    Canceled,

    #[error(transparent)]
    Net(#[from] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_carry_legacy_labels() {
        assert_eq!(XhrError::Syntax("x".into()).kind().name(), "SyntaxError");
        assert_eq!(XhrError::Security("x".into()).kind().name(), "SecurityError");
        assert_eq!(XhrError::InvalidState("x").kind().name(), "InvalidStateError");
        assert_eq!(XhrError::NotSupported("x").kind().name(), "NotSupportedError");
    }

    #[test]
    fn display_is_prefixed_with_kind() {
        let err = XhrError::InvalidState("send() already in progress");
        assert_eq!(err.to_string(), "InvalidStateError: send() already in progress");
        assert_eq!(err.kind().to_string(), "InvalidStateError");
    }
}
