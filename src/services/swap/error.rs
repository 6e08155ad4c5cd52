use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapErrorKind {
    InvalidRequest,
    UnknownToken,
    RouteUnavailable,
    SlippageRejected,
    CommandBuild,
}

#[derive(Debug)]
pub struct SwapError {
    kind: SwapErrorKind,
    message: String,
}

impl SwapError {
    pub fn invalid<T: Into<String>>(message: T) -> Self {
        Self {
            kind: SwapErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn unknown_token<T: Into<String>>(message: T) -> Self {
        Self {
            kind: SwapErrorKind::UnknownToken,
            message: message.into(),
        }
    }

    pub fn route_unavailable<T: Into<String>>(message: T) -> Self {
        Self {
            kind: SwapErrorKind::RouteUnavailable,
            message: message.into(),
        }
    }

    pub fn slippage_rejected<T: Into<String>>(message: T) -> Self {
        Self {
            kind: SwapErrorKind::SlippageRejected,
            message: message.into(),
        }
    }

    pub fn command_build<T: Into<String>>(message: T) -> Self {
        Self {
            kind: SwapErrorKind::CommandBuild,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> SwapErrorKind {
        self.kind
    }
}

impl fmt::Display for SwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SwapError {}
