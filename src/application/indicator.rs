use std::fmt;

/// Outcome of the most recent interaction with a collaborator, for operator feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Warning,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Observational status line. Nothing in the dispatch flow reads it back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusIndicator {
    state: ConnectionState,
    message: String,
}

impl StatusIndicator {
    pub fn set(&mut self, state: ConnectionState, message: impl Into<String>) {
        self.state = state;
        self.message = message.into();
        tracing::debug!(state = %self.state, message = %self.message, "Status changed");
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
