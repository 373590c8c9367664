// MIT License - Copyright (c) 2026 Peter Wright
// Error taxonomy

/// All errors that can occur in the homehub library.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization failed: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Transport error: {details}")]
    Transport { details: String },

    #[error("Publish rejected while not connected: {channel}")]
    PublishRejected { channel: String },

    #[error("Hub task is no longer running")]
    ChannelClosed,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI endpoint rate limited")]
    AiRateLimited,

    #[error("AI endpoint returned status {status}")]
    AiEndpoint { status: u16 },

    #[error("Unusable AI response: {details}")]
    AiResponse { details: String },
}

impl HubError {
    /// Whether this error is transient and a later attempt may succeed.
    ///
    /// Rate limiting is deliberately excluded: callers handle it through
    /// a backoff policy rather than a plain retry.
    pub fn is_transient(&self) -> bool {
        match self {
            HubError::Transport { .. } | HubError::Http(_) | HubError::ChannelClosed => true,
            HubError::AiEndpoint { status } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HubError::Transport { details: "poll failed".into() }.is_transient());
        assert!(HubError::AiEndpoint { status: 503 }.is_transient());
        assert!(!HubError::AiEndpoint { status: 400 }.is_transient());
        assert!(!HubError::AiRateLimited.is_transient());
        assert!(!HubError::PublishRejected { channel: "control/bulb".into() }.is_transient());
    }
}
