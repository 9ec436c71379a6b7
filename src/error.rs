//! Error types for the Parkbot session controller
//!
//! Guard violations inside the state machine are not errors; they are
//! reported as [`crate::session::Transition::Ignored`]. These variants
//! cover the real boundaries: configuration, fixtures, channels and
//! speech providers.

use thiserror::Error;

/// Parkbot errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParkbotError {
    /// Speech input provider failed to start or reported a failure
    #[error("Speech input error: {0}")]
    SpeechInputError(String),

    /// Speech output provider failed to vocalize an utterance
    #[error("Speech output error: {0}")]
    SpeechOutputError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),

    /// Fixture data violates a record invariant
    #[error("Fixture error: {0}")]
    FixtureError(String),

    /// Scenario file could not be parsed or is malformed
    #[error("Scenario error: {0}")]
    ScenarioError(String),
}

impl From<std::io::Error> for ParkbotError {
    fn from(e: std::io::Error) -> Self {
        ParkbotError::IOError(e.to_string())
    }
}

impl ParkbotError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the session usable; the others need the
    /// caller to fix its input or restart the runtime.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Provider sessions can simply be started again
            ParkbotError::SpeechInputError(_) => true,
            ParkbotError::SpeechOutputError(_) => true,
            // The controller thread is gone
            ParkbotError::ChannelError(_) => false,
            ParkbotError::ConfigError(_) => false,
            ParkbotError::IOError(_) => false,
            ParkbotError::FixtureError(_) => false,
            ParkbotError::ScenarioError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            ParkbotError::SpeechInputError(_) => {
                "Voice input failed. Please try again or type your request.".to_string()
            }
            ParkbotError::SpeechOutputError(_) => {
                "Voice playback failed. The reply is shown as text.".to_string()
            }
            ParkbotError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            ParkbotError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
            ParkbotError::IOError(_) => "File system error occurred.".to_string(),
            ParkbotError::FixtureError(_) => "Parking data could not be loaded.".to_string(),
            ParkbotError::ScenarioError(_) => "Scenario file is invalid.".to_string(),
        }
    }
}

/// Result type alias for Parkbot operations
pub type Result<T> = std::result::Result<T, ParkbotError>;
