pub mod api;
pub mod audio;
pub mod avatar;
pub mod integration;
pub mod messages;
pub mod transport;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CaresmaError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Avatar session error: {0}")]
    AvatarError(String),

    #[error("Backend error: {0}")]
    ApiError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl From<std::io::Error> for CaresmaError {
    fn from(e: std::io::Error) -> Self {
        CaresmaError::IoError(e.to_string())
    }
}

impl CaresmaError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Device errors require user intervention (another app holding
            // the mic, missing hardware)
            CaresmaError::AudioDeviceError(_) => false,
            // A dropped channel is recovered by starting a new session
            CaresmaError::TransportError(_) => true,
            CaresmaError::AvatarError(_) => true,
            CaresmaError::ApiError(_) => true,
            CaresmaError::ValidationError(_) => true,
            CaresmaError::IoError(_) => false,
            CaresmaError::ConfigError(_) => false,
            CaresmaError::ChannelError(_) => false,
            CaresmaError::SessionError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            CaresmaError::AudioDeviceError(_) => "Microphone access denied".to_string(),
            CaresmaError::TransportError(_) => "Connection error".to_string(),
            CaresmaError::AvatarError(_) => {
                "Avatar session failed. Responses will be shown as text.".to_string()
            }
            CaresmaError::ApiError(detail) => detail.clone(),
            CaresmaError::ValidationError(msg) => msg.clone(),
            CaresmaError::IoError(_) => "File system error occurred.".to_string(),
            CaresmaError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            CaresmaError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            CaresmaError::SessionError(_) => "Session error occurred. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaresmaError>;
