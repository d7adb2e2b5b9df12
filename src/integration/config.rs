//! Configuration for the session layer
//!
//! Provides centralized configuration for all components. Values come from
//! the environment (loaded through dotenv in `main`) with defaults matching
//! the local development backend.

/// Configuration for the complete client
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the assessment backend API
    pub api_base_url: String,

    /// Base URL of the avatar vendor's control API
    pub avatar_api_url: String,

    /// Avatar to render
    pub avatar_name: String,

    /// Rendering quality requested from the vendor
    pub avatar_quality: String,

    /// Sample rate audio is captured and streamed at
    pub sample_rate: u32,

    /// Samples per outbound audio frame
    pub frame_samples: usize,

    /// Whether to acquire the microphone when recording starts
    pub enable_audio_input: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            avatar_api_url: "https://api.heygen.com/v1".to_string(),
            avatar_name: "default".to_string(),
            avatar_quality: "medium".to_string(),
            sample_rate: 24000,
            frame_samples: crate::audio::FRAME_SAMPLES,
            enable_audio_input: true,
        }
    }
}

impl AppConfig {
    /// Build a configuration from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CARESMA_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("CARESMA_AVATAR_API_URL") {
            config.avatar_api_url = url;
        }
        if let Ok(name) = std::env::var("CARESMA_AVATAR_NAME") {
            config.avatar_name = name;
        }
        config
    }

    /// Disable microphone capture (events and controls still flow)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// WebSocket endpoint for one session, derived from the API base URL
    pub fn session_ws_url(&self, session_id: &str) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws/session/{}", ws_base, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sample_rate, 24000);
        assert_eq!(config.frame_samples, 4096);
        assert!(config.enable_audio_input);
    }

    #[test]
    fn test_ws_url_from_http_base() {
        let config = AppConfig::default();
        assert_eq!(
            config.session_ws_url("abc-123"),
            "ws://localhost:8000/api/v1/ws/session/abc-123"
        );
    }

    #[test]
    fn test_ws_url_from_https_base() {
        let config = AppConfig {
            api_base_url: "https://api.example.com/api/v1/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.session_ws_url("abc"),
            "wss://api.example.com/api/v1/ws/session/abc"
        );
    }

    #[test]
    fn test_config_builder() {
        let config = AppConfig::default().without_audio_input();
        assert!(!config.enable_audio_input);
    }
}
