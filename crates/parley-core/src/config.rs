use crate::error::{ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client-side settings for reaching the chat, assistant and upload services.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the HTTP API (directory, assistant, uploads).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base URL of the WebSocket chat service.
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,
    /// Identity under which assistant replies are recorded.
    #[serde(default = "default_assistant_identity")]
    pub assistant_identity: String,
    /// Capacity of per-link event buffers.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Timeout applied to every HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Swallow the chat service's echo of our own sends.
    #[serde(default = "default_echo_suppression")]
    pub echo_suppression: bool,
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Service paths, joined onto the base URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_contacts_path")]
    pub contacts: String,
    #[serde(default = "default_chat_path")]
    pub chat: String,
    #[serde(default = "default_assistant_path")]
    pub assistant: String,
    #[serde(default = "default_assistant_history_path")]
    pub assistant_history: String,
    #[serde(default = "default_upload_path")]
    pub upload: String,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_ws_base_url() -> String {
    "ws://127.0.0.1:8000".into()
}

fn default_assistant_identity() -> String {
    "ToDo AI".into()
}

fn default_event_buffer() -> usize {
    256
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_echo_suppression() -> bool {
    true
}

fn default_contacts_path() -> String {
    "/auth/auth/all".into()
}

fn default_chat_path() -> String {
    "/ws/chat".into()
}

fn default_assistant_path() -> String {
    "/api/todo-ai/".into()
}

fn default_assistant_history_path() -> String {
    "/api/todo-ai/chats".into()
}

fn default_upload_path() -> String {
    "/files/upload".into()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            contacts: default_contacts_path(),
            chat: default_chat_path(),
            assistant: default_assistant_path(),
            assistant_history: default_assistant_history_path(),
            upload: default_upload_path(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_base_url: default_ws_base_url(),
            assistant_identity: default_assistant_identity(),
            event_buffer: default_event_buffer(),
            request_timeout_secs: default_request_timeout_secs(),
            echo_suppression: default_echo_suppression(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> ParleyResult<Self> {
        toml::from_str(raw).map_err(|e| ParleyError::Config(format!("invalid TOML: {e}")))
    }

    /// Read, parse, apply `PARLEY_*` environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> ParleyResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ParleyError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        tracing::debug!(path = %path.display(), "Client config loaded");
        Ok(config)
    }

    /// Override base URLs and the assistant identity from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PARLEY_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("PARLEY_WS_BASE_URL") {
            self.ws_base_url = v;
        }
        if let Some(v) = lookup("PARLEY_ASSISTANT_IDENTITY") {
            self.assistant_identity = v;
        }
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> ParleyResult<()> {
        check_base_url("api_base_url", &self.api_base_url, &["http://", "https://"])?;
        check_base_url("ws_base_url", &self.ws_base_url, &["ws://", "wss://"])?;
        if self.assistant_identity.trim().is_empty() {
            return Err(ParleyError::Config("assistant_identity is empty".into()));
        }
        if self.event_buffer == 0 {
            return Err(ParleyError::Config("event_buffer must be positive".into()));
        }
        Ok(())
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of an HTTP endpoint path.
    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.api_base_url, path)
    }

    /// Full URL of the chat service root, before peer path segments.
    pub fn chat_url(&self) -> String {
        join_url(&self.ws_base_url, &self.endpoints.chat)
    }
}

fn check_base_url(field: &str, value: &str, schemes: &[&str]) -> ParleyResult<()> {
    if value.trim().is_empty() {
        return Err(ParleyError::Config(format!("{field} is empty")));
    }
    if !schemes.iter().any(|s| value.starts_with(s)) {
        return Err(ParleyError::Config(format!(
            "{field} must start with one of {schemes:?}, got '{value}'"
        )));
    }
    Ok(())
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.assistant_identity, "ToDo AI");
        assert_eq!(config.event_buffer, 256);
        assert!(config.echo_suppression);
        assert_eq!(config.endpoints.assistant, "/api/todo-ai/");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_endpoint_table_keeps_other_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_base_url = "https://tasks.example.com/"
            [endpoints]
            upload = "/v2/attachments"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.api_url(&config.endpoints.upload),
            "https://tasks.example.com/v2/attachments"
        );
        assert_eq!(config.endpoints.contacts, "/auth/auth/all");
    }

    #[test]
    fn test_assistant_path_keeps_trailing_slash() {
        let config = ClientConfig::default();
        assert_eq!(
            config.api_url(&config.endpoints.assistant),
            "http://127.0.0.1:8000/api/todo-ai/"
        );
        assert_eq!(config.chat_url(), "ws://127.0.0.1:8000/ws/chat");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.ws_base_url = "http://wrong-scheme".into();
        assert!(matches!(config.validate(), Err(ParleyError::Config(_))));

        let mut config = ClientConfig::default();
        config.event_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.assistant_identity = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        assert!(matches!(
            ClientConfig::from_toml_str("event_buffer = \"many\""),
            Err(ParleyError::Config(_))
        ));
    }

    #[test]
    fn test_overrides_replace_base_urls() {
        let env: HashMap<&str, &str> = [
            ("PARLEY_API_BASE_URL", "https://api.example.com"),
            ("PARLEY_ASSISTANT_IDENTITY", "Helper"),
        ]
        .into_iter()
        .collect();
        let mut config = ClientConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.assistant_identity, "Helper");
        assert_eq!(config.ws_base_url, "ws://127.0.0.1:8000");
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "event_buffer = 8\necho_suppression = false\n").unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.event_buffer, 8);
        assert!(!config.echo_suppression);
    }

    #[test]
    fn test_load_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ClientConfig::load(dir.path().join("absent.toml")),
            Err(ParleyError::Config(_))
        ));
    }
}
