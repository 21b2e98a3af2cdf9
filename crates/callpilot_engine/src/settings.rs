use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
/// Appended to the bearer token so the gateway can attribute traffic.
pub const DEFAULT_CLIENT_TAG: &str = "callPilot";

/// Connection settings for the completion endpoint.
///
/// Loaded once at startup and replaced wholesale through
/// [`crate::ReqwestCompletionClient::update_settings`].
#[derive(Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub endpoint: String,
    pub token: String,
    pub model: String,
    pub client_tag: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            model: DEFAULT_MODEL.to_string(),
            client_tag: DEFAULT_CLIENT_TAG.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("endpoint URL is required")]
    MissingEndpoint,
    #[error("API token is required")]
    MissingToken,
    #[error("endpoint URL is invalid: {0}")]
    InvalidEndpoint(String),
}

impl LlmSettings {
    /// Builds settings from user input; both values are trimmed and required.
    pub fn validated(endpoint: &str, token: &str) -> Result<Self, SettingsError> {
        let endpoint = endpoint.trim();
        let token = token.trim();
        if endpoint.is_empty() {
            return Err(SettingsError::MissingEndpoint);
        }
        if token.is_empty() {
            return Err(SettingsError::MissingToken);
        }
        reqwest::Url::parse(endpoint)
            .map_err(|err| SettingsError::InvalidEndpoint(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            ..Self::default()
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.token.trim().is_empty()
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}:{}", self.token, self.client_tag)
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("endpoint", &self.endpoint)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("client_tag", &self.client_tag)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
