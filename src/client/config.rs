use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use crate::shared::messaging::UserId;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Name of the session cookie issued by the portal
pub const SESSION_COOKIE_NAME: &str = "connect.sid";

/// Client configuration: the shared app config plus the session identity.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    session_cookie: Option<String>,
    current_user_id: Option<UserId>,
}

impl Default for Config {
    fn default() -> Self {
        let server_url = std::env::var("CLIENT_API_URL")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let app = AppConfig {
            server_url: Some(server_url),
            ..AppConfig::default()
        };
        Self { app, session_cookie: None, current_user_id: None }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self::from_app(builder.build()?))
    }

    /// Wrap an already validated app config. `CLIENT_API_URL` still overrides the URL.
    pub fn from_app(mut app: AppConfig) -> Self {
        if let Ok(url) = std::env::var("CLIENT_API_URL") {
            app.server_url = Some(url);
        }
        Self { app, session_cookie: None, current_user_id: None }
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Set the session cookie value
    pub fn set_session(&mut self, cookie: Option<String>) {
        self.session_cookie = cookie;
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// `Cookie` header value for authenticated requests
    pub fn cookie_header(&self) -> Option<String> {
        self.session_cookie
            .as_ref()
            .map(|value| format!("{}={}", SESSION_COOKIE_NAME, value))
    }

    /// Clear the session (logout)
    pub fn clear_session(&mut self) {
        self.session_cookie = None;
        self.current_user_id = None;
    }

    pub fn set_current_user(&mut self, user_id: Option<UserId>) {
        self.current_user_id = user_id;
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.current_user_id
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.server_url().trim_end_matches('/'),
            self.app.api_prefix,
            path
        )
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }
}
