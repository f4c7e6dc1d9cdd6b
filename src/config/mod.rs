//! Configuration module for handling environment variables and .env files

use dotenv::dotenv;
use log::info;
use std::env;

use crate::client::{AnonymousClient, ClientError, LoginClient, OauthClient, DEFAULT_USER_AGENT};

/// Application configuration derived from environment variables and .env file
#[derive(Debug, Clone)]
pub struct AppConfig {
    // API credentials
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,

    // API settings
    pub user_agent: String,
    pub oauth_port: Option<u16>,

    // OAuth token (if provided directly)
    pub access_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            oauth_port: None,
            access_token: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn load() -> Self {
        // Try to load .env file, but continue even if it doesn't exist
        match dotenv() {
            Ok(_) => info!("loaded environment from .env file"),
            Err(_) => info!("no .env file found, using system environment variables only"),
        }

        let mut config = Self::default();

        if let Ok(client_id) = env::var("REDDIT_CLIENT_ID") {
            config.client_id = Some(client_id);
        }
        if let Ok(client_secret) = env::var("REDDIT_CLIENT_SECRET") {
            config.client_secret = Some(client_secret);
        }
        if let Ok(username) = env::var("REDDIT_USERNAME") {
            config.username = Some(username);
        }
        if let Ok(password) = env::var("REDDIT_PASSWORD") {
            config.password = Some(password);
        }
        if let Ok(user_agent) = env::var("REDDIT_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(port) = env::var("REDDIT_OAUTH_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.oauth_port = Some(port);
            }
        }
        if let Ok(access_token) = env::var("REDDIT_ACCESS_TOKEN") {
            config.access_token = Some(access_token);
        }

        config
    }

    /// An unauthenticated client with the configured user agent.
    pub fn anonymous_client(&self) -> AnonymousClient {
        AnonymousClient::new(&self.user_agent)
    }

    /// An OAuth client, primed with a direct access token or persisted
    /// tokens when available. Authentication may still be required before
    /// API calls succeed.
    pub fn oauth_client(&self) -> OauthClient {
        if let Some(token) = &self.access_token {
            return OauthClient::with_access_token(token, &self.user_agent);
        }
        match &self.client_id {
            Some(client_id) => OauthClient::with_stored_tokens(client_id, &self.user_agent),
            None => OauthClient::new(&self.user_agent),
        }
    }

    /// An OAuth client that is actually authenticated: uses the configured
    /// token if present, otherwise runs the password grant with the
    /// configured script-app credentials.
    pub async fn authenticated_oauth_client(&self) -> Result<OauthClient, ClientError> {
        if let Some(token) = &self.access_token {
            return Ok(OauthClient::with_access_token(token, &self.user_agent));
        }

        match (
            &self.client_id,
            &self.client_secret,
            &self.username,
            &self.password,
        ) {
            (Some(client_id), Some(client_secret), Some(username), Some(password)) => {
                let mut client =
                    OauthClient::with_stored_tokens(client_id, &self.user_agent);
                client
                    .login(client_id, client_secret, username, password)
                    .await?;
                Ok(client)
            }
            _ => Err(ClientError::NotAuthenticated(
                "set REDDIT_ACCESS_TOKEN, or REDDIT_CLIENT_ID/REDDIT_CLIENT_SECRET/REDDIT_USERNAME/REDDIT_PASSWORD",
            )),
        }
    }

    /// A cookie-authenticated session from the configured username and
    /// password.
    pub async fn login_client(&self) -> Result<LoginClient, ClientError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                LoginClient::login(username, password, &self.user_agent).await
            }
            _ => Err(ClientError::NotAuthenticated(
                "set REDDIT_USERNAME and REDDIT_PASSWORD",
            )),
        }
    }
}
