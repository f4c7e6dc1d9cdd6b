use std::fmt;

use reqwest::{Error as ReqwestError, StatusCode};
use serde_json::Value;

pub mod anonymous;
pub mod login;
pub mod oauth;

pub use anonymous::AnonymousClient;
pub use login::LoginClient;
pub use oauth::OauthClient;

/// User agent sent when the caller does not provide one. The service
/// rate-limits generic agents aggressively, so callers should set their own.
pub const DEFAULT_USER_AGENT: &str = "orangered/0.1 (reddit API client library)";

/// Errors surfaced by any client operation.
#[derive(Debug)]
pub enum ClientError {
    /// Network-level failure from the HTTP transport.
    Request(ReqwestError),
    /// The service answered with a non-success HTTP status.
    Status(StatusCode),
    /// The response body was not the JSON structure the operation expects.
    Parse(serde_json::Error),
    /// The service reported errors in its JSON envelope; the messages are
    /// joined into one string.
    Api(String),
    /// An authenticated operation was attempted without a session.
    NotAuthenticated(&'static str),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Request(err) => write!(f, "request error: {}", err),
            ClientError::Status(status) => write!(f, "unexpected HTTP status: {}", status),
            ClientError::Parse(err) => write!(f, "parse error: {}", err),
            ClientError::Api(msg) => write!(f, "API error: {}", msg),
            ClientError::NotAuthenticated(msg) => write!(f, "not authenticated: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ReqwestError> for ClientError {
    fn from(err: ReqwestError) -> Self {
        ClientError::Request(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err)
    }
}

pub(crate) fn http_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .expect("failed to build HTTP client")
}

/// Checks the HTTP status and decodes the body as JSON.
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status));
    }
    let body = response.text().await?;
    let value = serde_json::from_str(&body)?;
    Ok(value)
}

/// Surfaces the `errors` array mutating endpoints return inside their
/// envelope (either `{"json": {"errors": [...]}}` or top-level). Each entry
/// is a `[code, message, field]` triple; the messages are joined with ", ".
pub(crate) fn check_api_errors(value: &Value) -> Result<(), ClientError> {
    let errors = value
        .get("json")
        .and_then(|json| json.get("errors"))
        .or_else(|| value.get("errors"));

    if let Some(Value::Array(errors)) = errors {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|entry| match entry {
                    Value::Array(parts) if parts.len() > 1 => {
                        parts[1].as_str().unwrap_or_default().to_string()
                    }
                    other => other.to_string(),
                })
                .collect();
            return Err(ClientError::Api(messages.join(", ")));
        }
    }
    Ok(())
}

/// Encodes query pairs, returning an empty string for an empty set.
pub(crate) fn encode_query(pairs: &[(&'static str, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_errors_are_joined() {
        let value = json!({"json": {"errors": [
            ["WRONG_PASSWORD", "invalid password", "passwd"],
            ["RATELIMIT", "you are doing that too much", null],
        ]}});
        let err = check_api_errors(&value).unwrap_err();
        match err {
            ClientError::Api(msg) => {
                assert_eq!(msg, "invalid password, you are doing that too much")
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn empty_or_absent_errors_pass() {
        assert!(check_api_errors(&json!({"json": {"errors": []}})).is_ok());
        assert!(check_api_errors(&json!({})).is_ok());
        assert!(check_api_errors(&json!({"json": {"data": {}}})).is_ok());
    }

    #[test]
    fn top_level_errors_are_also_checked() {
        let value = json!({"errors": [["BAD_CAPTCHA", "care to try these again?", "captcha"]]});
        assert!(check_api_errors(&value).is_err());
    }
}
