//! Typed HTTP client for the auth and profile endpoints.

use crate::common::response::ApiResponse;
use crate::common::retry::Retryable;
use crate::modules::auth::dto::{AuthResponse, LoginRequest, UserResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("offline")]
    Offline,

    #[error("session storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthorized(_) => "Invalid email or password".to_string(),
            ClientError::BadRequest(message) => message.clone(),
            ClientError::Server { .. } => "The server is having trouble, please try again later".to_string(),
            ClientError::Network(_) => "Could not reach the server, check your connection".to_string(),
            ClientError::Timeout => "The server took too long to respond".to_string(),
            ClientError::Parse(_) => "Received an unexpected response from the server".to_string(),
            ClientError::Offline => "You are offline".to_string(),
            ClientError::Storage(_) => "Could not save your session on this device".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            s if s.is_server_error() => ClientError::Server {
                status: s.as_u16(),
                message,
            },
            _ => ClientError::BadRequest(message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Server { .. } | ClientError::Network(_) | ClientError::Timeout | ClientError::Parse(_)
        )
    }
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError>;

    async fn profile(&self, token: &str) -> Result<UserResponse, ClientError>;

    /// Exchanges a possibly expired token for a new one.
    async fn refresh(&self, token: &str) -> Result<AuthResponse, ClientError>;

    async fn logout(&self, token: &str) -> Result<(), ClientError>;
}

/// [`AuthApi`] over HTTP; decodes the `{status, message, data}` envelope.
#[derive(Clone)]
pub struct HttpAuthApi {
    base_url: String,
    client: Client,
}

impl HttpAuthApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        decode_envelope(status, &body)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Maps a response to its payload or a typed error.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ClientError> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(body)
            .map(|envelope| envelope.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
        debug!("Request failed with {}: {}", status, message);
        return Err(ClientError::from_status(status, message));
    }

    let envelope: ApiResponse<T> =
        serde_json::from_slice(body).map_err(|e| ClientError::Parse(e.to_string()))?;
    if !envelope.is_success() {
        return Err(ClientError::BadRequest(envelope.message));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Parse("response has no data".to_string()))
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/auth/login", None).json(credentials))
            .await
    }

    async fn profile(&self, token: &str) -> Result<UserResponse, ClientError> {
        self.send(self.request(Method::GET, "/profile", Some(token))).await
    }

    async fn refresh(&self, token: &str) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/auth/refresh", Some(token))).await
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let resp = self.request(Method::POST, "/auth/logout", Some(token)).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.bytes().await?;
        decode_envelope::<serde_json::Value>(status, &body).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_are_classified() {
        let body = br#"{"status":"error","message":"Token expired","data":null}"#;
        let err = decode_envelope::<UserResponse>(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert_eq!(err, ClientError::Unauthorized("Token expired".into()));
        assert!(!err.is_retryable());

        let err = decode_envelope::<UserResponse>(StatusCode::BAD_GATEWAY, b"<html>").unwrap_err();
        assert_eq!(
            err,
            ClientError::Server {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
        assert!(err.is_retryable());

        let body = br#"{"status":"error","message":"Invalid email address","data":null}"#;
        let err = decode_envelope::<UserResponse>(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(err.user_message(), "Invalid email address");
    }

    #[test]
    fn success_without_payload_is_a_parse_error() {
        let body = br#"{"status":"success","message":"ok","data":null}"#;
        let err = decode_envelope::<UserResponse>(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
        assert!(err.is_retryable());

        let err = decode_envelope::<UserResponse>(StatusCode::OK, b"{").unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[test]
    fn success_envelope_yields_data() {
        let body = br#"{"status":"success","message":"ok","data":{"value":1}}"#;
        let data: serde_json::Value = decode_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(data["value"], 1);
    }

    #[test]
    fn urls_are_rooted_at_api() {
        let api = HttpAuthApi::new("http://localhost:3000/").unwrap();
        assert_eq!(api.url("/profile"), "http://localhost:3000/api/profile");
    }
}
