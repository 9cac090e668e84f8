#![warn(missing_docs)]
//! # shellbridge-request
//!
//! ## Purpose
//! Mode-aware outbound request pipeline for `shellbridge`.
//!
//! ## Responsibilities
//! - Refuse network access in offline mode with an explicit error.
//! - Build the URL from the resolved backend base plus the caller endpoint.
//! - Attach JSON headers and the session bearer token when present.
//! - Reduce every failure to a [`NormalizedError`].
//!
//! ## Data flow
//! Caller -> [`RequestPipeline::request`] -> [`TransportRequest`] ->
//! [`HttpTransport`] -> [`TransportResponse`] -> JSON value or
//! [`NormalizedError`].
//!
//! ## Concurrency
//! Each call is one independent attempt. The pipeline applies no retry,
//! queueing, or serialization between concurrent calls.
//!
//! ## Security and privacy notes
//! Request bodies and authorization headers are never logged.

mod transport;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shellbridge_core::{NormalizedError, RuntimeConfig};
use shellbridge_session::SessionStore;
use tracing::{debug, warn};

pub use transport::{
    DEFAULT_TIMEOUT_MS, HttpMethod, HttpTransport, ReqwestTransport, TransportError,
    TransportRequest, TransportResponse,
};

/// JSON media type used for both `content-type` and `accept`.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// How [`RequestPipeline::query`] treats a 401 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedBehavior {
    /// Resolve to `Ok(None)`.
    ReturnNull,
    /// Propagate the 401 as an error.
    Fail,
}

/// Outbound request pipeline bound to one runtime config and session.
#[derive(Clone)]
pub struct RequestPipeline {
    config: RuntimeConfig,
    session: SessionStore,
    transport: Arc<dyn HttpTransport>,
}

impl RequestPipeline {
    /// Creates a pipeline over the given collaborators.
    pub fn new(
        config: RuntimeConfig,
        session: SessionStore,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            session,
            transport,
        }
    }

    /// Runtime config consulted on every call.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Session handle consulted on every call.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Issues one request and returns the decoded JSON body.
    ///
    /// `body` is only attached for POST, PUT and PATCH. An empty success body
    /// decodes to `Value::Null`.
    ///
    /// # Errors
    /// Always a [`NormalizedError`]; see the crate docs for the mapping.
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, NormalizedError> {
        let response = self.execute(method, endpoint, body).await?;
        decode_success(&response)
    }

    /// Typed variant of [`RequestPipeline::request`].
    ///
    /// # Errors
    /// Body encoding failures surface as transport errors (nothing was sent);
    /// response shape mismatches surface as application errors carrying the
    /// response status.
    pub async fn request_json<B, T>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, NormalizedError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| {
                NormalizedError::transport(format!("request body encoding failed: {error}"))
            })?;
        let response = self.execute(method, endpoint, body).await?;
        let value = decode_success(&response)?;
        serde_json::from_value(value).map_err(|error| {
            debug!(%error, "response did not match expected shape");
            invalid_body(response.status)
        })
    }

    /// `GET endpoint`.
    pub async fn get(&self, endpoint: &str) -> Result<Value, NormalizedError> {
        self.request(HttpMethod::Get, endpoint, None).await
    }

    /// `POST endpoint` with a JSON body.
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, NormalizedError> {
        self.request(HttpMethod::Post, endpoint, Some(body)).await
    }

    /// `PUT endpoint` with a JSON body.
    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value, NormalizedError> {
        self.request(HttpMethod::Put, endpoint, Some(body)).await
    }

    /// `PATCH endpoint` with a JSON body.
    pub async fn patch(&self, endpoint: &str, body: Value) -> Result<Value, NormalizedError> {
        self.request(HttpMethod::Patch, endpoint, Some(body)).await
    }

    /// `DELETE endpoint`.
    pub async fn delete(&self, endpoint: &str) -> Result<Value, NormalizedError> {
        self.request(HttpMethod::Delete, endpoint, None).await
    }

    /// Read helper for client data layers.
    ///
    /// With [`UnauthorizedBehavior::ReturnNull`] a 401 resolves to
    /// `Ok(None)`; every other outcome matches [`RequestPipeline::get`].
    pub async fn query(
        &self,
        endpoint: &str,
        on_unauthorized: UnauthorizedBehavior,
    ) -> Result<Option<Value>, NormalizedError> {
        match self.get(endpoint).await {
            Ok(value) => Ok(Some(value)),
            Err(error)
                if error.status_code() == Some(401)
                    && on_unauthorized == UnauthorizedBehavior::ReturnNull =>
            {
                debug!(endpoint, "unauthorized query resolved to null");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Builds the transport request without sending it.
    ///
    /// # Errors
    /// Returns [`NormalizedError::OfflineUnavailable`] in offline mode.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<TransportRequest, NormalizedError> {
        let base_url = match self.config.backend_base_url() {
            Some(base_url) if !self.config.offline_mode() => base_url,
            _ => return Err(NormalizedError::offline()),
        };

        let mut headers = vec![
            ("content-type".to_string(), JSON_CONTENT_TYPE.to_string()),
            ("accept".to_string(), JSON_CONTENT_TYPE.to_string()),
        ];
        if let Some(token) = self.session.get_token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match body {
            Some(body) if method.carries_body() => Some(body.to_string().into_bytes()),
            _ => None,
        };

        Ok(TransportRequest {
            method,
            url: format!("{base_url}{endpoint}"),
            headers,
            body,
        })
    }

    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<TransportResponse, NormalizedError> {
        let request = match self.build_request(method, endpoint, body) {
            Ok(request) => request,
            Err(error) => {
                debug!(%method, endpoint, "request refused in offline mode");
                return Err(error);
            }
        };

        debug!(%method, endpoint, "sending request");
        let response = self.transport.send(request).await.map_err(|error| {
            warn!(%method, endpoint, %error, "request failed without response");
            NormalizedError::transport(error.0)
        })?;

        if !response.is_success() {
            let error = normalize_failure(&response);
            warn!(%method, endpoint, status = response.status, "request rejected by backend");
            return Err(error);
        }

        debug!(%method, endpoint, status = response.status, "request succeeded");
        Ok(response)
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Maps a non-success response to a [`NormalizedError`].
///
/// The body is parsed as JSON; anything unparsable counts as an empty
/// object. A non-empty string `message` field wins over the generic
/// `API Error: <status>` text.
pub fn normalize_failure(response: &TransportResponse) -> NormalizedError {
    let parsed = serde_json::from_slice::<Value>(&response.body)
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
    let message = parsed
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    NormalizedError::application(response.status, message)
}

fn decode_success(response: &TransportResponse) -> Result<Value, NormalizedError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|error| {
        debug!(%error, "success response body is not json");
        invalid_body(response.status)
    })
}

fn invalid_body(status: u16) -> NormalizedError {
    NormalizedError::application(status, Some("API Error: invalid response body".to_string()))
}
