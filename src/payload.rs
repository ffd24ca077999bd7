//! Request body extraction.
//!
//! Axum's `Json` extractor rejects bodies with its own status codes and plain-text
//! messages, and it runs before the handler can look at the path. [`Payload`] instead
//! reads the raw bytes and never fails on content: the resource validators decide what
//! an unusable body means, after the identifier in the path has been checked.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde_json::{Map, Value};

use crate::ApiError;

/// A request body parsed leniently as JSON.
///
/// - an empty (or whitespace-only) body becomes `{}`
/// - a body that is not valid JSON becomes `null`, which no validator accepts as an object
/// - anything else is the parsed value
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Value);

impl Payload {
    /// Parses raw body bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Payload(Value::Object(Map::new()));
        }
        Payload(serde_json::from_slice(bytes).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "failed to read request body");
            ApiError::BadRequest("Request body could not be read.".to_string())
        })?;
        Ok(Payload::from_bytes(&bytes))
    }
}
