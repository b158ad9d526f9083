//! Error types for courier

use std::sync::Arc;

use thiserror::Error;

use crate::message::{InternalRequest, Response};

/// Main error type for courier
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("An error occurred when fetching the URL \"{url}\" with the adapter \"{adapter}\" ({message})")]
    Transport {
        url: String,
        adapter: String,
        message: String,
    },

    #[error("Timeout after {timeout:.1} seconds fetching \"{url}\"")]
    Timeout { url: String, timeout: f64 },

    #[error("Too many redirects (max {max}) for \"{url}\"")]
    MaxRedirectsExceeded {
        url: String,
        max: u32,
        /// Last response obtained before the budget was hit
        response: Box<Response>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error(transparent)]
    Multi(#[from] MultiRequestError),
}

impl CourierError {
    /// Build a transport failure for `url` raised by `adapter`
    pub fn transport(url: impl Into<String>, adapter: &str, message: impl Into<String>) -> Self {
        CourierError::Transport {
            url: url.into(),
            adapter: adapter.to_string(),
            message: message.into(),
        }
    }

    /// Network-level failure surfaced by a backend, timeouts included
    pub fn is_transport(&self) -> bool {
        matches!(self, CourierError::Transport { .. } | CourierError::Timeout { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CourierError::Timeout { .. })
    }

    /// The response carried by a redirect budget failure
    pub fn response(&self) -> Option<&Response> {
        match self {
            CourierError::MaxRedirectsExceeded { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// One failed item of a batch
#[derive(Debug)]
pub struct RequestFailure {
    /// The request as submitted by the caller
    pub request: Arc<InternalRequest>,
    pub error: CourierError,
}

/// Aggregate failure of a batch send
///
/// Every submitted request is accounted for exactly once: either its response
/// is in `responses` (submission order) or it appears in `failures`.
#[derive(Error, Debug)]
#[error("{} of {} requests failed", .failures.len(), .failures.len() + .responses.len())]
pub struct MultiRequestError {
    responses: Vec<Response>,
    failures: Vec<RequestFailure>,
}

impl MultiRequestError {
    pub fn new(responses: Vec<Response>, failures: Vec<RequestFailure>) -> Self {
        Self { responses, failures }
    }

    /// Responses of the requests that succeeded, in submission order
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn failures(&self) -> &[RequestFailure] {
        &self.failures
    }

    pub fn has_responses(&self) -> bool {
        !self.responses.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Response>, Vec<RequestFailure>) {
        (self.responses, self.failures)
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;
