//! HTTP method type and utilities

use std::fmt;
use std::str::FromStr;

use crate::errors::CourierError;

/// HTTP request method supported by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

/// All supported methods, in declaration order
pub const STANDARD_METHODS: &[Method] = &[
    Method::Get,
    Method::Head,
    Method::Post,
    Method::Put,
    Method::Patch,
    Method::Delete,
    Method::Options,
    Method::Trace,
];

impl Method {
    /// Canonical upper-case token
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }

    /// Whether a request with this method may carry a body
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Head | Method::Trace)
    }

    /// Infer HTTP method based on whether the request has data
    pub fn infer(has_data: bool) -> Self {
        if has_data {
            Method::Post
        } else {
            Method::Get
        }
    }
}

impl FromStr for Method {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STANDARD_METHODS
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CourierError::InvalidRequest(format!("Unsupported method: {}", s)))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
