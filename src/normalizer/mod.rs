//! Response normalizer
//!
//! Turns a transport's byte-level output into a structured [`Response`]. The
//! transport supplies the raw bytes and the offset where the header block
//! ends; the normalizer never re-derives that boundary itself.

pub mod body;
pub mod headers;
pub mod parser;

use bytes::Bytes;

pub use parser::{parse_protocol_version, parse_reason_phrase, parse_status_code, StatusLine};

use crate::errors::{CourierError, Result};
use crate::http::Method;
use crate::message::Response;

/// Raw transport output: a header block immediately followed by the body
#[derive(Debug, Clone)]
pub struct RawResponse {
    data: Bytes,
    header_size: usize,
}

impl RawResponse {
    /// `header_size` is the byte length of the header block within `data`
    pub fn new(data: impl Into<Bytes>, header_size: usize) -> Self {
        Self {
            data: data.into(),
            header_size,
        }
    }

    /// Build from separately captured header block and body
    pub fn from_parts(head: &[u8], body: &[u8]) -> Self {
        let mut data = Vec::with_capacity(head.len() + body.len());
        data.extend_from_slice(head);
        data.extend_from_slice(body);
        Self::new(data, head.len())
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Header block bytes
    pub fn head(&self) -> Result<&[u8]> {
        self.data.get(..self.header_size).ok_or_else(|| {
            CourierError::Parse(format!(
                "header size {} exceeds response length {}",
                self.header_size,
                self.data.len()
            ))
        })
    }

    /// Body bytes following the header block
    pub fn body(&self) -> Bytes {
        if self.header_size >= self.data.len() {
            Bytes::new()
        } else {
            self.data.slice(self.header_size..)
        }
    }
}

/// Normalize raw transport output for a request sent with `method`
pub fn normalize(raw: &RawResponse, method: Method) -> Result<Response> {
    let head = std::str::from_utf8(raw.head()?)
        .map_err(|e| CourierError::Parse(format!("header block is not valid ASCII: {}", e)))?;

    let status = parser::parse(head)?;
    let headers = headers::normalize(head)?;
    let body = body::normalize(Some(raw.body()), method);

    Ok(Response::new(status.status_code)
        .with_protocol_version(status.protocol_version)
        .with_reason_phrase(status.reason_phrase)
        .with_headers(headers)
        .with_optional_body(body))
}
