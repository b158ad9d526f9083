//! Raw socket HTTP/1.x backend
//!
//! Writes the request by hand over a `TcpStream` with `Connection: close`,
//! reads until the peer closes, and hands the bytes to the normalizer with
//! the header block boundary it located. Plain `http://` only.

use std::io::{BufRead, BufReader, Read};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;
use url::Url;

use super::{form, Transport};
use crate::config::Configuration;
use crate::errors::{CourierError, Result};
use crate::http::ProtocolVersion;
use crate::message::{InternalRequest, Response};
use crate::normalizer::{self, parser, RawResponse};

const NAME: &str = "socket";

#[derive(Debug, Clone, Copy, Default)]
pub struct SocketTransport;

impl SocketTransport {
    pub fn new() -> Self {
        SocketTransport
    }

    fn error(request: &InternalRequest, message: impl Into<String>) -> CourierError {
        CourierError::transport(request.url(), NAME, message)
    }

    /// Serialize the request head and body
    async fn build(request: &InternalRequest, url: &Url, config: &Configuration) -> Result<Vec<u8>> {
        let host = url
            .host_str()
            .ok_or_else(|| Self::error(request, "URL has no host"))?;
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        // Anything newer than 1.1 is spoken as 1.1 here
        let version = match request.protocol_version() {
            ProtocolVersion::Http10 => "1.0",
            _ => "1.1",
        };

        let mut head = format!("{} {} HTTP/{}\r\n", request.method(), target, version);

        if !request.headers().contains("Host") {
            match url.port() {
                Some(port) => head.push_str(&format!("Host: {}:{}\r\n", host, port)),
                None => head.push_str(&format!("Host: {}\r\n", host)),
            }
        }

        for (name, value) in request.headers().iter_flat() {
            let lower = name.to_ascii_lowercase();
            if lower == "connection" || lower == "content-length" {
                continue;
            }
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        let body = form::encode(request, config).await?;
        if let Some(body) = &body {
            if !request.headers().contains("Content-Type") {
                if let Some(content_type) = &body.content_type {
                    head.push_str(&format!("Content-Type: {}\r\n", content_type));
                }
            }
            head.push_str(&format!("Content-Length: {}\r\n", body.bytes.len()));
        }

        // The response is delimited by the peer closing the connection
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        if let Some(body) = body {
            bytes.extend_from_slice(&body.bytes);
        }
        Ok(bytes)
    }

    async fn exchange(request: &InternalRequest, config: &Configuration) -> Result<Vec<u8>> {
        let url = Url::parse(request.url())?;
        if url.scheme() != "http" {
            return Err(Self::error(
                request,
                format!("unsupported scheme \"{}\", only http is supported", url.scheme()),
            ));
        }
        let host = url
            .host_str()
            .ok_or_else(|| Self::error(request, "URL has no host"))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        let payload = Self::build(request, &url, config).await?;

        let mut stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| Self::error(request, format!("failed to connect to {}:{}: {}", host, port, e)))?;

        stream
            .write_all(&payload)
            .await
            .map_err(|e| Self::error(request, e.to_string()))?;
        stream.flush().await.map_err(|e| Self::error(request, e.to_string()))?;

        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .await
            .map_err(|e| Self::error(request, e.to_string()))?;
        Ok(data)
    }
}

/// Byte offset just past the blank line ending the header group starting at `from`
fn group_end(data: &[u8], from: usize) -> Option<usize> {
    let rest = data.get(from..)?;
    let crlf = rest.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4);
    let lf = rest.windows(2).position(|w| w == b"\n\n").map(|p| p + 2);
    let end = match (crlf, lf) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some(from + end)
}

/// Size of the header block, including any interim 1xx groups before the final one
pub(crate) fn header_size(data: &[u8]) -> Result<usize> {
    let mut start = 0;
    loop {
        let end = group_end(data, start)
            .ok_or_else(|| CourierError::Parse("response header block is not terminated".to_string()))?;
        let group = String::from_utf8_lossy(&data[start..end]);
        let first = group.lines().next().unwrap_or_default();
        let status = parser::parse_status_line(first)?;
        if (100..200).contains(&status.status_code) && end < data.len() {
            start = end;
        } else {
            return Ok(end);
        }
    }
}

/// Decode a `Transfer-Encoding: chunked` body
pub(crate) fn decode_chunked(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BufReader::new(data);
    let mut body = Vec::new();

    loop {
        let mut size_line = String::new();
        reader
            .read_line(&mut size_line)
            .map_err(|e| CourierError::Parse(format!("Failed to read chunk size: {}", e)))?;

        let size_str = size_line.trim().split(';').next().unwrap_or("0");
        if size_str.is_empty() {
            break;
        }
        let chunk_size = usize::from_str_radix(size_str, 16)
            .map_err(|_| CourierError::Parse(format!("Invalid chunk size: {}", size_str)))?;
        if chunk_size == 0 {
            break;
        }

        let mut chunk = vec![0u8; chunk_size];
        reader
            .read_exact(&mut chunk)
            .map_err(|e| CourierError::Parse(format!("Failed to read chunk: {}", e)))?;
        body.extend_from_slice(&chunk);

        let mut crlf = String::new();
        reader
            .read_line(&mut crlf)
            .map_err(|e| CourierError::Parse(format!("Failed to read chunk terminator: {}", e)))?;
        if !crlf.trim().is_empty() {
            return Err(CourierError::Parse(format!(
                "Chunk of {} bytes is not followed by CRLF",
                chunk_size
            )));
        }
    }

    Ok(body)
}

/// Split raw bytes into a [`RawResponse`], undoing chunked framing and trimming to Content-Length
pub(crate) fn to_raw_response(data: &[u8]) -> Result<RawResponse> {
    let size = header_size(data)?;
    let head = &data[..size];
    let rest = &data[size..];

    let final_headers = normalizer::headers::normalize(&String::from_utf8_lossy(head))?;

    let chunked = final_headers
        .get("Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));

    if chunked {
        return Ok(RawResponse::from_parts(head, &decode_chunked(rest)?));
    }

    match final_headers.get("Content-Length").and_then(|v| v.trim().parse::<usize>().ok()) {
        Some(length) if length < rest.len() => Ok(RawResponse::from_parts(head, &rest[..length])),
        _ => Ok(RawResponse::new(data.to_vec(), size)),
    }
}

impl Transport for SocketTransport {
    fn name(&self) -> &str {
        NAME
    }

    async fn send(&self, request: &InternalRequest, config: &Configuration) -> Result<Response> {
        trace!(method = %request.method(), url = request.url(), "socket send");

        let data = if config.timeout().is_zero() {
            Self::exchange(request, config).await?
        } else {
            tokio::time::timeout(config.timeout(), Self::exchange(request, config))
                .await
                .map_err(|_| CourierError::Timeout {
                    url: request.url().to_string(),
                    timeout: config.timeout().as_secs_f64(),
                })??
        };

        let raw = to_raw_response(&data)?;
        normalizer::normalize(&raw, request.method())
    }
}
