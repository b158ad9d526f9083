//! Status line parsing
//!
//! A raw header block may hold several stacked `status line + headers` groups
//! when a transport followed redirects itself. Only the last group counts.

use winnow::ascii::{digit1, space1};
use winnow::combinator::{opt, preceded};
use winnow::prelude::*;
use winnow::token::take_while;
use winnow::ModalResult;

use crate::errors::{CourierError, Result};
use crate::http::ProtocolVersion;

/// Parsed final status line of a header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub protocol_version: ProtocolVersion,
    pub status_code: u16,
    pub reason_phrase: String,
}

/// Split a header block into lines, accepting CRLF or bare LF
pub(crate) fn lines(head: &str) -> impl Iterator<Item = &str> {
    head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Lines of the final group: its status line followed by its header lines
pub(crate) fn final_group(head: &str) -> Result<(&str, Vec<&str>)> {
    let all: Vec<&str> = lines(head).collect();
    let start = all
        .iter()
        .rposition(|line| line.starts_with("HTTP/"))
        .ok_or_else(|| CourierError::Parse("no status line found in header block".to_string()))?;

    let headers = all[start + 1..]
        .iter()
        .copied()
        .take_while(|line| !line.trim().is_empty())
        .collect();

    Ok((all[start], headers))
}

/// Parse `HTTP/<major>[.<minor>]` into its two numbers
fn parse_version(input: &mut &str) -> ModalResult<(u8, u8)> {
    (
        "HTTP/",
        digit1.try_map(str::parse::<u8>),
        opt(preceded('.', digit1.try_map(str::parse::<u8>))),
    )
        .map(|(_, major, minor)| (major, minor.unwrap_or(0)))
        .parse_next(input)
}

/// Parse the three-digit code following the protocol token
fn parse_code(input: &mut &str) -> ModalResult<u16> {
    preceded(
        space1,
        take_while(3, |c: char| c.is_ascii_digit()).try_map(str::parse::<u16>),
    )
    .parse_next(input)
}

/// Parse a single status line such as `HTTP/1.1 404 Not Found`
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let mut input = line.trim_end();

    let (major, minor) = parse_version(&mut input)
        .map_err(|e| CourierError::Parse(format!("Invalid protocol version in \"{}\": {}", line, e)))?;
    let protocol_version = ProtocolVersion::from_parts(major, minor).ok_or_else(|| {
        CourierError::Parse(format!("Unsupported protocol version {}.{}", major, minor))
    })?;

    let status_code = parse_code(&mut input)
        .map_err(|e| CourierError::Parse(format!("Invalid status code in \"{}\": {}", line, e)))?;

    // The code must stand alone: "HTTP/1.1 2000" is not a status line
    if !input.is_empty() && !input.starts_with([' ', '\t']) {
        return Err(CourierError::Parse(format!("Invalid status code in \"{}\"", line)));
    }

    Ok(StatusLine {
        protocol_version,
        status_code,
        reason_phrase: input.trim().to_string(),
    })
}

/// Parse the final status line of a raw header block
pub fn parse(head: &str) -> Result<StatusLine> {
    let (status_line, _) = final_group(head)?;
    parse_status_line(status_line)
}

/// Protocol version of the final status line
pub fn parse_protocol_version(head: &str) -> Result<ProtocolVersion> {
    parse(head).map(|s| s.protocol_version)
}

/// Status code of the final status line
pub fn parse_status_code(head: &str) -> Result<u16> {
    parse(head).map(|s| s.status_code)
}

/// Reason phrase of the final status line
pub fn parse_reason_phrase(head: &str) -> Result<String> {
    parse(head).map(|s| s.reason_phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_status_line() {
        let status = parse_status_line("HTTP/1.1 200 OK").unwrap();
        assert_eq!(status.protocol_version, ProtocolVersion::Http11);
        assert_eq!(status.status_code, 200);
        assert_eq!(status.reason_phrase, "OK");
    }

    #[test]
    fn test_multi_word_reason() {
        let status = parse_status_line("HTTP/1.0 500 Internal Server Error").unwrap();
        assert_eq!(status.protocol_version, ProtocolVersion::Http10);
        assert_eq!(status.reason_phrase, "Internal Server Error");
    }

    #[test]
    fn test_http2_without_minor_and_reason() {
        let status = parse_status_line("HTTP/2 204").unwrap();
        assert_eq!(status.protocol_version, ProtocolVersion::Http20);
        assert_eq!(status.status_code, 204);
        assert_eq!(status.reason_phrase, "");
    }

    #[test]
    fn test_last_group_is_authoritative() {
        let head = "HTTP/1.0 302 Found\r\nLocation: /b\r\n\r\nHTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n";
        assert_eq!(parse_protocol_version(head).unwrap(), ProtocolVersion::Http11);
        assert_eq!(parse_status_code(head).unwrap(), 200);
        assert_eq!(parse_reason_phrase(head).unwrap(), "OK");
    }

    #[test]
    fn test_lf_only_block() {
        let head = "HTTP/1.1 404 Not Found\nServer: test\n\n";
        assert_eq!(parse_status_code(head).unwrap(), 404);
    }

    #[test]
    fn test_malformed_blocks_are_errors() {
        assert!(matches!(parse(""), Err(CourierError::Parse(_))));
        assert!(parse("Content-Type: text/plain\r\n\r\n").is_err());
        assert!(parse_status_line("HTTP/1.1 OK").is_err());
        assert!(parse_status_line("HTTP/1.1 2000 OK").is_err());
        assert!(parse_status_line("HTTP/x.1 200 OK").is_err());
        assert!(parse_status_line("HTTP/3.0 200 OK").is_err());
    }

    #[test]
    fn test_final_group_headers() {
        let head = "HTTP/1.1 301 Moved\r\nLocation: /x\r\n\r\nHTTP/1.1 200 OK\r\nA: 1\r\nB: 2\r\n\r\n";
        let (status, headers) = final_group(head).unwrap();
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(headers, vec!["A: 1", "B: 2"]);
    }
}
