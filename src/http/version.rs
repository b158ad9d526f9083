//! HTTP protocol version

use std::fmt;
use std::str::FromStr;

use crate::errors::CourierError;

/// Protocol version carried by requests and responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVersion {
    Http10,
    #[default]
    Http11,
    Http20,
}

impl ProtocolVersion {
    /// Version number without the `HTTP/` prefix, e.g. `1.1`
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::Http10 => "1.0",
            ProtocolVersion::Http11 => "1.1",
            ProtocolVersion::Http20 => "2.0",
        }
    }

    /// Build from a parsed `major.minor` pair
    pub fn from_parts(major: u8, minor: u8) -> Option<Self> {
        match (major, minor) {
            (1, 0) => Some(ProtocolVersion::Http10),
            (1, 1) => Some(ProtocolVersion::Http11),
            (2, _) => Some(ProtocolVersion::Http20),
            _ => None,
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = s.trim();
        let version = version.strip_prefix("HTTP/").unwrap_or(version);
        match version {
            "1.0" => Ok(ProtocolVersion::Http10),
            "1.1" => Ok(ProtocolVersion::Http11),
            "2" | "2.0" => Ok(ProtocolVersion::Http20),
            other => Err(CourierError::Parse(format!("Unsupported protocol version: {}", other))),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
