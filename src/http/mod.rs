//! HTTP protocol types and constants
//!
//! Methods, protocol versions, and the case-insensitive header map shared by
//! requests and responses.

mod headers;
mod method;
mod version;

pub use headers::{is_list_valued, Headers, LIST_VALUED_HEADERS};
pub use method::{Method, STANDARD_METHODS};
pub use version::ProtocolVersion;

/// Status codes the redirect resolver follows
pub const REDIRECT_STATUS_CODES: &[u16] = &[301, 302, 303, 307, 308];
