//! Body normalization

use bytes::Bytes;

use crate::http::Method;

/// A HEAD response never has a body, whatever the transport handed back.
/// Every other method keeps the raw buffer as-is.
pub fn normalize(body: Option<Bytes>, method: Method) -> Option<Bytes> {
    match method {
        Method::Head => None,
        _ => body,
    }
}
