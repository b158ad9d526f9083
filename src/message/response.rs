//! Response value object

use std::sync::Arc;

use bytes::Bytes;

use super::parameters::{Parameter, Parameters, EFFECTIVE_URL, REDIRECT_COUNT, REQUEST};
use super::InternalRequest;
use crate::http::{Headers, ProtocolVersion};

/// HTTP response message
#[derive(Debug, Clone)]
pub struct Response {
    protocol_version: ProtocolVersion,
    status_code: u16,
    reason_phrase: String,
    headers: Headers,
    body: Option<Bytes>,
    parameters: Parameters,
}

impl Response {
    pub fn new(status_code: u16) -> Self {
        Self {
            protocol_version: ProtocolVersion::default(),
            status_code,
            reason_phrase: String::new(),
            headers: Headers::new(),
            body: None,
            parameters: Parameters::new(),
        }
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Body decoded as UTF-8, lossy
    pub fn text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn effective_url(&self) -> Option<&str> {
        self.parameters.effective_url()
    }

    pub fn redirect_count(&self) -> Option<u32> {
        self.parameters.redirect_count()
    }

    /// The request this response is attributed to
    pub fn request(&self) -> Option<&Arc<InternalRequest>> {
        self.parameters.request(REQUEST)
    }

    pub fn is_redirect(&self) -> bool {
        crate::http::REDIRECT_STATUS_CODES.contains(&self.status_code)
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    pub fn with_status(mut self, status_code: u16, reason_phrase: impl Into<String>) -> Self {
        self.status_code = status_code;
        self.reason_phrase = reason_phrase.into();
        self
    }

    pub fn with_reason_phrase(mut self, reason_phrase: impl Into<String>) -> Self {
        self.reason_phrase = reason_phrase.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_optional_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Parameter) -> Self {
        self.parameters.set(name, value);
        self
    }

    pub fn with_effective_url(self, url: impl Into<String>) -> Self {
        self.with_parameter(EFFECTIVE_URL, Parameter::Text(url.into()))
    }

    pub fn with_redirect_count(self, count: u32) -> Self {
        self.with_parameter(REDIRECT_COUNT, Parameter::Count(count))
    }

    pub fn with_request(self, request: Arc<InternalRequest>) -> Self {
        self.with_parameter(REQUEST, Parameter::Request(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn test_builder_and_accessors() {
        let response = Response::new(200)
            .with_reason_phrase("OK")
            .with_header("Content-Type", "text/plain")
            .with_body("ok");

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.reason_phrase(), "OK");
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.text(), "ok");
        assert!(!response.is_redirect());
    }

    #[test]
    fn test_request_attribution_is_by_identity() {
        let request = Arc::new(InternalRequest::new("http://example.com", Method::Get));
        let twin = Arc::new(InternalRequest::new("http://example.com", Method::Get));
        let response = Response::new(200).with_request(Arc::clone(&request));

        assert!(Arc::ptr_eq(response.request().unwrap(), &request));
        assert!(!Arc::ptr_eq(response.request().unwrap(), &twin));
    }

    #[test]
    fn test_no_body_by_default() {
        let response = Response::new(204);
        assert!(!response.has_body());
        assert_eq!(response.text(), "");
    }
}
