//! Request value objects
//!
//! [`Request`] is the caller-facing message. [`InternalRequest`] is what flows
//! through the pipeline: the request plus structured form data, file uploads
//! and a parameter bag. Both are changed only through consuming `with_*`
//! methods that return a modified copy.

use std::path::PathBuf;

use bytes::Bytes;
use indexmap::IndexMap;

use super::parameters::{Parameter, Parameters};
use crate::errors::{CourierError, Result};
use crate::http::{Headers, Method, ProtocolVersion};

/// Structured form field value of arbitrary depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    List(Vec<FormValue>),
    Map(IndexMap<String, FormValue>),
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

/// Form data keyed by field name, insertion ordered
pub type FormData = IndexMap<String, FormValue>;

/// File upload descriptor: a path or a nested collection of paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileValue {
    Path(PathBuf),
    List(Vec<FileValue>),
    Map(IndexMap<String, FileValue>),
}

impl From<&str> for FileValue {
    fn from(value: &str) -> Self {
        FileValue::Path(PathBuf::from(value))
    }
}

impl From<PathBuf> for FileValue {
    fn from(value: PathBuf) -> Self {
        FileValue::Path(value)
    }
}

/// File uploads keyed by field name
pub type FileData = IndexMap<String, FileValue>;

/// HTTP request message
#[derive(Debug, Clone)]
pub struct Request {
    url: String,
    method: Method,
    protocol_version: ProtocolVersion,
    headers: Headers,
    body: Option<Bytes>,
}

impl Request {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            protocol_version: ProtocolVersion::default(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
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

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
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

    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }
}

/// Request as it travels through the pipeline
#[derive(Debug, Clone)]
pub struct InternalRequest {
    request: Request,
    data: FormData,
    files: FileData,
    parameters: Parameters,
}

impl InternalRequest {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self::from_request(Request::new(url, method))
    }

    pub fn from_request(request: Request) -> Self {
        Self {
            request,
            data: FormData::new(),
            files: FileData::new(),
            parameters: Parameters::new(),
        }
    }

    /// Assemble a request, rejecting a raw body combined with data or files
    pub fn from_parts(request: Request, data: FormData, files: FileData) -> Result<Self> {
        let internal = Self {
            request,
            data,
            files,
            parameters: Parameters::new(),
        };
        internal.validate()?;
        Ok(internal)
    }

    /// Check that a raw body and structured data/files are not both present
    pub fn validate(&self) -> Result<()> {
        if self.request.has_body() && (self.has_data() || self.has_files()) {
            return Err(CourierError::InvalidRequest(format!(
                "request to \"{}\" has both a raw body and form data or files",
                self.request.url()
            )));
        }
        Ok(())
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn url(&self) -> &str {
        self.request.url()
    }

    pub fn method(&self) -> Method {
        self.request.method()
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.request.protocol_version()
    }

    pub fn headers(&self) -> &Headers {
        self.request.headers()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.request.body()
    }

    pub fn has_body(&self) -> bool {
        self.request.has_body()
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn files(&self) -> &FileData {
        &self.files
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Any payload at all: raw body, form data or files
    pub fn has_payload(&self) -> bool {
        self.has_body() || self.has_data() || self.has_files()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.request = self.request.with_url(url);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.request = self.request.with_method(method);
        self
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.request = self.request.with_protocol_version(version);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_header(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.request = self.request.with_headers(headers);
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.request = self.request.without_header(name);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.request = self.request.with_body(body);
        self
    }

    pub fn with_data(mut self, data: FormData) -> Self {
        self.data = data;
        self
    }

    pub fn with_files(mut self, files: FileData) -> Self {
        self.files = files;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Parameter) -> Self {
        self.parameters.set(name, value);
        self
    }

    pub fn without_parameter(mut self, name: &str) -> Self {
        self.parameters.remove(name);
        self
    }

    /// Drop every payload (raw body, data and files) and the headers that describe it
    pub fn without_payload(mut self) -> Self {
        self.request = self
            .request
            .without_body()
            .without_header("Content-Type")
            .without_header("Content-Length");
        self.data.clear();
        self.files.clear();
        self
    }
}

impl From<Request> for InternalRequest {
    fn from(request: Request) -> Self {
        InternalRequest::from_request(request)
    }
}
