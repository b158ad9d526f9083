//! Native client backend over `reqwest`

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Version};
use tracing::trace;

use super::{form, Transport};
use crate::config::{Configuration, EncodingType};
use crate::errors::{CourierError, Result};
use crate::http::{Headers, Method, ProtocolVersion};
use crate::message::{InternalRequest, Response};
use crate::normalizer::{body, headers};

const NAME: &str = "reqwest";

/// Transport backed by a shared `reqwest::Client`
///
/// Automatic redirects are disabled; the pipeline follows them itself.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .referer(false)
            .build()
            .map_err(|e| CourierError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client; it must not follow redirects on its own
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn error(&self, request: &InternalRequest, config: &Configuration, error: reqwest::Error) -> CourierError {
        if error.is_timeout() {
            CourierError::Timeout {
                url: request.url().to_string(),
                timeout: config.timeout().as_secs_f64(),
            }
        } else {
            CourierError::transport(request.url(), NAME, error.to_string())
        }
    }

    async fn multipart_form(request: &InternalRequest) -> Result<Form> {
        let mut multipart = Form::new();

        for (name, value) in form::flatten(request.data()) {
            multipart = multipart.text(name, value);
        }

        for (name, path) in form::flatten_files(request.files()) {
            let contents = tokio::fs::read(&path).await?;
            let part = Part::bytes(contents)
                .file_name(form::file_name(&path))
                .mime_str(&form::mime_type(&path))
                .map_err(|e| CourierError::Parse(format!("Invalid MIME type: {}", e)))?;
            multipart = multipart.part(name, part);
        }

        Ok(multipart)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Trace => reqwest::Method::TRACE,
    }
}

fn from_reqwest_version(version: Version) -> ProtocolVersion {
    match version {
        Version::HTTP_10 => ProtocolVersion::Http10,
        Version::HTTP_2 => ProtocolVersion::Http20,
        _ => ProtocolVersion::Http11,
    }
}

impl Transport for ReqwestTransport {
    fn name(&self) -> &str {
        NAME
    }

    async fn send(&self, request: &InternalRequest, config: &Configuration) -> Result<Response> {
        let mut builder = self.client.request(to_reqwest_method(request.method()), request.url());

        if !config.timeout().is_zero() {
            builder = builder.timeout(config.timeout());
        }

        // HTTP/2 is left to negotiation
        match request.protocol_version() {
            ProtocolVersion::Http10 => builder = builder.version(Version::HTTP_10),
            ProtocolVersion::Http11 => builder = builder.version(Version::HTTP_11),
            ProtocolVersion::Http20 => {}
        }

        for (name, value) in request.headers().iter_flat() {
            builder = builder.header(name, value);
        }

        if let Some(raw) = request.body() {
            builder = builder.body(raw.clone());
        } else if request.has_data() || request.has_files() {
            builder = match config.effective_encoding(request) {
                EncodingType::Multipart => builder.multipart(Self::multipart_form(request).await?),
                EncodingType::UrlEncoded => builder.form(&form::flatten(request.data())),
            };
        }

        trace!(method = %request.method(), url = request.url(), "reqwest send");
        let response = builder.send().await.map_err(|e| self.error(request, config, e))?;

        let status = response.status();
        let version = from_reqwest_version(response.version());
        let mut folded = Headers::new();
        for (name, value) in response.headers() {
            headers::fold(&mut folded, name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }

        let bytes = response.bytes().await.map_err(|e| self.error(request, config, e))?;

        Ok(Response::new(status.as_u16())
            .with_protocol_version(version)
            .with_reason_phrase(status.canonical_reason().unwrap_or(""))
            .with_headers(folded)
            .with_optional_body(body::normalize(Some(bytes), request.method())))
    }
}
