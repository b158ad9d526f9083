//! Request orchestration pipeline
//!
//! Every request, single or batched, goes through the same steps:
//!
//! 1. **prepare**: validate, add default headers, run pre-send subscribers
//! 2. **transmit**: hand the request to the transport under the timeout
//! 3. **settle**: run post-send subscribers on the response, or exception
//!    subscribers on the error
//!
//! A subscriber may answer with [`Outcome::Resend`] (a redirect hop or a
//! retry). The pipeline then loops back to step 1 with the new request, so a
//! redirect chain is an iteration, never a recursion.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::config::Configuration;
use crate::errors::{CourierError, Result};
use crate::event::{EventDispatcher, Outcome, RedirectSubscriber, Subscriber};
use crate::http::{Headers, Method};
use crate::message::{FileData, FormData, InternalRequest, Request, Response};
use crate::multi;
use crate::transport::{self, Transport};

/// Body argument of the convenience verbs
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Raw bytes sent as-is
    Raw(Bytes),
    /// Structured form data, encoded per configuration
    Form(FormData),
    /// Form data plus file uploads, always multipart
    Files(FormData, FileData),
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Raw(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Raw(Bytes::from(value))
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Raw(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Raw(Bytes::from(value))
    }
}

impl From<FormData> for Payload {
    fn from(value: FormData) -> Self {
        Payload::Form(value)
    }
}

/// Transport-agnostic HTTP client
///
/// Cloning is cheap; clones share the transport, configuration snapshot and
/// subscriber table.
pub struct HttpAdapter<T: Transport> {
    transport: Arc<T>,
    config: Arc<Configuration>,
    dispatcher: Arc<EventDispatcher>,
}

impl<T: Transport> Clone for HttpAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<T: Transport> HttpAdapter<T> {
    /// Adapter over `transport` with default configuration and redirect following
    pub fn new(transport: T) -> Self {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(RedirectSubscriber::default());

        Self {
            transport: Arc::new(transport),
            config: Arc::new(Configuration::default()),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Adapter with no subscribers at all, not even redirect following
    pub fn bare(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(Configuration::default()),
            dispatcher: Arc::new(EventDispatcher::new()),
        }
    }

    pub fn with_configuration(mut self, config: Configuration) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_subscriber(mut self, subscriber: impl Into<Subscriber>) -> Self {
        Arc::make_mut(&mut self.dispatcher).subscribe(subscriber);
        self
    }

    /// Remove the subscriber called `name`, e.g. `"redirect"`
    pub fn without_subscriber(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.dispatcher).unsubscribe(name);
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn name(&self) -> &str {
        self.transport.name()
    }

    pub async fn get(&self, url: &str, headers: Headers) -> Result<Response> {
        self.send_verb(url, Method::Get, headers, Payload::Empty).await
    }

    pub async fn head(&self, url: &str, headers: Headers) -> Result<Response> {
        self.send_verb(url, Method::Head, headers, Payload::Empty).await
    }

    pub async fn trace(&self, url: &str, headers: Headers) -> Result<Response> {
        self.send_verb(url, Method::Trace, headers, Payload::Empty).await
    }

    pub async fn post(&self, url: &str, headers: Headers, payload: impl Into<Payload>) -> Result<Response> {
        self.send_verb(url, Method::Post, headers, payload.into()).await
    }

    pub async fn put(&self, url: &str, headers: Headers, payload: impl Into<Payload>) -> Result<Response> {
        self.send_verb(url, Method::Put, headers, payload.into()).await
    }

    pub async fn patch(&self, url: &str, headers: Headers, payload: impl Into<Payload>) -> Result<Response> {
        self.send_verb(url, Method::Patch, headers, payload.into()).await
    }

    pub async fn delete(&self, url: &str, headers: Headers, payload: impl Into<Payload>) -> Result<Response> {
        self.send_verb(url, Method::Delete, headers, payload.into()).await
    }

    pub async fn options(&self, url: &str, headers: Headers, payload: impl Into<Payload>) -> Result<Response> {
        self.send_verb(url, Method::Options, headers, payload.into()).await
    }

    /// Send with structured form data and file uploads
    pub async fn send(
        &self,
        url: &str,
        method: Method,
        headers: Headers,
        data: FormData,
        files: FileData,
    ) -> Result<Response> {
        let request = self.build(url, method, headers).with_data(data).with_files(files);
        self.send_internal_request(request).await
    }

    pub async fn send_request(&self, request: Request) -> Result<Response> {
        self.send_internal_request(InternalRequest::from_request(request)).await
    }

    /// Run one request through the pipeline until it resolves
    ///
    /// The returned response's `request` parameter is the request passed in.
    pub async fn send_internal_request(&self, request: InternalRequest) -> Result<Response> {
        let root = Arc::new(request);
        let mut pending = (*root).clone();

        loop {
            let outcome = match self.prepare(pending) {
                Ok(prepared) => {
                    let result = self.transmit(&prepared).await;
                    self.settle(&prepared, result)
                }
                Err(outcome) => outcome,
            };

            match outcome {
                Outcome::Continue(response) | Outcome::Resolved(response) => {
                    return Ok(self.finish(response, &root));
                }
                Outcome::Failed(error) => return Err(error),
                Outcome::Resend { request, delay } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    pending = request;
                }
            }
        }
    }

    /// Send a batch concurrently
    ///
    /// Returns every response in submission order, or [`CourierError::Multi`]
    /// carrying the successes and one failure per failed request.
    pub async fn send_requests(&self, requests: Vec<InternalRequest>) -> Result<Vec<Response>> {
        multi::execute(self, requests).await.map_err(CourierError::from)
    }

    fn build(&self, url: &str, method: Method, headers: Headers) -> InternalRequest {
        InternalRequest::new(url, method)
            .with_protocol_version(self.config.protocol_version())
            .with_headers(headers)
    }

    async fn send_verb(&self, url: &str, method: Method, headers: Headers, payload: Payload) -> Result<Response> {
        let request = self.build(url, method, headers);
        let request = match payload {
            Payload::Empty => request,
            Payload::Raw(body) => request.with_body(body),
            Payload::Form(data) => request.with_data(data),
            Payload::Files(data, files) => request.with_data(data).with_files(files),
        };
        self.send_internal_request(request).await
    }

    fn with_default_headers(&self, request: InternalRequest) -> InternalRequest {
        let mut request = request;
        if !request.headers().contains("User-Agent") {
            request = request.with_header("User-Agent", self.config.user_agent());
        }
        if !request.headers().contains("Connection") {
            let connection = if self.config.keep_alive() { "keep-alive" } else { "close" };
            request = request.with_header("Connection", connection);
        }
        request
    }

    /// Validate, add defaults and run pre-send subscribers
    ///
    /// A failure is routed through the exception subscribers, which may still
    /// recover or ask for a resend.
    pub(crate) fn prepare(&self, request: InternalRequest) -> std::result::Result<InternalRequest, Outcome> {
        let snapshot = request.clone();
        request
            .validate()
            .and_then(|()| self.dispatcher.pre_send(self.with_default_headers(request), &self.config))
            .map_err(|error| self.dispatcher.exception(&snapshot, error, &self.config))
    }

    async fn transmit(&self, request: &InternalRequest) -> Result<Response> {
        debug!(
            adapter = self.transport.name(),
            method = %request.method(),
            url = request.url(),
            "sending request"
        );
        transport::send_with_timeout(self.transport.as_ref(), request, &self.config).await
    }

    /// Run post-send or exception subscribers over a transport result
    pub(crate) fn settle(&self, request: &InternalRequest, result: Result<Response>) -> Outcome {
        let outcome = match result {
            Ok(response) => self.dispatcher.post_send(request, response, &self.config),
            Err(error) => Outcome::Failed(error),
        };

        match outcome {
            Outcome::Failed(error) => self.dispatcher.exception(request, error, &self.config),
            other => other,
        }
    }

    /// Attribute a final response to the caller's request
    pub(crate) fn finish(&self, response: Response, root: &Arc<InternalRequest>) -> Response {
        let response = if response.effective_url().is_none() {
            let url = root.url().to_string();
            response.with_effective_url(url)
        } else {
            response
        };
        response.with_request(Arc::clone(root))
    }
}
