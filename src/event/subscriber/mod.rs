//! Event subscribers
//!
//! Built-in behaviours are enum variants rather than trait objects; the
//! `Custom` variant keeps the bus open for handlers defined elsewhere. Every
//! variant implements the same [`EventHandler`] method set.

mod logger;
mod redirect;
mod retry;

use std::fmt;
use std::sync::Arc;

pub use logger::LoggerSubscriber;
pub use redirect::RedirectSubscriber;
pub use retry::{RetryStrategy, RetrySubscriber};

use super::{EventHandler, EventKind, Outcome};
use crate::config::Configuration;
use crate::errors::{CourierError, MultiRequestError, Result};
use crate::message::{InternalRequest, Response};

/// A registered subscriber
#[derive(Clone)]
pub enum Subscriber {
    /// Follows `Location` responses
    Redirect(RedirectSubscriber),
    /// Re-issues requests after transport failures
    Retry(RetrySubscriber),
    /// Logs lifecycle events through `tracing`
    Logger(LoggerSubscriber),
    /// Any other handler
    Custom(Arc<dyn EventHandler>),
}

impl Subscriber {
    pub fn redirect() -> Self {
        Subscriber::Redirect(RedirectSubscriber::default())
    }

    pub fn retry(limit: u32, strategy: RetryStrategy) -> Self {
        Subscriber::Retry(RetrySubscriber::new(limit, strategy))
    }

    pub fn logger() -> Self {
        Subscriber::Logger(LoggerSubscriber::default())
    }

    pub fn custom(handler: impl EventHandler + 'static) -> Self {
        Subscriber::Custom(Arc::new(handler))
    }

    fn handler(&self) -> &dyn EventHandler {
        match self {
            Subscriber::Redirect(s) => s,
            Subscriber::Retry(s) => s,
            Subscriber::Logger(s) => s,
            Subscriber::Custom(s) => s.as_ref(),
        }
    }

    pub fn name(&self) -> &str {
        self.handler().name()
    }

    pub fn subscribed_events(&self) -> Vec<(EventKind, i32)> {
        self.handler().subscribed_events()
    }

    pub fn on_pre_send(&self, request: InternalRequest, config: &Configuration) -> Result<InternalRequest> {
        self.handler().on_pre_send(request, config)
    }

    pub fn on_post_send(&self, request: &InternalRequest, response: Response, config: &Configuration) -> Outcome {
        self.handler().on_post_send(request, response, config)
    }

    pub fn on_exception(&self, request: &InternalRequest, error: CourierError, config: &Configuration) -> Outcome {
        self.handler().on_exception(request, error, config)
    }

    pub fn on_multi_pre_send(&self, requests: &[Arc<InternalRequest>], config: &Configuration) {
        self.handler().on_multi_pre_send(requests, config)
    }

    pub fn on_multi_post_send(&self, responses: &[Response], config: &Configuration) {
        self.handler().on_multi_post_send(responses, config)
    }

    pub fn on_multi_exception(&self, error: &MultiRequestError, config: &Configuration) {
        self.handler().on_multi_exception(error, config)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscriber::Redirect(s) => f.debug_tuple("Redirect").field(s).finish(),
            Subscriber::Retry(s) => f.debug_tuple("Retry").field(s).finish(),
            Subscriber::Logger(s) => f.debug_tuple("Logger").field(s).finish(),
            Subscriber::Custom(s) => f.debug_tuple("Custom").field(&s.name()).finish(),
        }
    }
}

impl From<RedirectSubscriber> for Subscriber {
    fn from(subscriber: RedirectSubscriber) -> Self {
        Subscriber::Redirect(subscriber)
    }
}

impl From<RetrySubscriber> for Subscriber {
    fn from(subscriber: RetrySubscriber) -> Self {
        Subscriber::Retry(subscriber)
    }
}

impl From<LoggerSubscriber> for Subscriber {
    fn from(subscriber: LoggerSubscriber) -> Self {
        Subscriber::Logger(subscriber)
    }
}

impl From<Arc<dyn EventHandler>> for Subscriber {
    fn from(handler: Arc<dyn EventHandler>) -> Self {
        Subscriber::Custom(handler)
    }
}
