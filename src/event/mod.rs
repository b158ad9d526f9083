//! Request lifecycle events
//!
//! Subscribers declare which [`EventKind`]s they care about and at what
//! priority. The [`EventDispatcher`] delivers each event to them in descending
//! priority order, ties in registration order. Instead of mutating a shared
//! event object, handlers hand back an [`Outcome`] that the dispatcher
//! threads into the next handler.

mod dispatcher;
pub mod subscriber;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use dispatcher::EventDispatcher;
pub use subscriber::{LoggerSubscriber, RedirectSubscriber, RetryStrategy, RetrySubscriber, Subscriber};

use crate::config::Configuration;
use crate::errors::{CourierError, MultiRequestError, Result};
use crate::message::{InternalRequest, Response};

/// Lifecycle points a subscriber can listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Before a request reaches the transport
    PreSend,
    /// After the transport returned a response
    PostSend,
    /// After the transport or a post-send handler failed
    Exception,
    /// Before a batch is handed to the transport
    MultiPreSend,
    /// After every request of a batch resolved
    MultiPostSend,
    /// After a batch resolved with at least one failure
    MultiException,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PreSend => "pre_send",
            EventKind::PostSend => "post_send",
            EventKind::Exception => "exception",
            EventKind::MultiPreSend => "multi_pre_send",
            EventKind::MultiPostSend => "multi_post_send",
            EventKind::MultiException => "multi_exception",
        }
    }

    pub fn all() -> [EventKind; 6] {
        [
            EventKind::PreSend,
            EventKind::PostSend,
            EventKind::Exception,
            EventKind::MultiPreSend,
            EventKind::MultiPostSend,
            EventKind::MultiException,
        ]
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a post-send or exception handler decided
#[derive(Debug)]
pub enum Outcome {
    /// Keep dispatching with this (possibly replaced) response
    Continue(Response),
    /// Final response; remaining handlers are skipped
    Resolved(Response),
    /// Drop the current response and send this request next, after `delay`
    Resend {
        request: InternalRequest,
        delay: Duration,
    },
    /// The chain failed with this error
    Failed(CourierError),
}

impl Outcome {
    /// Resend immediately
    pub fn resend(request: InternalRequest) -> Self {
        Outcome::Resend {
            request,
            delay: Duration::ZERO,
        }
    }

    /// Whether dispatch stops at this outcome
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Continue(_))
    }
}

/// The fixed set of callbacks every subscriber implements
///
/// Default methods pass everything through untouched, so a handler only
/// overrides the events it subscribed to.
pub trait EventHandler: Send + Sync {
    /// Name used for logging and removal
    fn name(&self) -> &str;

    /// `(kind, priority)` pairs this handler listens on
    fn subscribed_events(&self) -> Vec<(EventKind, i32)>;

    fn on_pre_send(&self, request: InternalRequest, _config: &Configuration) -> Result<InternalRequest> {
        Ok(request)
    }

    fn on_post_send(&self, _request: &InternalRequest, response: Response, _config: &Configuration) -> Outcome {
        Outcome::Continue(response)
    }

    fn on_exception(&self, _request: &InternalRequest, error: CourierError, _config: &Configuration) -> Outcome {
        Outcome::Failed(error)
    }

    fn on_multi_pre_send(&self, _requests: &[Arc<InternalRequest>], _config: &Configuration) {}

    fn on_multi_post_send(&self, _responses: &[Response], _config: &Configuration) {}

    fn on_multi_exception(&self, _error: &MultiRequestError, _config: &Configuration) {}
}
