//! Lifecycle logging through `tracing`

use std::sync::Arc;

use tracing::Level;

use crate::config::Configuration;
use crate::errors::{CourierError, MultiRequestError};
use crate::event::{EventHandler, EventKind, Outcome};
use crate::message::{InternalRequest, Response};

/// Runs ahead of the behavioural subscribers so it sees what the transport returned
pub const LOGGER_PRIORITY: i32 = 100;

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            _ => tracing::trace!($($arg)+),
        }
    };
}

/// Observes responses and failures without changing them
#[derive(Debug, Clone)]
pub struct LoggerSubscriber {
    level: Level,
}

impl Default for LoggerSubscriber {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggerSubscriber {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl EventHandler for LoggerSubscriber {
    fn name(&self) -> &str {
        "logger"
    }

    fn subscribed_events(&self) -> Vec<(EventKind, i32)> {
        vec![
            (EventKind::PostSend, LOGGER_PRIORITY),
            (EventKind::Exception, LOGGER_PRIORITY),
            (EventKind::MultiPreSend, LOGGER_PRIORITY),
            (EventKind::MultiPostSend, LOGGER_PRIORITY),
            (EventKind::MultiException, LOGGER_PRIORITY),
        ]
    }

    fn on_post_send(&self, request: &InternalRequest, response: Response, _config: &Configuration) -> Outcome {
        log_at!(
            self.level,
            method = %request.method(),
            url = request.url(),
            status = response.status_code(),
            "response received"
        );
        Outcome::Continue(response)
    }

    fn on_exception(&self, request: &InternalRequest, error: CourierError, _config: &Configuration) -> Outcome {
        tracing::warn!(method = %request.method(), url = request.url(), error = %error, "request failed");
        Outcome::Failed(error)
    }

    fn on_multi_pre_send(&self, requests: &[Arc<InternalRequest>], _config: &Configuration) {
        log_at!(self.level, count = requests.len(), "sending batch");
    }

    fn on_multi_post_send(&self, responses: &[Response], _config: &Configuration) {
        log_at!(self.level, count = responses.len(), "batch completed");
    }

    fn on_multi_exception(&self, error: &MultiRequestError, _config: &Configuration) {
        tracing::warn!(
            succeeded = error.responses().len(),
            failed = error.failures().len(),
            "batch completed with failures"
        );
    }
}
