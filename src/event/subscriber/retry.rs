//! Retry after transport failures

use std::time::Duration;

use tracing::info;

use crate::config::Configuration;
use crate::errors::CourierError;
use crate::event::{EventHandler, EventKind, Outcome};
use crate::message::parameters::RETRY_COUNT;
use crate::message::{InternalRequest, Parameter};

pub const RETRY_PRIORITY: i32 = 0;

/// Upper bound on any computed delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// How the wait before attempt `n` grows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Same delay every time
    Constant(Duration),
    /// `base * n`
    Linear(Duration),
    /// `base * 2^(n-1)`
    Exponential(Duration),
}

impl RetryStrategy {
    /// Delay before retry number `attempt` (1-based), capped at `max`
    pub fn delay(&self, attempt: u32, max: Duration) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let delay = match *self {
            RetryStrategy::Constant(base) => base,
            RetryStrategy::Linear(base) => base.saturating_mul(attempt),
            RetryStrategy::Exponential(base) => base.saturating_mul(2u32.saturating_pow(attempt - 1)),
        };
        delay.min(max)
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::Exponential(Duration::from_millis(100))
    }
}

/// Resends a request when the transport failed, up to `limit` times
///
/// Only network-level failures qualify; budget, validation and parse errors
/// would fail the same way again.
#[derive(Debug, Clone)]
pub struct RetrySubscriber {
    limit: u32,
    strategy: RetryStrategy,
    max_delay: Duration,
}

impl Default for RetrySubscriber {
    fn default() -> Self {
        Self::new(3, RetryStrategy::default())
    }
}

impl RetrySubscriber {
    pub fn new(limit: u32, strategy: RetryStrategy) -> Self {
        Self {
            limit,
            strategy,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn strategy(&self) -> RetryStrategy {
        self.strategy
    }

    fn is_retryable(error: &CourierError) -> bool {
        error.is_transport()
    }
}

impl EventHandler for RetrySubscriber {
    fn name(&self) -> &str {
        "retry"
    }

    fn subscribed_events(&self) -> Vec<(EventKind, i32)> {
        vec![(EventKind::Exception, RETRY_PRIORITY)]
    }

    fn on_exception(&self, request: &InternalRequest, error: CourierError, _config: &Configuration) -> Outcome {
        if !Self::is_retryable(&error) {
            return Outcome::Failed(error);
        }

        let attempt = request.parameters().retry_count().unwrap_or(0) + 1;
        if attempt > self.limit {
            return Outcome::Failed(error);
        }

        let delay = self.strategy.delay(attempt, self.max_delay);
        info!(
            url = request.url(),
            attempt,
            limit = self.limit,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying request"
        );

        Outcome::Resend {
            request: request.clone().with_parameter(RETRY_COUNT, Parameter::Count(attempt)),
            delay,
        }
    }
}
