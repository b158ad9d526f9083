//! Priority-ordered event dispatch

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::{EventKind, Outcome, Subscriber};
use crate::config::Configuration;
use crate::errors::{CourierError, MultiRequestError, Result};
use crate::message::{InternalRequest, Response};

#[derive(Debug, Clone)]
struct Registration {
    priority: i32,
    subscriber: Arc<Subscriber>,
}

/// Per-kind table of subscribers sorted by descending priority
///
/// Handlers run one after another on the calling task; no two handlers ever
/// see the same event concurrently.
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    listeners: HashMap<EventKind, Vec<Registration>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for every event it declares
    pub fn subscribe(&mut self, subscriber: impl Into<Subscriber>) {
        let subscriber = Arc::new(subscriber.into());
        for (kind, priority) in subscriber.subscribed_events() {
            let list = self.listeners.entry(kind).or_default();
            // Insert after every registration with priority >= ours so ties keep registration order
            let position = list
                .iter()
                .position(|r| r.priority < priority)
                .unwrap_or(list.len());
            list.insert(
                position,
                Registration {
                    priority,
                    subscriber: Arc::clone(&subscriber),
                },
            );
        }
    }

    /// Remove every registration of the subscriber called `name`
    pub fn unsubscribe(&mut self, name: &str) -> bool {
        let mut removed = false;
        for list in self.listeners.values_mut() {
            let before = list.len();
            list.retain(|r| r.subscriber.name() != name);
            removed |= list.len() != before;
        }
        removed
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.listeners.get(&kind).is_some_and(|l| !l.is_empty())
    }

    /// Subscribers of `kind` in delivery order
    pub fn listeners(&self, kind: EventKind) -> Vec<&Subscriber> {
        self.registrations(kind).map(|r| r.subscriber.as_ref()).collect()
    }

    fn registrations(&self, kind: EventKind) -> impl Iterator<Item = &Registration> {
        self.listeners.get(&kind).into_iter().flatten()
    }

    /// Let every pre-send handler transform the request; the first error aborts
    pub fn pre_send(&self, mut request: InternalRequest, config: &Configuration) -> Result<InternalRequest> {
        for registration in self.registrations(EventKind::PreSend) {
            trace!(subscriber = registration.subscriber.name(), "pre_send");
            request = registration.subscriber.on_pre_send(request, config)?;
        }
        Ok(request)
    }

    /// Thread a response through the post-send handlers
    ///
    /// Stops at the first terminal outcome; otherwise the last response wins.
    pub fn post_send(&self, request: &InternalRequest, response: Response, config: &Configuration) -> Outcome {
        let mut outcome = Outcome::Continue(response);
        for registration in self.registrations(EventKind::PostSend) {
            let Outcome::Continue(response) = outcome else {
                break;
            };
            trace!(subscriber = registration.subscriber.name(), "post_send");
            outcome = registration.subscriber.on_post_send(request, response, config);
        }
        outcome
    }

    /// Thread an error through the exception handlers
    ///
    /// A handler may replace the error and pass it on, recover with a
    /// response, or ask for a resend. Anything but a failure stops dispatch.
    pub fn exception(&self, request: &InternalRequest, error: CourierError, config: &Configuration) -> Outcome {
        let mut outcome = Outcome::Failed(error);
        for registration in self.registrations(EventKind::Exception) {
            let Outcome::Failed(error) = outcome else {
                break;
            };
            trace!(subscriber = registration.subscriber.name(), "exception");
            outcome = registration.subscriber.on_exception(request, error, config);
        }
        outcome
    }

    pub fn multi_pre_send(&self, requests: &[Arc<InternalRequest>], config: &Configuration) {
        for registration in self.registrations(EventKind::MultiPreSend) {
            registration.subscriber.on_multi_pre_send(requests, config);
        }
    }

    pub fn multi_post_send(&self, responses: &[Response], config: &Configuration) {
        for registration in self.registrations(EventKind::MultiPostSend) {
            registration.subscriber.on_multi_post_send(responses, config);
        }
    }

    pub fn multi_exception(&self, error: &MultiRequestError, config: &Configuration) {
        for registration in self.registrations(EventKind::MultiException) {
            registration.subscriber.on_multi_exception(error, config);
        }
    }
}
