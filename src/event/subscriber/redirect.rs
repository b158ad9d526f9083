//! Redirect following as a post-send subscriber

use crate::config::Configuration;
use crate::event::{EventHandler, EventKind, Outcome};
use crate::message::{InternalRequest, Response};
use crate::redirect::{RedirectPolicy, Transition};

pub const REDIRECT_PRIORITY: i32 = 0;

/// Turns 3xx responses into follow-up requests according to a [`RedirectPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RedirectSubscriber {
    policy: RedirectPolicy,
}

impl RedirectSubscriber {
    pub fn new(policy: RedirectPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RedirectPolicy {
        &self.policy
    }
}

impl EventHandler for RedirectSubscriber {
    fn name(&self) -> &str {
        "redirect"
    }

    fn subscribed_events(&self) -> Vec<(EventKind, i32)> {
        vec![(EventKind::PostSend, REDIRECT_PRIORITY)]
    }

    fn on_post_send(&self, request: &InternalRequest, response: Response, config: &Configuration) -> Outcome {
        match self.policy.next(request, response, config.max_redirects()) {
            Transition::Resolved(response) => Outcome::Continue(response),
            Transition::Follow(next) => Outcome::resend(next),
            Transition::Failed(error) => Outcome::Failed(error),
        }
    }
}
