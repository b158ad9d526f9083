//! Redirect resolution
//!
//! A redirect chain moves through [`RedirectState`]s as responses arrive:
//!
//! ```text
//! Initial --(3xx + Location)--> Following --(3xx + Location)--> Following ...
//!    |                              |
//!    +--(anything else)--> Resolved +--(budget exceeded / transport error)--> Failed
//! ```
//!
//! [`RedirectPolicy::next`] computes one transition. The pipeline drives the
//! chain as a loop, so the number of iterations is bounded by the budget.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::errors::{CourierError, Result};
use crate::http::{Method, REDIRECT_STATUS_CODES};
use crate::message::parameters::{PARENT_REQUEST, REDIRECT_COUNT, RETRY_COUNT};
use crate::message::{InternalRequest, Parameter, Response};

/// Where a redirect chain currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectState {
    /// No redirect followed yet
    Initial,
    /// `hop` redirects followed so far
    Following { hop: u32 },
    /// Final response obtained
    Resolved,
    /// Budget exceeded or the transport failed mid-chain
    Failed,
}

impl RedirectState {
    /// State of the chain `request` belongs to, before its response arrives
    pub fn of(request: &InternalRequest) -> Self {
        match redirect_count(request) {
            0 => RedirectState::Initial,
            hop => RedirectState::Following { hop },
        }
    }
}

/// Result of feeding one response to the policy
#[derive(Debug)]
pub enum Transition {
    /// Not a followable redirect: the response is final
    Resolved(Response),
    /// Send this request next
    Follow(InternalRequest),
    /// The chain cannot continue
    Failed(CourierError),
}

impl Transition {
    pub fn state(&self, request: &InternalRequest) -> RedirectState {
        match self {
            Transition::Resolved(_) => RedirectState::Resolved,
            Transition::Follow(_) => RedirectState::Following {
                hop: redirect_count(request) + 1,
            },
            Transition::Failed(_) => RedirectState::Failed,
        }
    }
}

/// Redirects followed so far by the chain `request` belongs to
pub fn redirect_count(request: &InternalRequest) -> u32 {
    request.parameters().redirect_count().unwrap_or(0)
}

/// First request of the chain, if `request` is a follow-up
pub fn parent_request(request: &InternalRequest) -> Option<&Arc<InternalRequest>> {
    request.parameters().parent_request()
}

/// Rules for following redirects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    /// Keep the method on 301/302 instead of rewriting POST to GET
    pub strict: bool,
    /// Fail when the budget is exceeded; otherwise return the last redirect response
    pub throw_on_max: bool,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            strict: false,
            throw_on_max: true,
        }
    }
}

impl RedirectPolicy {
    pub fn new(strict: bool, throw_on_max: bool) -> Self {
        Self { strict, throw_on_max }
    }

    /// Whether `response` asks to be followed at all
    pub fn is_redirect(response: &Response) -> bool {
        REDIRECT_STATUS_CODES.contains(&response.status_code()) && response.headers().contains("Location")
    }

    /// Compute the next step of the chain after `request` produced `response`
    ///
    /// A `max_redirects` of zero disables following: every response resolves as-is.
    pub fn next(&self, request: &InternalRequest, response: Response, max_redirects: u32) -> Transition {
        if max_redirects == 0 || !Self::is_redirect(&response) {
            return Transition::Resolved(self.prepare_response(response, request));
        }

        let count = redirect_count(request);
        if count >= max_redirects {
            let response = self.prepare_response(response, request);
            if !self.throw_on_max {
                return Transition::Resolved(response);
            }
            let url = parent_request(request)
                .map(|parent| parent.url().to_string())
                .unwrap_or_else(|| request.url().to_string());
            return Transition::Failed(CourierError::MaxRedirectsExceeded {
                url,
                max: max_redirects,
                response: Box::new(response),
            });
        }

        match self.create_redirect_request(&response, request) {
            Ok(next) => {
                debug!(
                    from = request.url(),
                    to = next.url(),
                    status = response.status_code(),
                    hop = count + 1,
                    "following redirect"
                );
                Transition::Follow(next)
            }
            Err(error) => Transition::Failed(error),
        }
    }

    /// Build the follow-up request for a redirect response
    pub fn create_redirect_request(&self, response: &Response, request: &InternalRequest) -> Result<InternalRequest> {
        let location = response
            .header("Location")
            .ok_or_else(|| CourierError::Parse("redirect response has no Location header".to_string()))?;
        let target = resolve_location(request.url(), location)?;

        let parent = parent_request(request)
            .cloned()
            .unwrap_or_else(|| Arc::new(request.clone()));

        let next = self
            .rewrite(response.status_code(), request.clone())
            .with_url(target)
            .without_header("Host")
            // Each hop gets its own retry budget
            .without_parameter(RETRY_COUNT)
            .with_parameter(PARENT_REQUEST, Parameter::Request(parent))
            .with_parameter(REDIRECT_COUNT, Parameter::Count(redirect_count(request) + 1));

        Ok(next)
    }

    /// Apply the method rewrite rules for `status`
    ///
    /// - 303: always GET without a payload
    /// - 301/302: POST becomes GET without a payload unless strict; other methods stay
    /// - 307/308: unchanged
    pub fn rewrite(&self, status: u16, request: InternalRequest) -> InternalRequest {
        match status {
            303 => request.with_method(Method::Get).without_payload(),
            301 | 302 if !self.strict && request.method() == Method::Post => {
                request.with_method(Method::Get).without_payload()
            }
            _ => request,
        }
    }

    /// Stamp the effective URL and redirect count on a final response
    pub fn prepare_response(&self, response: Response, request: &InternalRequest) -> Response {
        response
            .with_effective_url(request.url())
            .with_redirect_count(redirect_count(request))
    }
}

/// Resolve a `Location` value against the URL it was received from
///
/// Absolute locations replace the URL outright. Relative ones are resolved
/// per RFC 3986; when the current URL is itself relative (a bare path) the
/// result stays relative.
pub fn resolve_location(current: &str, location: &str) -> Result<String> {
    let location = location.trim();

    if let Ok(absolute) = Url::parse(location) {
        return Ok(absolute.to_string());
    }

    match Url::parse(current) {
        Ok(base) => Ok(base.join(location)?.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let placeholder = Url::parse("http://relative.invalid/")?;
            let resolved = placeholder.join(current)?.join(location)?;
            let mut relative = resolved.path().to_string();
            if let Some(query) = resolved.query() {
                relative.push('?');
                relative.push_str(query);
            }
            if let Some(fragment) = resolved.fragment() {
                relative.push('#');
                relative.push_str(fragment);
            }
            Ok(relative)
        }
        Err(error) => Err(error.into()),
    }
}
