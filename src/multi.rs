//! Multi-request executor
//!
//! Runs a batch in rounds. Each round prepares the pending requests, sends
//! them together through [`Transport::send_batch`] and settles every result
//! on its own. Requests a subscriber wants resent (redirect hops, retries)
//! form the next round, so only that subset goes back to the transport.
//! Results land in per-index slots, which keeps submission order no matter
//! how the rounds interleave.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::adapter::HttpAdapter;
use crate::errors::{CourierError, MultiRequestError, RequestFailure, Result};
use crate::event::Outcome;
use crate::message::{InternalRequest, Response};
use crate::transport::Transport;

/// Per-request result slots of one batch
struct Batch {
    roots: Vec<Arc<InternalRequest>>,
    slots: Vec<Option<Result<Response>>>,
}

impl Batch {
    fn new(roots: Vec<Arc<InternalRequest>>) -> Self {
        let slots = roots.iter().map(|_| None).collect();
        Self { roots, slots }
    }

    /// Store a terminal outcome, or hand back the request to resend and its delay
    fn record<T: Transport>(
        &mut self,
        adapter: &HttpAdapter<T>,
        index: usize,
        outcome: Outcome,
    ) -> Option<(InternalRequest, Duration)> {
        match outcome {
            Outcome::Continue(response) | Outcome::Resolved(response) => {
                self.slots[index] = Some(Ok(adapter.finish(response, &self.roots[index])));
                None
            }
            Outcome::Failed(error) => {
                self.slots[index] = Some(Err(error));
                None
            }
            Outcome::Resend { request, delay } => Some((request, delay)),
        }
    }

    /// Split the slots into ordered responses and failures
    fn partition(self) -> (Vec<Response>, Vec<RequestFailure>) {
        let mut responses = Vec::new();
        let mut failures = Vec::new();

        for (root, slot) in self.roots.into_iter().zip(self.slots) {
            match slot {
                Some(Ok(response)) => responses.push(response),
                Some(Err(error)) => failures.push(RequestFailure { request: root, error }),
                None => {
                    let error = CourierError::transport(root.url(), "multi", "request was never resolved");
                    failures.push(RequestFailure { request: root, error });
                }
            }
        }

        (responses, failures)
    }
}

/// Send every request of `requests`, resolving each one independently
///
/// A failure never cancels siblings. With no failures the responses come back
/// in submission order; otherwise a [`MultiRequestError`] accounts for every
/// request exactly once.
pub async fn execute<T: Transport>(
    adapter: &HttpAdapter<T>,
    requests: Vec<InternalRequest>,
) -> std::result::Result<Vec<Response>, MultiRequestError> {
    let config = adapter.configuration();
    let dispatcher = adapter.dispatcher();

    let roots: Vec<Arc<InternalRequest>> = requests.into_iter().map(Arc::new).collect();
    dispatcher.multi_pre_send(&roots, config);

    let mut queue: Vec<(usize, InternalRequest)> = roots
        .iter()
        .enumerate()
        .map(|(index, root)| (index, (**root).clone()))
        .collect();
    let mut batch = Batch::new(roots);
    let mut delay = Duration::ZERO;
    let mut round = 0u32;

    while !queue.is_empty() {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay = Duration::ZERO;
        round += 1;

        let mut next = Vec::new();
        let mut indices = Vec::with_capacity(queue.len());
        let mut prepared = Vec::with_capacity(queue.len());

        for (index, request) in queue.drain(..) {
            match adapter.prepare(request) {
                Ok(request) => {
                    indices.push(index);
                    prepared.push(request);
                }
                Err(outcome) => {
                    if let Some((request, wait)) = batch.record(adapter, index, outcome) {
                        delay = delay.max(wait);
                        next.push((index, request));
                    }
                }
            }
        }

        if !prepared.is_empty() {
            debug!(round, count = prepared.len(), adapter = adapter.name(), "sending batch round");
            let mut results = adapter.transport().send_batch(&prepared, config).await.into_iter();

            for (index, request) in indices.into_iter().zip(&prepared) {
                let result = results.next().unwrap_or_else(|| {
                    Err(CourierError::transport(
                        request.url(),
                        adapter.name(),
                        "batch send returned no result for this request",
                    ))
                });
                if let Some((request, wait)) = batch.record(adapter, index, adapter.settle(request, result)) {
                    delay = delay.max(wait);
                    next.push((index, request));
                }
            }
        }

        queue = next;
    }

    let (responses, failures) = batch.partition();
    info!(
        succeeded = responses.len(),
        failed = failures.len(),
        rounds = round,
        "batch finished"
    );

    dispatcher.multi_post_send(&responses, config);

    if failures.is_empty() {
        return Ok(responses);
    }

    let error = MultiRequestError::new(responses, failures);
    dispatcher.multi_exception(&error, config);
    Err(error)
}
