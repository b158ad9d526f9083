//! Transport backends
//!
//! A transport executes one request on the wire and hands back a [`Response`].
//! Redirects, retries and batching policy live above it in the pipeline.

pub mod form;
mod native;
mod socket;

use std::future::Future;

use futures::stream::{self, StreamExt};

pub use native::ReqwestTransport;
pub use socket::SocketTransport;

use crate::config::Configuration;
use crate::errors::{CourierError, Result};
use crate::message::{InternalRequest, Response};

/// The capability every backend provides
pub trait Transport: Send + Sync {
    /// Backend name used in error messages
    fn name(&self) -> &str;

    /// Send one request; network, DNS, TLS and timeout failures are errors
    fn send(&self, request: &InternalRequest, config: &Configuration) -> impl Future<Output = Result<Response>> + Send;

    /// Send several requests, one result per request in input order
    ///
    /// The default runs up to `config.concurrency()` sends at once. A failure
    /// or timeout on one request never cancels its siblings.
    fn send_batch(
        &self,
        requests: &[InternalRequest],
        config: &Configuration,
    ) -> impl Future<Output = Vec<Result<Response>>> + Send
    where
        Self: Sized,
    {
        let sends: Vec<_> = requests
            .iter()
            .map(|request| send_with_timeout(self, request, config))
            .collect();
        async move {
            stream::iter(sends)
                .buffered(config.concurrency())
                .collect()
                .await
        }
    }
}

/// Send through `transport`, bounded by the configured timeout
///
/// A zero timeout waits indefinitely.
pub async fn send_with_timeout<T: Transport>(
    transport: &T,
    request: &InternalRequest,
    config: &Configuration,
) -> Result<Response> {
    let limit = config.timeout();
    if limit.is_zero() {
        return transport.send(request, config).await;
    }

    tokio::time::timeout(limit, transport.send(request, config))
        .await
        .map_err(|_| CourierError::Timeout {
            url: request.url().to_string(),
            timeout: limit.as_secs_f64(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Earlier URL indices answer later; index 2 always fails
    struct Staggered {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Transport for Staggered {
        fn name(&self) -> &str {
            "staggered"
        }

        async fn send(&self, request: &InternalRequest, _config: &Configuration) -> Result<Response> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let index: u64 = request.url().rsplit('/').next().and_then(|s| s.parse().ok()).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - index * 10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if index == 2 {
                return Err(CourierError::transport(request.url(), self.name(), "refused"));
            }
            Ok(Response::new(200).with_effective_url(request.url()))
        }
    }

    fn staggered() -> Staggered {
        Staggered {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let transport = staggered();
        let requests: Vec<_> = (0..4)
            .map(|i| InternalRequest::new(format!("http://example.com/{}", i), Method::Get))
            .collect();

        let results = transport.send_batch(&requests, &Configuration::default()).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().effective_url(), Some("http://example.com/0"));
        assert!(results[2].is_err());
        assert_eq!(results[3].as_ref().unwrap().effective_url(), Some("http://example.com/3"));
    }

    #[tokio::test]
    async fn test_batch_respects_concurrency() {
        let transport = staggered();
        let requests: Vec<_> = (0..4)
            .map(|i| InternalRequest::new(format!("http://example.com/{}", i), Method::Get))
            .collect();

        transport
            .send_batch(&requests, &Configuration::default().with_concurrency(2))
            .await;

        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let transport = staggered();
        let request = InternalRequest::new("http://example.com/0", Method::Get);
        let config = Configuration::default().with_timeout(Duration::from_millis(5));

        let err = send_with_timeout(&transport, &request, &config).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(err.is_transport());
    }
}
