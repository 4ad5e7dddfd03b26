use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::MiddlewareHandler;
use crate::context::Context;
use crate::dispatcher::AfterResponseHandler;
use crate::response::HttpResponse;

/// Lock-free request/response counters.
///
/// Attach [`Metrics::middleware`] globally to count dispatched requests and
/// [`Metrics::after_response_hook`] to bucket responses by status class.
/// All counters use atomic operations; no locks on the request path.
#[derive(Default)]
pub struct Metrics {
    requests: AtomicUsize,
    responses_ok: AtomicUsize,
    responses_client_error: AtomicUsize,
    responses_server_error: AtomicUsize,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Responses with a 2xx/3xx status.
    #[must_use]
    pub fn ok_count(&self) -> usize {
        self.responses_ok.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn client_error_count(&self) -> usize {
        self.responses_client_error.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn server_error_count(&self) -> usize {
        self.responses_server_error.load(Ordering::Relaxed)
    }

    /// A global middleware entry that counts every dispatched request.
    /// Call on a clone: `metrics.clone().middleware()`.
    #[must_use]
    pub fn middleware(self: Arc<Self>) -> MiddlewareHandler {
        let metrics = self;
        Arc::new(move |_ctx: &mut Context| {
            metrics.requests.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    /// An after-response hook that buckets the final status.
    #[must_use]
    pub fn after_response_hook(self: Arc<Self>) -> AfterResponseHandler {
        let metrics = self;
        Arc::new(move |response: HttpResponse| {
            let status = response.status.unwrap_or(200);
            let counter = match status {
                500.. => &metrics.responses_server_error,
                400.. => &metrics.responses_client_error,
                _ => &metrics.responses_ok,
            };
            counter.fetch_add(1, Ordering::Relaxed);
            response
        })
    }
}
