//! The fetch event — one per native request.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::request::FetchRequest;
use crate::response::FetchResponse;

/// Write-back callback that hands a response to the native connection.
pub type WriteBack = Box<dyn FnOnce(FetchResponse) + Send>;

/// A single dispatched request/response exchange.
///
/// The dispatcher hands each registered handler a clone; all clones share
/// one write-back, which fires at most once. An event moves from pending to
/// settled on the first `respond_with` and never transitions back —
/// instances are single-use and must not be kept across requests.
#[derive(Clone)]
pub struct FetchEvent {
    request: FetchRequest,
    write_back: Arc<Mutex<Option<WriteBack>>>,
}

impl FetchEvent {
    /// Wrap an adapted request and its native write-back path.
    pub fn new(
        request: FetchRequest,
        write_back: impl FnOnce(FetchResponse) + Send + 'static,
    ) -> Self {
        Self {
            request,
            write_back: Arc::new(Mutex::new(Some(Box::new(write_back)))),
        }
    }

    /// The request that triggered this event. Freely repeatable, no side
    /// effects.
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Register an already-built response; the write-back fires before this
    /// returns.
    ///
    /// Calling this (or [`respond_with_deferred`](Self::respond_with_deferred))
    /// a second time is a logic error in handler code: the first response
    /// wins and the repeat call is reported, not honored.
    pub fn respond_with(&self, response: FetchResponse) {
        if let Some(write_back) = self.take_write_back() {
            write_back(response);
        }
    }

    /// Register a response that is still being produced.
    ///
    /// Returns immediately; the write-back runs once the future resolves,
    /// never before.
    pub fn respond_with_deferred<F>(&self, response: F)
    where
        F: Future<Output = FetchResponse> + Send + 'static,
    {
        let Some(write_back) = self.take_write_back() else {
            return;
        };
        tokio::spawn(async move {
            write_back(response.await);
        });
    }

    /// Whether a response has been registered.
    pub fn is_settled(&self) -> bool {
        self.write_back.lock().expect("write-back lock").is_none()
    }

    /// Extend the event's lifetime past the response.
    ///
    /// The host runtime has no shutdown draining phase, so there is nothing
    /// to extend; the future is dropped unpolled. Kept for contract
    /// compatibility.
    pub fn wait_until<F>(&self, _f: F)
    where
        F: Future + Send + 'static,
    {
    }

    fn take_write_back(&self) -> Option<WriteBack> {
        let taken = self.write_back.lock().expect("write-back lock").take();
        if taken.is_none() {
            error!(
                uri = %self.request.uri(),
                "respond_with called on an already-settled event; keeping the first response"
            );
        }
        taken
    }
}
