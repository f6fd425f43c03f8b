//! Process-level event dispatch.
//!
//! Handlers register against the "fetch" and "error" channels; dispatch is
//! synchronous and runs handlers in registration order. The dispatcher is
//! passed into the connection loop explicitly — there is no process-global
//! registry to mutate.

use std::sync::{Arc, RwLock};

use tracing::error;

use crate::event::FetchEvent;

/// Handler invoked for every adapted request.
pub type FetchHandler = Arc<dyn Fn(FetchEvent) + Send + Sync>;

/// Handler invoked for every connection-level failure.
pub type ErrorHandler = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;

/// A connection-level failure surfaced to handler code.
#[derive(Debug)]
pub struct ErrorEvent {
    /// Human-readable description of the failure.
    pub message: String,
    /// Identity of the component that observed it.
    pub origin: &'static str,
    /// The original failure value.
    pub source: anyhow::Error,
}

/// Registry of fetch and error handlers.
#[derive(Default)]
pub struct EventDispatcher {
    fetch: RwLock<Vec<FetchHandler>>,
    error: RwLock<Vec<ErrorHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fetch handler.
    pub fn on_fetch(&self, handler: impl Fn(FetchEvent) + Send + Sync + 'static) {
        self.fetch
            .write()
            .expect("fetch handlers lock")
            .push(Arc::new(handler));
    }

    /// Register an error handler.
    pub fn on_error(&self, handler: impl Fn(&ErrorEvent) + Send + Sync + 'static) {
        self.error
            .write()
            .expect("error handlers lock")
            .push(Arc::new(handler));
    }

    /// Dispatch one event to every fetch handler, in registration order.
    ///
    /// Each handler receives a clone sharing the same write-back; only one
    /// of them is expected to respond.
    pub fn dispatch_fetch(&self, event: FetchEvent) {
        let handlers = self.fetch.read().expect("fetch handlers lock").clone();
        for handler in &handlers {
            handler(event.clone());
        }
    }

    /// Dispatch an error event.
    ///
    /// Logged directly when no handler is registered, so failures are never
    /// silent.
    pub fn dispatch_error(&self, event: ErrorEvent) {
        let handlers = self.error.read().expect("error handlers lock").clone();
        if handlers.is_empty() {
            error!(origin = event.origin, source = %event.source, "{}", event.message);
            return;
        }
        for handler in &handlers {
            handler(&event);
        }
    }
}
