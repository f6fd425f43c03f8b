//! Per-connection serving and event dispatch.
//!
//! `ConnectionLoop` turns each accepted connection into its own task.
//! hyper services the connection's requests in arrival order; every request
//! is adapted, wrapped in a [`FetchEvent`], dispatched synchronously, and
//! answered once the handler's write-back fires. A failure on one
//! connection is reported on the error channel and abandons only that
//! connection.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http::{Response, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tracing::{debug, error};

use fetchbridge_core::Origin;
use fetchbridge_event::{ErrorEvent, EventDispatcher, FetchEvent, response};

use crate::bridge::{WatchedBody, finalize_response, is_benign_disconnect};
use crate::convert::adapt_request;

/// Origin identifier carried by error events from this loop.
pub const ERROR_ORIGIN: &str = "fetchbridge-adapter::conn";

/// Serves accepted connections and dispatches one fetch event per request.
///
/// The dispatcher and origin are injected at construction; the loop keeps
/// no global state and can be cloned freely across accept loops.
#[derive(Clone)]
pub struct ConnectionLoop {
    origin: Origin,
    dispatcher: Arc<EventDispatcher>,
}

impl ConnectionLoop {
    pub fn new(origin: Origin, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { origin, dispatcher }
    }

    /// The dispatcher events are published on.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Handle one accepted connection without blocking the caller.
    ///
    /// Spawns a task that serves the connection to completion. Peer
    /// disconnects are logged at debug level and swallowed; any other
    /// failure dispatches exactly one error event for this connection.
    pub fn handle_connection<I>(&self, io: I, peer: SocketAddr)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.serve_connection(io, peer).await {
                if is_benign_disconnect(&err) {
                    debug!(%peer, error = %err, "peer disconnected mid-exchange");
                } else {
                    this.dispatcher.dispatch_error(ErrorEvent {
                        message: format!("connection to {peer} failed: {err}"),
                        origin: ERROR_ORIGIN,
                        source: err.into(),
                    });
                }
            }
        });
    }

    async fn serve_connection<I>(&self, io: I, peer: SocketAddr) -> Result<(), hyper::Error>
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let this = self.clone();
        let service = service_fn(move |request| {
            let this = this.clone();
            async move { Ok::<_, Infallible>(this.handle_request(peer, request).await) }
        });

        http1::Builder::new()
            .serve_connection(TokioIo::new(io), service)
            .await
    }

    /// Adapt, dispatch, and await the handler's response for one request.
    async fn handle_request(
        &self,
        peer: SocketAddr,
        request: http::Request<Incoming>,
    ) -> Response<WatchedBody> {
        let adapted = adapt_request(&self.origin, peer, request);
        let uri = adapted.uri().clone();

        let (tx, rx) = oneshot::channel();
        let event = FetchEvent::new(adapted, move |response| {
            // The connection may be gone by the time a deferred response
            // resolves; the write failure is classified by the connection
            // task, not here.
            let _ = tx.send(response);
        });

        self.dispatcher.dispatch_fetch(event);

        match rx.await {
            Ok(fetched) => finalize_response(fetched),
            Err(_) => {
                // Every clone of the event was dropped without a response
                // being registered.
                error!(%uri, "no handler responded");
                finalize_response(response::status_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_loop_is_cloneable_and_shares_the_dispatcher() {
        let origin = Origin::parse("http://localhost:8080").unwrap();
        let dispatcher = Arc::new(EventDispatcher::new());
        let conn_loop = ConnectionLoop::new(origin, dispatcher.clone());

        let cloned = conn_loop.clone();
        assert!(Arc::ptr_eq(cloned.dispatcher(), &dispatcher));
    }
}
