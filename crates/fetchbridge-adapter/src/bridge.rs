//! Response write-back.
//!
//! Once a handler registers a response, it has escaped handler code and its
//! delivery is this module's problem: apply transmission defaults, track
//! cancellation of the body stream, and classify write failures. A peer
//! that hangs up mid-response is routine and must not surface as an error.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::Response;
use http_body::{Body, Frame, SizeHint};
use tracing::debug;

use fetchbridge_event::{BodyStream, BoxError, FetchResponse};

/// Content type transmitted when the handler set none.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Finalize a registered response for transmission.
///
/// Fills in the `text/plain` content-type default (responses that carry one
/// pass through unchanged) and wraps the body so that an abandoned write is
/// observed as a cancellation.
pub fn finalize_response(response: FetchResponse) -> Response<WatchedBody> {
    let (mut parts, body) = response.into_parts();

    if !parts.headers.contains_key(CONTENT_TYPE) {
        parts
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }

    let body = WatchedBody::with_cancel_hook(body, || {
        debug!("response body canceled before completion");
    });
    Response::from_parts(parts, body)
}

/// Whether an error chain bottoms out in the peer having gone away.
///
/// Broken-pipe and connection-reset failures during write-back are expected
/// under normal client disconnects; they are swallowed rather than reported
/// on the error channel.
pub fn is_benign_disconnect(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = cause {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::NotConnected
            );
        }
        cause = e.source();
    }
    false
}

/// A response body that reports abandonment.
///
/// The native connection drops the body without polling it to the end when
/// a write fails; the cancel hook fires exactly once in that case, and
/// never after a fully streamed body.
pub struct WatchedBody {
    inner: BodyStream,
    finished: bool,
    on_cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl WatchedBody {
    pub fn new(inner: BodyStream) -> Self {
        Self {
            inner,
            finished: false,
            on_cancel: None,
        }
    }

    pub fn with_cancel_hook(
        inner: BodyStream,
        hook: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            finished: false,
            on_cancel: Some(Box::new(hook)),
        }
    }
}

impl Body for WatchedBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(None) => {
                this.finished = true;
                this.on_cancel = None;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(err))) => {
                this.finished = true;
                this.on_cancel = None;
                Poll::Ready(Some(Err(err)))
            }
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for WatchedBody {
    fn drop(&mut self) {
        if let Some(hook) = self.on_cancel.take()
            && !self.finished
            && !self.inner.is_end_stream()
        {
            hook();
        }
    }
}
