//! Body streams shared by the fetch contract.
//!
//! Requests and responses carry the same boxed stream type, so a handler
//! can hand a request body straight back as a response body without
//! conversion.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use thiserror::Error;
use tokio::sync::mpsc;

/// Boxed error type carried by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The byte-stream type carried by requests and responses.
pub type BodyStream = BoxBody<Bytes, BoxError>;

/// A body holding a single chunk of bytes.
pub fn full(data: impl Into<Bytes>) -> BodyStream {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// A body with no bytes.
pub fn empty() -> BodyStream {
    Empty::new().map_err(|never| match never {}).boxed()
}

/// An in-memory channel body.
///
/// The sender feeds chunks; the stream yields them in order and ends when
/// the sender is dropped. Dropping the stream closes the channel, which the
/// sender observes as [`BodyClosed`] — the cancellation signal for a
/// producer whose consumer has gone away.
pub fn channel(capacity: usize) -> (BodySender, BodyStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (BodySender { tx }, BoxBody::new(ChannelBody { rx }))
}

/// The receiving half of a channel body was dropped.
#[derive(Debug, Error)]
#[error("body stream closed by the consumer")]
pub struct BodyClosed;

/// Producer half of [`channel`].
#[derive(Clone)]
pub struct BodySender {
    tx: mpsc::Sender<Result<Bytes, BoxError>>,
}

impl BodySender {
    /// Send one chunk, waiting for capacity.
    pub async fn send(&self, chunk: impl Into<Bytes>) -> Result<(), BodyClosed> {
        self.tx.send(Ok(chunk.into())).await.map_err(|_| BodyClosed)
    }

    /// Terminate the stream with an error instead of a clean end.
    pub async fn abort(self, err: BoxError) {
        let _ = self.tx.send(Err(err)).await;
    }
}

struct ChannelBody {
    rx: mpsc::Receiver<Result<Bytes, BoxError>>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        match self.get_mut().rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(Frame::data(chunk)))),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}
