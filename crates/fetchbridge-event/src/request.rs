//! The immutable request half of the fetch contract.

use std::fmt;
use std::sync::{Arc, Mutex};

use http::request::Parts;
use http::{HeaderMap, Method, Uri};

use crate::body::BodyStream;

/// The adapted, read-only request handed to fetch handlers.
///
/// Clones are cheap and share the same head; the head is immutable for the
/// lifetime of the request. The body is a single-consumer stream: the first
/// [`take_body`](Self::take_body) wins and later calls observe `None`,
/// mirroring body-consumed semantics.
#[derive(Clone)]
pub struct FetchRequest {
    head: Arc<Parts>,
    body: Arc<Mutex<Option<BodyStream>>>,
}

impl FetchRequest {
    /// Build from request parts and an optional body stream.
    ///
    /// Bodyless methods (GET, HEAD) are constructed with `None`.
    pub fn new(head: Parts, body: Option<BodyStream>) -> Self {
        Self {
            head: Arc::new(head),
            body: Arc::new(Mutex::new(body)),
        }
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Absolute URL, resolved against the configured origin.
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Take the body stream.
    ///
    /// Returns `None` for bodyless requests and after the body has been
    /// taken once.
    pub fn take_body(&self) -> Option<BodyStream> {
        self.body.lock().expect("body lock").take()
    }

    /// Whether the body stream is still available.
    pub fn has_body(&self) -> bool {
        self.body.lock().expect("body lock").is_some()
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body;

    fn request_with_body(method: Method, body_stream: Option<BodyStream>) -> FetchRequest {
        let (head, _) = http::Request::builder()
            .method(method)
            .uri("http://localhost/test")
            .body(())
            .unwrap()
            .into_parts();
        FetchRequest::new(head, body_stream)
    }

    #[test]
    fn body_can_be_taken_once() {
        let request = request_with_body(Method::POST, Some(body::full("payload")));
        assert!(request.has_body());
        assert!(request.take_body().is_some());
        assert!(request.take_body().is_none());
        assert!(!request.has_body());
    }

    #[test]
    fn clones_share_the_body_slot() {
        let request = request_with_body(Method::POST, Some(body::full("payload")));
        let other = request.clone();
        assert!(other.take_body().is_some());
        assert!(request.take_body().is_none());
    }

    #[test]
    fn head_is_readable_any_number_of_times() {
        let request = request_with_body(Method::GET, None);
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri().path(), "/test");
        assert_eq!(request.method(), Method::GET);
        assert!(request.take_body().is_none());
    }
}
