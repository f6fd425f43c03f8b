//! Response-side types and helpers.

use bytes::Bytes;
use http::{Response, StatusCode};

use crate::body::{self, BodyStream};

/// The response type handlers register via `respond_with`.
///
/// A response without an explicit `content-type` is transmitted as
/// `text/plain`; the bridge fills in the default during write-back.
pub type FetchResponse = Response<BodyStream>;

/// A 200 response carrying the given bytes.
pub fn text_response(content: impl Into<Bytes>) -> FetchResponse {
    Response::new(body::full(content))
}

/// A response with the given status and body bytes.
pub fn status_response(status: StatusCode, content: impl Into<Bytes>) -> FetchResponse {
    let mut response = Response::new(body::full(content));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn text_response_defaults_to_200() {
        let response = text_response("hi");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(http::header::CONTENT_TYPE).is_none());
        let collected = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(collected, Bytes::from("hi"));
    }

    #[test]
    fn status_response_carries_the_status() {
        let response = status_response(StatusCode::NOT_FOUND, "missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
