//! Native request adaptation.
//!
//! Converts one native request into the immutable [`FetchRequest`] handed
//! to fetch handlers: absolute URL resolved against the configured origin,
//! an authoritative forwarded-peer header, and a lazily attached body
//! stream.

use std::net::SocketAddr;

use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderValue, Method, Request};
use http_body_util::BodyExt;

use fetchbridge_core::Origin;
use fetchbridge_event::{BoxError, FetchRequest};

/// Header naming the connection's peer address.
///
/// Always set by the adapter from the accepted connection; any
/// client-supplied value is overwritten. The adapter is the authoritative
/// source for this header.
pub const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Adapt one native request arriving from `peer` into a [`FetchRequest`].
///
/// The body is not read here; it stays lazy until a handler takes it. GET
/// and HEAD carry no payload and adapt without a body stream.
pub fn adapt_request<B>(origin: &Origin, peer: SocketAddr, request: Request<B>) -> FetchRequest
where
    B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<BoxError>,
{
    let (mut parts, body) = request.into_parts();

    let target = match parts.uri.path_and_query() {
        Some(pq) if !pq.as_str().is_empty() => pq.as_str(),
        _ => "/",
    };
    parts.uri = origin.resolve(target);

    let peer_addr = HeaderValue::from_str(&peer.ip().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    parts.headers.insert(FORWARDED_FOR, peer_addr);

    let body = if parts.method == Method::GET || parts.method == Method::HEAD {
        None
    } else {
        Some(body.map_err(Into::into).boxed())
    };

    FetchRequest::new(parts, body)
}
