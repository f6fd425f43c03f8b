//! fetchbridge-event — the fetch-event contract and dispatcher.
//!
//! Handler code written against this crate sees the standardized fetch
//! surface: an immutable request, a `respond_with` registration that takes
//! either a finished response or a deferred one, and a lifetime-extension
//! hook. The dispatcher is the process-level registry those handlers plug
//! into; the connection loop in `fetchbridge-adapter` publishes one fetch
//! event per inbound request and one error event per failed connection.
//!
//! Nothing in this crate touches sockets; the native write path is
//! injected into each event as a one-shot callback.

pub mod body;
pub mod dispatch;
pub mod event;
pub mod request;
pub mod response;

pub use body::{BodySender, BodyStream, BoxError};
pub use dispatch::{ErrorEvent, ErrorHandler, EventDispatcher, FetchHandler};
pub use event::FetchEvent;
pub use request::FetchRequest;
pub use response::FetchResponse;
