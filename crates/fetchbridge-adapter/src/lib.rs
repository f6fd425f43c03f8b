//! fetchbridge-adapter — bridges native HTTP requests to fetch-event
//! handlers.
//!
//! Lets handler code written against the fetch-event contract run atop
//! hyper's per-connection request service. One fetch event is dispatched
//! per inbound request; the handler's response — immediate or deferred —
//! is forwarded back onto the originating connection.
//!
//! # Architecture
//!
//! ```text
//! HTTP client
//!   │
//!   ▼
//! hyper connection (one task per accepted connection)
//!   │
//!   ├── Convert hyper::Request → FetchRequest   (convert)
//!   ├── Dispatch FetchEvent on the "fetch" channel
//!   ├── Await the handler's respond_with        (bridge)
//!   │
//!   ▼
//! HTTP response
//! ```
//!
//! Failures while serving one connection dispatch a structured error event
//! and abandon only that connection; peer disconnects during write-back are
//! expected and swallowed.

pub mod bridge;
pub mod conn;
pub mod convert;

pub use conn::ConnectionLoop;
pub use convert::{FORWARDED_FOR, adapt_request};
