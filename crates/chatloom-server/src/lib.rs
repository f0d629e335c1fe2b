//! HTTP transport for the chatloom dev backend.
//!
//! One protocol endpoint (`POST /chat`) answers management requests with
//! JSON and turn requests with an SSE stream of thread events.

pub mod dispatch;
pub mod http;
pub mod transport;
