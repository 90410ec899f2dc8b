//! REST surface for metaforge.
//!
//! A small axum application exposing one endpoint per operation plus an
//! offline reference and a health probe, all speaking the fixed JSON
//! envelopes. The server holds a single [`metaforge_ops::Dispatcher`]
//! and forwards everything with the configured site credentials; the
//! capability check happens in the backend, so the server adds no
//! authentication of its own and binds loopback by default.

mod docs;
mod envelope;
mod routes;

pub use docs::{ApiReference, EndpointDoc, ErrorCodeDoc, api_reference};
pub use envelope::{ApiError, ApiFailure, ApiSuccess, ErrorBody};
pub use routes::{DEFAULT_BIND, router, serve};
