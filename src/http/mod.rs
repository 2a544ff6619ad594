//! HTTP request controller and its transport
//!
//! A [`RequestController`] wraps one configured call (method and path) with
//! cancellation, delay injection, `data` envelope promotion and coordination
//! of the shared [`LoadingIndicator`](crate::loader::LoadingIndicator).

pub mod options;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use options::{Method, RequestOptions, RequestOverrides};
pub use request::{HttpContext, RequestController, RequestPhase, RequestState};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
