use crate::context::RequestContext;
use crate::error::DispatchError;
use axum::response::Response;

pub mod http;

/// The ExceptionFilter trait
///
/// Turns an internal [`DispatchError`] into the response sent to the client.
/// Responses chosen by parameter processors or triggers never pass through
/// here; they are not errors.
///
/// # Example
/// ```
/// use paramflow::exception::ExceptionFilter;
/// use paramflow::{DispatchError, RequestContext, render_error};
/// use axum::response::Response;
///
/// struct PlainFilter;
///
/// impl ExceptionFilter for PlainFilter {
///     fn catch(&self, _ctx: &RequestContext, error: DispatchError) -> Response {
///         render_error(500, error.to_string())
///     }
/// }
/// ```
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, ctx: &RequestContext, error: DispatchError) -> Response;
}
