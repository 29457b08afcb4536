use crate::common::render_error;
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::exception::ExceptionFilter;
use axum::response::Response;

/// Default exception filter
///
/// Logs the error and answers `500 {"code":500,"messages":["Internal Server Error"]}`
/// without leaking the error text to the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExceptionFilter;

impl ExceptionFilter for JsonExceptionFilter {
    fn catch(&self, ctx: &RequestContext, error: DispatchError) -> Response {
        match &error {
            DispatchError::Handler(source) => {
                tracing::error!("{} {}: handler failed: {:#}", ctx.method(), ctx.path(), source)
            }
            _ => tracing::error!("{} {}: {}", ctx.method(), ctx.path(), error),
        }
        render_error(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::HttpMethod;

    #[tokio::test]
    async fn test_hides_error_details() {
        let ctx = RequestContext::from_target(HttpMethod::Get, "/");
        let response = JsonExceptionFilter.catch(
            &ctx,
            DispatchError::Handler(anyhow::anyhow!("database password is hunter2")),
        );
        assert_eq!(response.status().as_u16(), 500);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            &body[..],
            br#"{"code":500,"messages":["Internal Server Error"]}"#
        );
    }
}
