use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Body of every error response
///
/// Serializes as `{"code": <int>, "messages": [<string>, ...]}`; the HTTP status
/// of the response always equals `code`.
///
/// # Example
/// ```
/// use paramflow::common::ErrorBody;
///
/// let body = ErrorBody::new(400, "Missing Q");
/// assert_eq!(
///     serde_json::to_string(&body).unwrap(),
///     r#"{"code":400,"messages":["Missing Q"]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub messages: Vec<String>,
}

impl ErrorBody {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            messages: vec![message.into()],
        }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        // Codes outside the valid range still need a response.
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// `200 OK` with a `text/plain` body
pub fn render_text(text: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text.into(),
    )
        .into_response()
}

/// `200 OK` with the JSON encoding of `value`
pub fn render_json<T: Serialize>(value: &T) -> Response {
    Json(value).into_response()
}

/// Error response carrying a single message
///
/// # Example
/// ```
/// use paramflow::common::render_error;
///
/// let response = render_error(404, "Not Found");
/// assert_eq!(response.status().as_u16(), 404);
/// ```
pub fn render_error(code: u16, message: impl Into<String>) -> Response {
    ErrorBody::new(code, message).into_response()
}

/// Error response carrying several messages, e.g. one per failed validation
pub fn render_errors(code: u16, messages: Vec<String>) -> Response {
    ErrorBody { code, messages }.into_response()
}

/// `302 Found` pointing at `location`
pub fn redirect(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}
