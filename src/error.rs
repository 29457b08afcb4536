use crate::common::HttpMethod;
use crate::param::{AnnotationKey, ProcessorTarget};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParamflowError>;

/// Configuration errors, raised while controllers are registered.
///
/// All of these are fatal: a dispatcher is never built from a registry that
/// produced one.
#[derive(Debug, Error)]
pub enum ParamflowError {
    #[error("Duplicate route: {method} {path}")]
    DuplicateRoute { method: HttpMethod, path: String },

    #[error("Duplicate parameter processor in {controller}: {target}")]
    DuplicateProcessor {
        controller: &'static str,
        target: ProcessorTarget,
    },

    #[error("Ambiguous parameter processors for '{param}' on {route}: {annotations}")]
    AmbiguousProcessor {
        route: String,
        param: String,
        annotations: String,
    },

    #[error("No parameter processor for '{param}' ({type_name}) on {route}")]
    UnresolvableParameter {
        route: String,
        param: String,
        type_name: &'static str,
    },

    #[error(
        "Processor for {annotation} produces {produced}, but '{param}' on {route} is declared as {declared}"
    )]
    ProcessorOutputMismatch {
        route: String,
        param: String,
        annotation: AnnotationKey,
        produced: &'static str,
        declared: &'static str,
    },

    #[error("Invalid route path: '{0}'")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while a single request is dispatched.
///
/// These never reach the client as-is; the installed
/// [`ExceptionFilter`](crate::exception::ExceptionFilter) turns them into a response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Parameter '{param}' expected {expected}, got {actual}")]
    TypeMismatch {
        param: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Argument #{index} was not resolved")]
    MissingArgument { index: usize },

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl From<ParamflowError> for DispatchError {
    fn from(error: ParamflowError) -> Self {
        DispatchError::Handler(error.into())
    }
}
