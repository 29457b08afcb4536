//! # Paramflow
//!
//! Controller-based request dispatch for Rust, with declarative parameter
//! processors.
//!
//! A controller declares routes and the parameters of each route. Each
//! parameter is resolved before the handler runs, from one of three sources:
//!
//! - a processor registered for a **marker** ("annotation") the parameter carries,
//! - a processor registered for the parameter's **declared type**,
//! - the **same-named query parameter**, for strings and primitives.
//!
//! A processor either hands out the value or answers the request itself, in
//! which case the handler never runs. Every binding is decided and checked
//! when the controller is registered, so misconfigurations surface at startup.
//!
//! ## Features
//!
//! - **Controller Registry**: explicit, reflection-free route and processor tables
//! - **Parameter Processors**: by type or by marker, sync or async
//! - **Triggers and Filters**: before-dispatch hooks and response filters per controller
//! - **Axum Integration**: serve any dispatcher as an `axum::Router`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paramflow::prelude::*;
//!
//! pub struct Pi;
//!
//! #[derive(Default)]
//! pub struct MyController;
//!
//! #[routes]
//! impl MyController {
//!     #[param_processor(target = String)]
//!     fn upper_q(&self, ctx: &RequestContext, _param: &ParamSpec) -> ParamProcessorResult {
//!         match ctx.query().get_first("q") {
//!             Some(q) => ParamProcessorResult::from_data(q.to_uppercase()),
//!             None => ParamProcessorResult::from_web_response(render_error(400, "Missing Q")),
//!         }
//!     }
//!
//!     #[param_processor(annotation = Pi, produces = f64)]
//!     fn pi(&self, _ctx: &RequestContext, _param: &ParamSpec) -> ParamProcessorResult {
//!         ParamProcessorResult::from_data(3.14)
//!     }
//!
//!     #[get("/")]
//!     async fn index(&self, q: String) -> Response {
//!         render_text(q)
//!     }
//!
//!     #[get("/pi")]
//!     async fn pi_value(&self, #[annotated(Pi)] pi: f64) -> Response {
//!         render_text(pi.to_string())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> paramflow::Result<()> {
//!     let dispatcher = Dispatcher::builder().register(MyController)?.build();
//!     let config = ServerConfig::from_env()?;
//!     paramflow::server::serve(dispatcher.into_router(), &config).await
//! }
//! ```

pub mod common;
pub mod config;
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod handler;
pub mod param;
pub mod registry;
pub mod server;
pub mod trigger;

mod resolver;

// Re-export core types
pub use common::{HttpMethod, redirect, render_error, render_errors, render_json, render_text};
pub use config::{ConfigService, ServerConfig};
pub use context::{QueryParams, RequestContext};
pub use controller::{Controller, ControllerBuilder};
pub use dispatch::Dispatcher;
pub use error::{DispatchError, ParamflowError, Result};
pub use handler::{FnHandler, RouteHandler};
pub use param::{
    AnnotationKey, FnProcessor, ParamProcessor, ParamProcessorResult, ParamSpec, ParamValue,
    ProcessorTarget, ResolvedParams, TypeKey,
};
pub use registry::DispatcherBuilder;

// Re-export macros
pub use paramflow_macro::{
    before_dispatch, delete, get, param_processor, patch, post, put, response_filter, routes,
};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use paramflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{
        ErrorBody, HttpMethod, redirect, render_error, render_errors, render_json, render_text,
    };
    pub use crate::config::{ConfigService, ServerConfig};
    pub use crate::context::{QueryParams, RequestContext};
    pub use crate::controller::{Controller, ControllerBuilder};
    pub use crate::dispatch::Dispatcher;
    pub use crate::error::{DispatchError, ParamflowError};
    pub use crate::exception::ExceptionFilter;
    pub use crate::handler::{FnHandler, RouteHandler};
    pub use crate::param::{
        AnnotationKey, ParamProcessor, ParamProcessorResult, ParamSpec, ResolvedParams,
    };
    pub use crate::registry::DispatcherBuilder;
    pub use crate::trigger::{BeforeDispatchTrigger, ResponseFilter};
    pub use crate::{
        before_dispatch, delete, get, param_processor, patch, post, put, response_filter, routes,
    };
    pub use async_trait::async_trait;
    pub use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
