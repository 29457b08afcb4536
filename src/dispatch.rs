//! Request dispatch.

use crate::common::{HttpMethod, render_error};
use crate::context::RequestContext;
use crate::controller::Controller;
use crate::error::DispatchError;
use crate::exception::ExceptionFilter;
use crate::handler::RouteHandler;
use crate::registry::DispatcherBuilder;
use crate::resolver::{BoundParam, ParameterResolver, Resolution};
use crate::trigger::{BeforeDispatchTrigger, ResponseFilter};
use async_trait::async_trait;
use axum::response::Response;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RouteKey {
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
}

impl RouteKey {
    pub(crate) fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// A route with its controller type erased.
#[async_trait]
pub(crate) trait Endpoint: Send + Sync {
    async fn call(&self, ctx: &RequestContext) -> Result<Response, DispatchError>;
}

/// State shared by all routes of one registered controller.
pub(crate) struct ControllerState<C: Controller> {
    pub(crate) controller: Arc<C>,
    pub(crate) resolver: ParameterResolver<C>,
    pub(crate) triggers: Vec<Arc<dyn BeforeDispatchTrigger<C>>>,
    pub(crate) filters: Vec<Arc<dyn ResponseFilter<C>>>,
}

pub(crate) struct ControllerEndpoint<C: Controller> {
    pub(crate) state: Arc<ControllerState<C>>,
    pub(crate) label: String,
    pub(crate) params: Vec<BoundParam>,
    pub(crate) handler: Arc<dyn RouteHandler<C>>,
}

impl<C: Controller> ControllerEndpoint<C> {
    async fn invoke(&self, controller: &C, ctx: &RequestContext) -> Result<Response, DispatchError> {
        for trigger in &self.state.triggers {
            if let Some(response) = trigger.before_dispatch(controller, ctx).await {
                tracing::debug!("{}: answered by before-dispatch trigger", self.label);
                return Ok(response);
            }
        }

        let params = match self
            .state
            .resolver
            .resolve_all(controller, &self.params, ctx)
            .await?
        {
            Resolution::Resolved(params) => params,
            Resolution::Rejected(response) => return Ok(response),
        };

        self.handler.call(controller, ctx, params).await
    }
}

#[async_trait]
impl<C: Controller> Endpoint for ControllerEndpoint<C> {
    async fn call(&self, ctx: &RequestContext) -> Result<Response, DispatchError> {
        let controller = self.state.controller.as_ref();
        let mut response = self.invoke(controller, ctx).await?;
        for filter in &self.state.filters {
            filter.filter(controller, ctx, &mut response).await;
        }
        Ok(response)
    }
}

pub(crate) struct DispatchTable {
    pub(crate) routes: BTreeMap<RouteKey, Arc<dyn Endpoint>>,
    pub(crate) exception_filter: Arc<dyn ExceptionFilter>,
}

/// The frozen route table of an application.
///
/// Cheap to clone; all clones share the same table.
///
/// # Example
/// ```
/// use paramflow::prelude::*;
///
/// struct Hello;
///
/// impl Controller for Hello {
///     fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
///         routes.get("/", vec![ParamSpec::of::<String>("name")], |_, _, mut params| {
///             Ok::<_, DispatchError>(render_text(format!("hello {}", params.take::<String>(0)?)))
///         })?;
///         Ok(())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> paramflow::Result<()> {
/// let dispatcher = Dispatcher::builder().register(Hello)?.build();
/// let response = dispatcher
///     .dispatch(RequestContext::from_target(HttpMethod::Get, "/?name=world"))
///     .await;
/// assert_eq!(response.status(), StatusCode::OK);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) table: Arc<DispatchTable>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// All registered routes, ordered by method then path.
    pub fn routes(&self) -> impl Iterator<Item = (HttpMethod, &str)> {
        self.table
            .routes
            .keys()
            .map(|key| (key.method, key.path.as_str()))
    }

    pub fn has_route(&self, method: HttpMethod, path: &str) -> bool {
        self.table.routes.contains_key(&RouteKey::new(method, path))
    }

    fn endpoint(&self, method: HttpMethod, path: &str) -> Option<&Arc<dyn Endpoint>> {
        let found = self.table.routes.get(&RouteKey::new(method, path));
        match (found, method) {
            (None, HttpMethod::Head) => self.table.routes.get(&RouteKey::new(HttpMethod::Get, path)),
            (found, _) => found,
        }
    }

    pub(crate) fn has_path(&self, path: &str) -> bool {
        self.table.routes.keys().any(|key| key.path == path)
    }

    /// Dispatch one request: exact route lookup, triggers, parameter
    /// resolution, handler, response filters.
    ///
    /// Never fails; unknown paths get a 404, known paths with another method a
    /// 405 and internal errors go through the exception filter. `HEAD`
    /// requests fall back to the `GET` route of the same path.
    pub async fn dispatch(&self, ctx: RequestContext) -> Response {
        let Some(endpoint) = self.endpoint(ctx.method(), ctx.path()) else {
            if self.has_path(ctx.path()) {
                tracing::debug!("{} {}: method not allowed", ctx.method(), ctx.path());
                return render_error(405, "Method Not Allowed");
            }
            tracing::debug!("{} {}: no route", ctx.method(), ctx.path());
            return render_error(404, "Not Found");
        };

        tracing::debug!("Dispatching {} {}", ctx.method(), ctx.path());
        match endpoint.call(&ctx).await {
            Ok(response) => response,
            Err(error) => self.table.exception_filter.catch(&ctx, error),
        }
    }
}
