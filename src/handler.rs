use crate::context::RequestContext;
use crate::controller::Controller;
use crate::error::DispatchError;
use crate::param::ResolvedParams;
use async_trait::async_trait;
use axum::response::{IntoResponse, Response};

/// The body of a route, invoked once all of its parameters resolved.
///
/// `#[routes]` generates an implementation per handler method; hand-written
/// controllers can implement it directly or wrap a closure in [`FnHandler`].
#[async_trait]
pub trait RouteHandler<C: Controller>: Send + Sync + 'static {
    async fn call(
        &self,
        controller: &C,
        ctx: &RequestContext,
        params: ResolvedParams,
    ) -> Result<Response, DispatchError>;
}

/// Adapts a synchronous closure into a [`RouteHandler`].
///
/// # Example
/// ```
/// use paramflow::prelude::*;
///
/// struct SearchController;
///
/// impl Controller for SearchController {
///     fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
///         routes.route(
///             HttpMethod::Get,
///             "/search",
///             vec![ParamSpec::of::<String>("q")],
///             FnHandler::new(|_: &Self, _: &RequestContext, mut params: ResolvedParams| {
///                 let q: String = params.take(0)?;
///                 Ok::<_, DispatchError>(render_text(q))
///             }),
///         )?;
///         Ok(())
///     }
/// }
/// ```
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<C, F, R> RouteHandler<C> for FnHandler<F>
where
    C: Controller,
    F: Fn(&C, &RequestContext, ResolvedParams) -> Result<R, DispatchError>
        + Send
        + Sync
        + 'static,
    R: IntoResponse,
{
    async fn call(
        &self,
        controller: &C,
        ctx: &RequestContext,
        params: ResolvedParams,
    ) -> Result<Response, DispatchError> {
        (self.0)(controller, ctx, params).map(IntoResponse::into_response)
    }
}
