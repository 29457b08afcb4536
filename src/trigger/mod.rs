//! Controller-level hooks around a dispatch.
//!
//! A [`BeforeDispatchTrigger`] runs before any parameter is resolved and may
//! answer the request itself. A [`ResponseFilter`] sees every response the
//! controller's routes produce, whether it came from the handler, a processor
//! or a trigger.

use crate::context::RequestContext;
use crate::controller::Controller;
use async_trait::async_trait;
use axum::response::Response;

#[async_trait]
pub trait BeforeDispatchTrigger<C: Controller>: Send + Sync + 'static {
    /// `Some(response)` ends the dispatch with that response.
    async fn before_dispatch(&self, controller: &C, ctx: &RequestContext) -> Option<Response>;
}

#[async_trait]
pub trait ResponseFilter<C: Controller>: Send + Sync + 'static {
    async fn filter(&self, controller: &C, ctx: &RequestContext, response: &mut Response);
}

/// Adapts a synchronous closure into a [`BeforeDispatchTrigger`].
pub struct FnTrigger<F>(F);

impl<F> FnTrigger<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<C, F> BeforeDispatchTrigger<C> for FnTrigger<F>
where
    C: Controller,
    F: Fn(&C, &RequestContext) -> Option<Response> + Send + Sync + 'static,
{
    async fn before_dispatch(&self, controller: &C, ctx: &RequestContext) -> Option<Response> {
        (self.0)(controller, ctx)
    }
}

/// Adapts a synchronous closure into a [`ResponseFilter`].
pub struct FnResponseFilter<F>(F);

impl<F> FnResponseFilter<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<C, F> ResponseFilter<C> for FnResponseFilter<F>
where
    C: Controller,
    F: Fn(&C, &RequestContext, &mut Response) + Send + Sync + 'static,
{
    async fn filter(&self, controller: &C, ctx: &RequestContext, response: &mut Response) {
        (self.0)(controller, ctx, response)
    }
}
