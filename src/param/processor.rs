use super::{AnnotationKey, ParamProcessorResult, ParamSpec, TypeKey};
use crate::context::RequestContext;
use crate::controller::Controller;
use async_trait::async_trait;
use std::fmt;

/// What a parameter processor is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorTarget {
    /// Parameters whose declared value type is this type
    Type(TypeKey),
    /// Parameters carrying this marker, whatever their type
    Annotation(AnnotationKey),
}

impl ProcessorTarget {
    pub fn of_type<T: 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    pub fn of_annotation<A: ?Sized + 'static>() -> Self {
        Self::Annotation(AnnotationKey::of::<A>())
    }
}

impl fmt::Display for ProcessorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "type {}", ty),
            Self::Annotation(annotation) => write!(f, "annotation {}", annotation),
        }
    }
}

/// Computes the value of a handler parameter, or rejects the request.
///
/// Processors are registered per controller through
/// [`ControllerBuilder`](crate::controller::ControllerBuilder) and are called
/// with the controller instance, the request being dispatched and the
/// declaration of the parameter being resolved.
///
/// # Example
/// ```
/// use paramflow::prelude::*;
///
/// struct SessionIdProcessor;
///
/// #[async_trait]
/// impl<C: Controller> ParamProcessor<C> for SessionIdProcessor {
///     async fn process(&self, _: &C, ctx: &RequestContext, _: &ParamSpec) -> ParamProcessorResult {
///         match ctx.header("x-session-id") {
///             Some(id) => ParamProcessorResult::from_data(id.to_string()),
///             None => ParamProcessorResult::from_web_response(render_error(401, "No session")),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ParamProcessor<C: Controller>: Send + Sync + 'static {
    async fn process(
        &self,
        controller: &C,
        ctx: &RequestContext,
        param: &ParamSpec,
    ) -> ParamProcessorResult;
}

/// Adapts a synchronous closure into a [`ParamProcessor`].
pub struct FnProcessor<F>(F);

impl<F> FnProcessor<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<C, F> ParamProcessor<C> for FnProcessor<F>
where
    C: Controller,
    F: Fn(&C, &RequestContext, &ParamSpec) -> ParamProcessorResult + Send + Sync + 'static,
{
    async fn process(
        &self,
        controller: &C,
        ctx: &RequestContext,
        param: &ParamSpec,
    ) -> ParamProcessorResult {
        (self.0)(controller, ctx, param)
    }
}
