use super::Controller;
use crate::common::HttpMethod;
use crate::context::RequestContext;
use crate::error::{DispatchError, ParamflowError, Result};
use crate::handler::{FnHandler, RouteHandler};
use crate::param::{
    FnProcessor, ParamProcessor, ParamProcessorResult, ParamSpec, ProcessorTarget, ResolvedParams,
    TypeKey,
};
use crate::trigger::{
    BeforeDispatchTrigger, FnResponseFilter, FnTrigger, ResponseFilter,
};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub(crate) struct ProcessorEntry<C: Controller> {
    pub(crate) target: ProcessorTarget,
    /// Type of the values the processor hands out
    pub(crate) output: TypeKey,
    pub(crate) processor: Arc<dyn ParamProcessor<C>>,
}

pub(crate) struct RouteDef<C: Controller> {
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) handler: Arc<dyn RouteHandler<C>>,
}

/// Collects the declarations of one controller
///
/// Handed to [`Controller::configure`]. Duplicate processor targets and
/// duplicate routes are rejected as soon as they are declared; parameter
/// bindings are checked once the whole controller is declared.
///
/// # Example
/// ```
/// use paramflow::prelude::*;
///
/// struct Pi;
///
/// struct MathController;
///
/// impl Controller for MathController {
///     fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
///         routes
///             .annotation_processor::<Pi, f64>(|_, _, _| ParamProcessorResult::from_data(3.14))?
///             .get(
///                 "/pi",
///                 vec![ParamSpec::of::<f64>("pi").annotated::<Pi>()],
///                 |_, _, mut params| Ok::<_, DispatchError>(render_text(params.take::<f64>(0)?.to_string())),
///             )?;
///         Ok(())
///     }
/// }
/// ```
pub struct ControllerBuilder<C: Controller> {
    pub(crate) processors: Vec<ProcessorEntry<C>>,
    pub(crate) routes: Vec<RouteDef<C>>,
    pub(crate) triggers: Vec<Arc<dyn BeforeDispatchTrigger<C>>>,
    pub(crate) filters: Vec<Arc<dyn ResponseFilter<C>>>,
}

impl<C: Controller> Default for ControllerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Controller> ControllerBuilder<C> {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
            routes: Vec::new(),
            triggers: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Register `processor` for every parameter declared as a `T`.
    ///
    /// # Errors
    /// [`ParamflowError::DuplicateProcessor`] if this controller already has a
    /// processor for `T`.
    pub fn processor_for_type<T: Send + 'static>(
        &mut self,
        processor: impl ParamProcessor<C>,
    ) -> Result<&mut Self> {
        self.insert_processor(
            ProcessorTarget::of_type::<T>(),
            TypeKey::of::<T>(),
            Arc::new(processor),
        )
    }

    /// Register `processor` for every parameter carrying the marker `A`. The
    /// processor hands out `T` values, so annotated parameters must be
    /// declared as `T`.
    ///
    /// # Errors
    /// [`ParamflowError::DuplicateProcessor`] if this controller already has a
    /// processor for `A`.
    pub fn processor_for_annotation<A: ?Sized + 'static, T: Send + 'static>(
        &mut self,
        processor: impl ParamProcessor<C>,
    ) -> Result<&mut Self> {
        self.insert_processor(
            ProcessorTarget::of_annotation::<A>(),
            TypeKey::of::<T>(),
            Arc::new(processor),
        )
    }

    /// Closure flavour of [`processor_for_type`](Self::processor_for_type).
    pub fn type_processor<T: Send + 'static>(
        &mut self,
        f: impl Fn(&C, &RequestContext, &ParamSpec) -> ParamProcessorResult + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        self.processor_for_type::<T>(FnProcessor::new(f))
    }

    /// Closure flavour of [`processor_for_annotation`](Self::processor_for_annotation).
    pub fn annotation_processor<A: ?Sized + 'static, T: Send + 'static>(
        &mut self,
        f: impl Fn(&C, &RequestContext, &ParamSpec) -> ParamProcessorResult + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        self.processor_for_annotation::<A, T>(FnProcessor::new(f))
    }

    fn insert_processor(
        &mut self,
        target: ProcessorTarget,
        output: TypeKey,
        processor: Arc<dyn ParamProcessor<C>>,
    ) -> Result<&mut Self> {
        if self.processors.iter().any(|entry| entry.target == target) {
            return Err(ParamflowError::DuplicateProcessor {
                controller: C::name(),
                target,
            });
        }
        tracing::debug!("{}: parameter processor for {}", C::name(), target);
        self.processors.push(ProcessorEntry {
            target,
            output,
            processor,
        });
        Ok(self)
    }

    /// Declare a route.
    ///
    /// # Errors
    /// [`ParamflowError::InvalidPath`] unless `path` starts with `/`, and
    /// [`ParamflowError::DuplicateRoute`] if the controller already declared
    /// the same method and path.
    pub fn route(
        &mut self,
        method: HttpMethod,
        path: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: impl RouteHandler<C>,
    ) -> Result<&mut Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(ParamflowError::InvalidPath(path));
        }
        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.path == path)
        {
            return Err(ParamflowError::DuplicateRoute { method, path });
        }
        self.routes.push(RouteDef {
            method,
            path,
            params,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Declare a `GET` route served by a synchronous closure.
    pub fn get<R: IntoResponse>(
        &mut self,
        path: impl Into<String>,
        params: Vec<ParamSpec>,
        f: impl Fn(&C, &RequestContext, ResolvedParams) -> std::result::Result<R, DispatchError>
        + Send
        + Sync
        + 'static,
    ) -> Result<&mut Self> {
        self.route(HttpMethod::Get, path, params, FnHandler::new(f))
    }

    /// Declare a `POST` route served by a synchronous closure.
    pub fn post<R: IntoResponse>(
        &mut self,
        path: impl Into<String>,
        params: Vec<ParamSpec>,
        f: impl Fn(&C, &RequestContext, ResolvedParams) -> std::result::Result<R, DispatchError>
        + Send
        + Sync
        + 'static,
    ) -> Result<&mut Self> {
        self.route(HttpMethod::Post, path, params, FnHandler::new(f))
    }

    pub fn before_dispatch(&mut self, trigger: impl BeforeDispatchTrigger<C>) -> &mut Self {
        self.triggers.push(Arc::new(trigger));
        self
    }

    /// Closure flavour of [`before_dispatch`](Self::before_dispatch).
    pub fn before_dispatch_fn(
        &mut self,
        f: impl Fn(&C, &RequestContext) -> Option<Response> + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_dispatch(FnTrigger::new(f))
    }

    pub fn response_filter(&mut self, filter: impl ResponseFilter<C>) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Closure flavour of [`response_filter`](Self::response_filter).
    pub fn response_filter_fn(
        &mut self,
        f: impl Fn(&C, &RequestContext, &mut Response) + Send + Sync + 'static,
    ) -> &mut Self {
        self.response_filter(FnResponseFilter::new(f))
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Parameters declared for `method` `path`, if that route exists.
    pub fn route_params(&self, method: HttpMethod, path: &str) -> Option<&[ParamSpec]> {
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
            .map(|route| route.params.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::render_text;

    struct Marker;

    struct TestController;

    impl Controller for TestController {
        fn configure(_: &mut ControllerBuilder<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn data(value: &'static str) -> ParamProcessorResult {
        ParamProcessorResult::from_data(value.to_string())
    }

    #[test]
    fn test_duplicate_type_processor_is_rejected() {
        let mut routes = ControllerBuilder::<TestController>::new();
        routes.type_processor::<String>(|_, _, _| data("a")).unwrap();
        let err = routes
            .type_processor::<String>(|_, _, _| data("b"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ParamflowError::DuplicateProcessor {
                target: ProcessorTarget::Type(_),
                ..
            }
        ));
        assert_eq!(routes.processor_count(), 1);
    }

    #[test]
    fn test_duplicate_annotation_processor_is_rejected() {
        let mut routes = ControllerBuilder::<TestController>::new();
        routes
            .annotation_processor::<Marker, f64>(|_, _, _| ParamProcessorResult::from_data(1.0))
            .unwrap();
        let err = routes
            .annotation_processor::<Marker, String>(|_, _, _| data("x"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("annotation"));
    }

    #[test]
    fn test_same_type_for_type_and_annotation_targets_coexist() {
        let mut routes = ControllerBuilder::<TestController>::new();
        routes
            .type_processor::<f64>(|_, _, _| ParamProcessorResult::from_data(1.0))
            .unwrap()
            .annotation_processor::<Marker, f64>(|_, _, _| ParamProcessorResult::from_data(2.0))
            .unwrap();
        assert_eq!(routes.processor_count(), 2);
    }

    #[test]
    fn test_route_validation() {
        let mut routes = ControllerBuilder::<TestController>::new();
        routes
            .get("/", vec![], |_, _, _| Ok(render_text("ok")))
            .unwrap()
            .post("/", vec![], |_, _, _| Ok(render_text("ok")))
            .unwrap();

        let err = routes
            .get("/", vec![], |_, _, _| Ok(render_text("again")))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ParamflowError::DuplicateRoute {
                method: HttpMethod::Get,
                ..
            }
        ));

        let err = routes
            .get("relative", vec![], |_, _, _| Ok(render_text("no")))
            .err()
            .unwrap();
        assert!(matches!(err, ParamflowError::InvalidPath(path) if path == "relative"));
        assert_eq!(routes.route_count(), 2);
    }

    #[test]
    fn test_route_params_are_kept_in_order() {
        let mut routes = ControllerBuilder::<TestController>::new();
        routes
            .get(
                "/pi",
                vec![
                    ParamSpec::of::<f64>("pi").annotated::<Marker>(),
                    ParamSpec::of::<String>("q"),
                ],
                |_, _, _| Ok(render_text("ok")),
            )
            .unwrap();

        let params = routes.route_params(HttpMethod::Get, "/pi").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "pi");
        assert!(params[0].has_annotation::<Marker>());
        assert_eq!(params[1].ty(), TypeKey::of::<String>());
        assert!(routes.route_params(HttpMethod::Post, "/pi").is_none());
    }

    #[test]
    fn test_closure_hooks_are_collected() {
        let mut routes = ControllerBuilder::<TestController>::new();
        routes
            .before_dispatch_fn(|_, _| None)
            .response_filter_fn(|_, _, _| {})
            .response_filter_fn(|_, _, _| {});
        assert_eq!(routes.triggers.len(), 1);
        assert_eq!(routes.filters.len(), 2);
    }
}
