//! Controller registry.
//!
//! Registration runs each controller's `configure` exactly once, binds every
//! declared parameter to its source and merges the routes into a single
//! table. Any inconsistency is reported as a [`ParamflowError`] before the
//! first request can be served.

use crate::controller::{Controller, ControllerBuilder};
use crate::dispatch::{
    ControllerEndpoint, ControllerState, DispatchTable, Dispatcher, Endpoint, RouteKey,
};
use crate::error::{ParamflowError, Result};
use crate::exception::{ExceptionFilter, http::JsonExceptionFilter};
use crate::resolver::{BoundParam, ParameterResolver, select_binding};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builder for a [`Dispatcher`]
///
/// # Example
/// ```rust,ignore
/// let dispatcher = Dispatcher::builder()
///     .register(UserController::new(db))?
///     .register(HealthController)?
///     .exception_filter(MyExceptionFilter)
///     .build();
/// ```
pub struct DispatcherBuilder {
    routes: BTreeMap<RouteKey, Arc<dyn Endpoint>>,
    controllers: Vec<&'static str>,
    exception_filter: Arc<dyn ExceptionFilter>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
            controllers: Vec::new(),
            exception_filter: Arc::new(JsonExceptionFilter),
        }
    }

    /// Register a controller instance.
    ///
    /// # Errors
    /// Any configuration error raised by the controller's declarations, and
    /// [`ParamflowError::DuplicateRoute`] if one of its routes is already
    /// served by a previously registered controller.
    pub fn register<C: Controller>(self, controller: C) -> Result<Self> {
        self.register_shared(Arc::new(controller))
    }

    /// Register a controller instance that is also used elsewhere.
    pub fn register_shared<C: Controller>(mut self, controller: Arc<C>) -> Result<Self> {
        let mut builder = ControllerBuilder::<C>::new();
        C::configure(&mut builder)?;
        let endpoints = bind_controller(builder, controller)?;

        if let Some((key, _)) = endpoints
            .iter()
            .find(|(key, _)| self.routes.contains_key(key))
        {
            return Err(ParamflowError::DuplicateRoute {
                method: key.method,
                path: key.path.clone(),
            });
        }

        tracing::info!(
            "Registered {} ({} routes)",
            C::name(),
            endpoints.len()
        );
        self.routes.extend(endpoints);
        self.controllers.push(C::name());
        Ok(self)
    }

    /// Replace the filter turning internal dispatch errors into responses.
    pub fn exception_filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.exception_filter = Arc::new(filter);
        self
    }

    pub fn controllers(&self) -> &[&'static str] {
        &self.controllers
    }

    pub fn build(self) -> Dispatcher {
        for key in self.routes.keys() {
            tracing::debug!("Route {} {}", key.method, key.path);
        }
        Dispatcher {
            table: Arc::new(DispatchTable {
                routes: self.routes,
                exception_filter: self.exception_filter,
            }),
        }
    }
}

fn bind_controller<C: Controller>(
    builder: ControllerBuilder<C>,
    controller: Arc<C>,
) -> Result<Vec<(RouteKey, Arc<dyn Endpoint>)>> {
    let ControllerBuilder {
        processors,
        routes,
        triggers,
        filters,
    } = builder;

    let mut bound_routes = Vec::with_capacity(routes.len());
    for route in routes {
        let label = format!("{} {}", route.method, route.path);
        let params = route
            .params
            .into_iter()
            .map(|spec| {
                let binding = select_binding(&processors, &label, &spec)?;
                Ok(BoundParam { spec, binding })
            })
            .collect::<Result<Vec<_>>>()?;
        bound_routes.push((route.method, route.path, label, params, route.handler));
    }

    let state = Arc::new(ControllerState {
        controller,
        resolver: ParameterResolver::new(processors),
        triggers,
        filters,
    });

    Ok(bound_routes
        .into_iter()
        .map(|(method, path, label, params, handler)| {
            let endpoint: Arc<dyn Endpoint> = Arc::new(ControllerEndpoint {
                state: Arc::clone(&state),
                label,
                params,
                handler,
            });
            (RouteKey::new(method, path), endpoint)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{HttpMethod, render_text};
    use crate::error::DispatchError;
    use crate::param::{ParamProcessorResult, ParamSpec};

    struct Home;

    impl Controller for Home {
        fn configure(routes: &mut ControllerBuilder<Self>) -> Result<()> {
            routes.get("/", vec![], |_, _, _| Ok(render_text("home")))?;
            Ok(())
        }
    }

    struct AnotherHome;

    impl Controller for AnotherHome {
        fn configure(routes: &mut ControllerBuilder<Self>) -> Result<()> {
            routes
                .post("/", vec![], |_, _, _| Ok(render_text("post")))?
                .get("/", vec![], |_, _, _| Ok(render_text("clash")))?;
            Ok(())
        }
    }

    struct Unresolvable;

    impl Controller for Unresolvable {
        fn configure(routes: &mut ControllerBuilder<Self>) -> Result<()> {
            routes.get(
                "/bytes",
                vec![ParamSpec::of::<Vec<u8>>("raw")],
                |_, _, _| Ok::<_, DispatchError>(render_text("never")),
            )?;
            Ok(())
        }
    }

    struct DuplicateProcessors;

    impl Controller for DuplicateProcessors {
        fn configure(routes: &mut ControllerBuilder<Self>) -> Result<()> {
            routes
                .type_processor::<String>(|_, _, _| ParamProcessorResult::from_data(String::new()))?
                .type_processor::<String>(|_, _, _| ParamProcessorResult::from_data(String::new()))?;
            Ok(())
        }
    }

    #[test]
    fn test_register_builds_route_table() {
        let dispatcher = Dispatcher::builder().register(Home).unwrap().build();
        assert!(dispatcher.has_route(HttpMethod::Get, "/"));
        assert!(!dispatcher.has_route(HttpMethod::Post, "/"));
        assert_eq!(dispatcher.routes().collect::<Vec<_>>(), vec![(HttpMethod::Get, "/")]);
    }

    #[test]
    fn test_duplicate_route_across_controllers() {
        let err = Dispatcher::builder()
            .register(Home)
            .unwrap()
            .register(AnotherHome)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ParamflowError::DuplicateRoute {
                method: HttpMethod::Get,
                ..
            }
        ));
    }

    #[test]
    fn test_unresolvable_parameter_fails_registration() {
        let err = Dispatcher::builder().register(Unresolvable).err().unwrap();
        assert!(err.to_string().contains("raw"));
    }

    #[test]
    fn test_duplicate_processor_fails_registration() {
        let err = Dispatcher::builder()
            .register(DuplicateProcessors)
            .err()
            .unwrap();
        assert!(matches!(err, ParamflowError::DuplicateProcessor { .. }));
    }

    #[test]
    fn test_controllers_are_recorded() {
        let builder = Dispatcher::builder().register(Home).unwrap();
        assert_eq!(builder.controllers().len(), 1);
        assert!(builder.controllers()[0].ends_with("Home"));
    }
}
