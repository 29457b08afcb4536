use proc_macro::TokenStream;

mod http_methods;
mod routes;

/// Attribute macro turning an impl block into a [`Controller`] implementation
///
/// Methods marked with `#[get]`, `#[post]`, `#[put]`, `#[delete]` or `#[patch]`
/// become routes. Their parameters, other than `&self` and `&RequestContext`,
/// are declared in order and resolved before the method runs. A parameter can
/// carry markers with `#[annotated(Marker)]`. A parameter named `_q` is bound
/// to the query key `q`.
///
/// A route returning a `Result` hands its error to the dispatcher's exception
/// filter. The error type must convert into `DispatchError`, as
/// `DispatchError`, `anyhow::Error` and `ParamflowError` do.
///
/// `#[param_processor(target = T)]` registers a processor for every parameter
/// declared as `T`; `#[param_processor(annotation = A, produces = T)]` one for
/// every parameter marked with `A`. `#[before_dispatch]` and
/// `#[response_filter]` register controller-level hooks.
///
/// # Example
/// ```ignore
/// pub struct Pi;
///
/// #[routes]
/// impl MyController {
///     #[param_processor(annotation = Pi, produces = f64)]
///     fn pi(&self) -> ParamProcessorResult {
///         ParamProcessorResult::from_data(3.14)
///     }
///
///     #[get("/pi")]
///     async fn pi_value(&self, #[annotated(Pi)] pi: f64) -> Response {
///         render_text(pi.to_string())
///     }
/// }
/// ```
///
/// [`Controller`]: https://docs.rs/paramflow/latest/paramflow/controller/trait.Controller.html
#[proc_macro_attribute]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::routes_attribute(attr, item)
}

/// HTTP GET method attribute for controller methods
#[proc_macro_attribute]
pub fn get(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// HTTP POST method attribute for controller methods
#[proc_macro_attribute]
pub fn post(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// HTTP PUT method attribute for controller methods
#[proc_macro_attribute]
pub fn put(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// HTTP DELETE method attribute for controller methods
#[proc_macro_attribute]
pub fn delete(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// HTTP PATCH method attribute for controller methods
#[proc_macro_attribute]
pub fn patch(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// Marks a controller method as a parameter processor
///
/// # Example
/// ```ignore
/// #[param_processor(target = String)]
/// fn upper_q(&self, ctx: &RequestContext, param: &ParamSpec) -> ParamProcessorResult { ... }
/// ```
#[proc_macro_attribute]
pub fn param_processor(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// Marks a controller method run before every dispatch of the controller
///
/// The method takes `(&self, &RequestContext)` and returns
/// `Option<Response>`; `Some` answers the request.
#[proc_macro_attribute]
pub fn before_dispatch(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}

/// Marks a controller method that sees every response of the controller
///
/// The method takes `(&self, &RequestContext, &mut Response)`.
#[proc_macro_attribute]
pub fn response_filter(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::marker_attribute(attr, item)
}
