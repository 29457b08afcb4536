use axum::body::{Body, to_bytes};
use axum::http::{HeaderValue, Request, StatusCode, header};
use paramflow::prelude::*;
use paramflow::trigger::FnTrigger;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn call(router: axum::Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_string(response).await)
}

/// Primitive parameters nobody claims are bound from the query string.
struct Search;

impl Controller for Search {
    fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
        routes
            .get(
                "/search",
                vec![
                    ParamSpec::of::<String>("term"),
                    ParamSpec::of::<i64>("page"),
                    ParamSpec::of::<Option<String>>("sort"),
                ],
                |_, _, mut params| {
                    let term = params.take::<String>(0)?;
                    let page = params.take::<i64>(1)?;
                    let sort = params.take::<Option<String>>(2)?;
                    Ok::<_, DispatchError>(render_text(format!(
                        "{} {} {}",
                        term,
                        page,
                        sort.unwrap_or_else(|| "none".to_string())
                    )))
                },
            )?
            .post("/search", vec![], |_, _, _| {
                Ok::<_, DispatchError>(render_text("posted"))
            })?;
        Ok(())
    }
}

fn search_router() -> axum::Router {
    Dispatcher::builder()
        .register(Search)
        .unwrap()
        .build()
        .into_router()
}

#[tokio::test]
async fn test_default_query_binding() {
    let (status, body) = call(search_router(), "GET", "/search?term=rust&page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "rust 2 none");

    let (_, body) = call(search_router(), "GET", "/search?term=rust&page=2&sort=asc").await;
    assert_eq!(body, "rust 2 asc");
}

#[tokio::test]
async fn test_default_query_binding_rejections() {
    let (status, body) = call(search_router(), "GET", "/search?page=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"code":400,"messages":["Missing parameter: term"]}"#);

    let (status, body) = call(search_router(), "GET", "/search?term=x&page=two").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"code":400,"messages":["Invalid parameter: page"]}"#);
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let (status, body) = call(search_router(), "GET", "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"code":404,"messages":["Not Found"]}"#);

    let (status, _) = call(search_router(), "DELETE", "/search").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) = call(search_router(), "POST", "/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "posted");
}

#[tokio::test]
async fn test_unroutable_method() {
    let (status, body) = call(search_router(), "TRACE", "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"code":404,"messages":["Not Found"]}"#);

    let (status, body) = call(search_router(), "TRACE", "/search").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, r#"{"code":405,"messages":["Method Not Allowed"]}"#);
}

#[tokio::test]
async fn test_head_falls_back_to_get() {
    let (status, _) = call(search_router(), "HEAD", "/search?term=a&page=1").await;
    assert_eq!(status, StatusCode::OK);
}

/// Controller with hooks, declared through the macro.
#[derive(Default)]
struct Guarded {
    filtered: AtomicUsize,
}

#[routes]
impl Guarded {
    #[before_dispatch]
    fn require_token(&self, ctx: &RequestContext) -> Option<Response> {
        match ctx.header("x-token") {
            Some("secret") => None,
            _ => Some(render_error(403, "Forbidden")),
        }
    }

    #[response_filter]
    fn stamp(&self, _ctx: &RequestContext, response: &mut Response) {
        self.filtered.fetch_add(1, Ordering::SeqCst);
        response
            .headers_mut()
            .insert("x-controller", HeaderValue::from_static("guarded"));
    }

    #[param_processor(target = u32)]
    async fn user_id(&self, ctx: &RequestContext) -> ParamProcessorResult {
        match ctx.query().get_first("id").and_then(|id| id.parse::<u32>().ok()) {
            Some(id) => ParamProcessorResult::from_data(id),
            None => ParamProcessorResult::from_web_response(render_errors(
                422,
                vec!["id".to_string(), "must be a number".to_string()],
            )),
        }
    }

    #[get("/users")]
    async fn show(&self, ctx: &RequestContext, id: u32) -> Response {
        render_text(format!("{} {}", ctx.path(), id))
    }

    #[get("/fail")]
    fn fail(&self) -> Result<Response, DispatchError> {
        Err(anyhow::anyhow!("storage unavailable").into())
    }

    #[get("/misconfigured")]
    fn misconfigured(&self) -> paramflow::Result<Response> {
        Err(ParamflowError::Config("no upstream configured".to_string()))
    }

    #[get("/greet")]
    fn greet(&self, _name: String) -> Response {
        render_text(format!("hello {}", _name))
    }
}

async fn guarded_call(dispatcher: &Dispatcher, uri: &str, token: Option<&str>) -> Response {
    let mut request = Request::get(uri);
    if let Some(token) = token {
        request = request.header("x-token", token);
    }
    dispatcher
        .clone()
        .into_router::<()>()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_trigger_short_circuits_and_filter_sees_every_response() {
    let controller = Arc::new(Guarded::default());
    let dispatcher = Dispatcher::builder()
        .register_shared(Arc::clone(&controller))
        .unwrap()
        .build();

    let response = guarded_call(&dispatcher, "/users?id=7", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["x-controller"], "guarded");

    let response = guarded_call(&dispatcher, "/users?id=7", Some("secret")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-controller"], "guarded");
    assert_eq!(body_string(response).await, "/users 7");

    let response = guarded_call(&dispatcher, "/users?id=seven", Some("secret")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_string(response).await,
        r#"{"code":422,"messages":["id","must be a number"]}"#
    );

    assert_eq!(controller.filtered.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_handler_error_goes_through_exception_filter() {
    let dispatcher = Dispatcher::builder().register(Guarded::default()).unwrap().build();
    let response = guarded_call(&dispatcher, "/fail", Some("secret")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_string(response).await,
        r#"{"code":500,"messages":["Internal Server Error"]}"#
    );
}

#[tokio::test]
async fn test_configuration_error_from_handler_is_internal_error() {
    let dispatcher = Dispatcher::builder()
        .register(Guarded::default())
        .unwrap()
        .exception_filter(TeapotFilter)
        .build();
    let response = guarded_call(&dispatcher, "/misconfigured", Some("secret")).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(
        body_string(response).await,
        r#"{"code":418,"messages":["Configuration error: no upstream configured"]}"#
    );
}

#[tokio::test]
async fn test_leading_underscore_is_not_part_of_query_key() {
    let dispatcher = Dispatcher::builder().register(Guarded::default()).unwrap().build();
    let response = guarded_call(&dispatcher, "/greet?name=rust", Some("secret")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "hello rust");
}

struct TeapotFilter;

impl ExceptionFilter for TeapotFilter {
    fn catch(&self, _ctx: &RequestContext, error: DispatchError) -> Response {
        render_error(418, error.to_string())
    }
}

#[tokio::test]
async fn test_custom_exception_filter() {
    let dispatcher = Dispatcher::builder()
        .register(Guarded::default())
        .unwrap()
        .exception_filter(TeapotFilter)
        .build();
    let response = guarded_call(&dispatcher, "/fail", Some("secret")).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(
        body_string(response).await,
        r#"{"code":418,"messages":["storage unavailable"]}"#
    );
}

/// A processor handing out the wrong type is an internal error, not a 400.
struct Liar;

impl Controller for Liar {
    fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
        routes
            .type_processor::<String>(|_, _, _| ParamProcessorResult::from_data(42_i32))?
            .get("/", vec![ParamSpec::of::<String>("name")], |_, _, mut params| {
                Ok::<_, DispatchError>(render_text(params.take::<String>(0)?))
            })?;
        Ok(())
    }
}

#[tokio::test]
async fn test_processor_type_mismatch_is_internal_error() {
    let dispatcher = Dispatcher::builder().register(Liar).unwrap().build();
    let response = dispatcher
        .dispatch(RequestContext::from_target(HttpMethod::Get, "/"))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

struct Maintenance;

impl Controller for Maintenance {
    fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
        routes
            .before_dispatch(FnTrigger::new(|_: &Maintenance, _: &RequestContext| {
                Some(paramflow::redirect("/status"))
            }))
            .get("/", vec![ParamSpec::of::<String>("never")], |_, _, _| {
                Ok::<_, DispatchError>(render_text("unreachable"))
            })?;
        Ok(())
    }
}

#[tokio::test]
async fn test_trigger_runs_before_parameter_resolution() {
    let dispatcher = Dispatcher::builder().register(Maintenance).unwrap().build();
    let response = dispatcher
        .dispatch(RequestContext::from_target(HttpMethod::Get, "/"))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/status");
}

/// Closure hooks registered through the builder.
struct Audited;

impl Controller for Audited {
    fn configure(routes: &mut ControllerBuilder<Self>) -> paramflow::Result<()> {
        routes
            .before_dispatch_fn(|_, ctx| {
                ctx.query()
                    .contains("deny")
                    .then(|| render_error(401, "Unauthorized"))
            })
            .response_filter_fn(|_, ctx, response| {
                let via = if ctx.query().contains("deny") { "trigger" } else { "handler" };
                response
                    .headers_mut()
                    .insert("x-answered-by", HeaderValue::from_static(via));
            })
            .get("/audit", vec![], |_, _, _| {
                Ok::<_, DispatchError>(render_text("audited"))
            })?;
        Ok(())
    }
}

#[tokio::test]
async fn test_closure_trigger_and_filter() {
    let dispatcher = Dispatcher::builder().register(Audited).unwrap().build();

    let response = dispatcher
        .dispatch(RequestContext::from_target(HttpMethod::Get, "/audit?deny=1"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-answered-by"], "trigger");

    let response = dispatcher
        .dispatch(RequestContext::from_target(HttpMethod::Get, "/audit"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-answered-by"], "handler");
    assert_eq!(body_string(response).await, "audited");
}
