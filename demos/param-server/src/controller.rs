use paramflow::prelude::*;

/// Marker for parameters that should receive π
pub struct MyAnnotation;

/// Marker for parameters that should receive e
pub struct MyAnnotation2;

#[derive(Default)]
pub struct MyController;

#[routes]
impl MyController {
    #[param_processor(target = String)]
    fn param_upper_q(&self, ctx: &RequestContext, _param: &ParamSpec) -> ParamProcessorResult {
        tracing::info!("param_upper_q");
        match ctx.query().get_first("q") {
            Some(q) => ParamProcessorResult::from_data(q.to_uppercase()),
            None => ParamProcessorResult::from_web_response(render_error(400, "Missing Q")),
        }
    }

    #[param_processor(annotation = MyAnnotation, produces = f64)]
    fn param_annotation(&self) -> ParamProcessorResult {
        tracing::info!("param_annotation");
        ParamProcessorResult::from_data(3.14_f64)
    }

    #[param_processor(annotation = MyAnnotation2, produces = f64)]
    fn param_annotation2(&self) -> ParamProcessorResult {
        tracing::info!("param_annotation2");
        ParamProcessorResult::from_data(2.71828_f64)
    }

    #[get("/")]
    async fn index(&self, q: String) -> Response {
        render_text(q)
    }

    #[get("/annotation")]
    async fn annotation(&self, #[annotated(MyAnnotation)] pi: f64) -> Response {
        render_text(pi.to_string())
    }

    #[get("/annotation2")]
    async fn annotation2(&self, #[annotated(MyAnnotation2)] e: f64) -> Response {
        render_text(e.to_string())
    }
}
