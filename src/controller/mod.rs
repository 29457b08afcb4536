//! Controllers and their registration.
//!
//! A controller groups routes together with the parameter processors and
//! triggers those routes share. Controllers declare everything in
//! [`Controller::configure`], either by hand or through the `#[routes]`
//! macro, which generates the same builder calls from an `impl` block:
//!
//! ```rust,ignore
//! #[routes]
//! impl SearchController {
//!     #[param_processor(target = String)]
//!     fn upper_q(&self, ctx: &RequestContext, _param: &ParamSpec) -> ParamProcessorResult {
//!         match ctx.query().get_first("q") {
//!             Some(q) => ParamProcessorResult::from_data(q.to_uppercase()),
//!             None => ParamProcessorResult::from_web_response(render_error(400, "Missing Q")),
//!         }
//!     }
//!
//!     #[get("/")]
//!     async fn index(&self, q: String) -> Response {
//!         render_text(q)
//!     }
//! }
//! ```

mod builder;

pub use builder::ControllerBuilder;
pub(crate) use builder::ProcessorEntry;

use crate::error::Result;

/// A type grouping related route handlers and parameter processors.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Declare routes, processors and triggers. Called exactly once, when the
    /// controller is registered.
    fn configure(routes: &mut ControllerBuilder<Self>) -> Result<()>;

    /// Name used in logs and configuration errors
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
