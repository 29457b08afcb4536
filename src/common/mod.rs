pub mod method;
pub mod response;

pub use method::HttpMethod;
pub use response::{ErrorBody, redirect, render_error, render_errors, render_json, render_text};
