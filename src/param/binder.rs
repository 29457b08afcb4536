//! Default binding of primitive parameters from the query string.
//!
//! Used for parameters that no processor claims. The parameter name is the
//! query key and the first value wins.

use super::{ParamProcessorResult, TypeKey};
use crate::common::render_error;
use crate::context::QueryParams;
use std::any::TypeId;
use std::str::FromStr;

pub(crate) type BindFn = fn(&QueryParams, &str) -> ParamProcessorResult;

/// Binder for `ty`, if it is a string, a primitive, or an `Option` of either.
pub(crate) fn default_binder(ty: TypeKey) -> Option<BindFn> {
    macro_rules! bindable {
        ($($t:ty),* $(,)?) => {
            $(
                if ty.id() == TypeId::of::<$t>() {
                    return Some(required::<$t> as BindFn);
                }
                if ty.id() == TypeId::of::<Option<$t>>() {
                    return Some(optional::<$t> as BindFn);
                }
            )*
        };
    }

    bindable!(
        String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
        f64,
    );
    None
}

fn required<T: FromStr + Send + 'static>(query: &QueryParams, name: &str) -> ParamProcessorResult {
    let Some(raw) = query.get_first(name) else {
        tracing::debug!("Missing query parameter '{}'", name);
        return reject(format!("Missing parameter: {}", name));
    };
    match raw.parse::<T>() {
        Ok(value) => ParamProcessorResult::from_data(value),
        Err(_) => invalid::<T>(name),
    }
}

fn optional<T: FromStr + Send + 'static>(query: &QueryParams, name: &str) -> ParamProcessorResult {
    match query.get_first(name).map(str::parse::<T>) {
        None => ParamProcessorResult::from_data(None::<T>),
        Some(Ok(value)) => ParamProcessorResult::from_data(Some(value)),
        Some(Err(_)) => invalid::<T>(name),
    }
}

fn invalid<T>(name: &str) -> ParamProcessorResult {
    tracing::debug!(
        "Query parameter '{}' is not a valid {}",
        name,
        std::any::type_name::<T>()
    );
    reject(format!("Invalid parameter: {}", name))
}

fn reject(message: String) -> ParamProcessorResult {
    ParamProcessorResult::from_web_response(render_error(400, message))
}
