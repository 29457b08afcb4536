//! Parameter resolution.
//!
//! Which source feeds a parameter is decided once, when the controller is
//! registered ([`select_binding`]). Every dispatch then only follows the
//! pre-computed [`ParamBinding`]s in declaration order.

use crate::context::RequestContext;
use crate::controller::{Controller, ProcessorEntry};
use crate::error::{DispatchError, ParamflowError, Result};
use crate::param::binder::{BindFn, default_binder};
use crate::param::{ParamProcessorResult, ParamSpec, ProcessorTarget, ResolvedParams};
use axum::response::Response;

/// Where the value of a parameter comes from.
#[derive(Clone, Copy)]
pub(crate) enum ParamBinding {
    /// Index into the controller's processor table
    Processor(usize),
    /// Same-named query parameter
    Query(BindFn),
}

/// A declared parameter together with its binding.
pub(crate) struct BoundParam {
    pub(crate) spec: ParamSpec,
    pub(crate) binding: ParamBinding,
}

pub(crate) enum Resolution {
    Resolved(ResolvedParams),
    /// A processor answered the request itself
    Rejected(Response),
}

/// Pick the source for `spec`.
///
/// Annotation processors take precedence over a processor registered for the
/// declared type, which takes precedence over the default query binding.
pub(crate) fn select_binding<C: Controller>(
    processors: &[ProcessorEntry<C>],
    route: &str,
    spec: &ParamSpec,
) -> Result<ParamBinding> {
    let position =
        |target: ProcessorTarget| processors.iter().position(|entry| entry.target == target);

    let matched: Vec<_> = spec
        .annotations()
        .iter()
        .filter_map(|annotation| {
            position(ProcessorTarget::Annotation(*annotation)).map(|index| (index, *annotation))
        })
        .collect();

    match matched.as_slice() {
        [] => {}
        [(index, annotation)] => {
            let produced = processors[*index].output;
            if produced != spec.ty() {
                return Err(ParamflowError::ProcessorOutputMismatch {
                    route: route.to_string(),
                    param: spec.name().to_string(),
                    annotation: *annotation,
                    produced: produced.name(),
                    declared: spec.ty().name(),
                });
            }
            tracing::debug!("{}: '{}' bound to {}", route, spec.name(), annotation);
            return Ok(ParamBinding::Processor(*index));
        }
        many => {
            return Err(ParamflowError::AmbiguousProcessor {
                route: route.to_string(),
                param: spec.name().to_string(),
                annotations: many
                    .iter()
                    .map(|(_, annotation)| annotation.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }

    if let Some(index) = position(ProcessorTarget::Type(spec.ty())) {
        tracing::debug!("{}: '{}' bound to type {}", route, spec.name(), spec.ty());
        return Ok(ParamBinding::Processor(index));
    }

    if let Some(bind) = default_binder(spec.ty()) {
        tracing::debug!("{}: '{}' bound to the query string", route, spec.name());
        return Ok(ParamBinding::Query(bind));
    }

    Err(ParamflowError::UnresolvableParameter {
        route: route.to_string(),
        param: spec.name().to_string(),
        type_name: spec.ty().name(),
    })
}

/// Resolves the parameters of one controller's routes.
pub(crate) struct ParameterResolver<C: Controller> {
    processors: Vec<ProcessorEntry<C>>,
}

impl<C: Controller> ParameterResolver<C> {
    pub(crate) fn new(processors: Vec<ProcessorEntry<C>>) -> Self {
        Self { processors }
    }

    /// Produce the value for a single parameter.
    pub(crate) async fn resolve(
        &self,
        controller: &C,
        param: &BoundParam,
        ctx: &RequestContext,
    ) -> ParamProcessorResult {
        match param.binding {
            ParamBinding::Processor(index) => {
                self.processors[index]
                    .processor
                    .process(controller, ctx, &param.spec)
                    .await
            }
            ParamBinding::Query(bind) => bind(ctx.query(), param.spec.name()),
        }
    }

    /// Resolve `params` in order, stopping at the first processor that
    /// answers with a response.
    pub(crate) async fn resolve_all(
        &self,
        controller: &C,
        params: &[BoundParam],
        ctx: &RequestContext,
    ) -> std::result::Result<Resolution, DispatchError> {
        let mut resolved = ResolvedParams::new();
        for param in params {
            match self.resolve(controller, param, ctx).await {
                ParamProcessorResult::Data(value) => {
                    if value.ty() != param.spec.ty() {
                        return Err(DispatchError::TypeMismatch {
                            param: param.spec.name().to_string(),
                            expected: param.spec.ty().name(),
                            actual: value.ty().name(),
                        });
                    }
                    resolved.push(param.spec.name(), value);
                }
                ParamProcessorResult::WebResponse(response) => {
                    tracing::debug!(
                        "Parameter '{}' rejected {} {} with {}",
                        param.spec.name(),
                        ctx.method(),
                        ctx.path(),
                        response.status()
                    );
                    return Ok(Resolution::Rejected(response));
                }
            }
        }
        Ok(Resolution::Resolved(resolved))
    }
}
