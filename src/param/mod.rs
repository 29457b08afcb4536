//! Handler parameters and the values produced for them.
//!
//! A route declares its parameters as a list of [`ParamSpec`]s. During a
//! dispatch each spec is resolved into a [`ParamValue`], either by a
//! registered [`ParamProcessor`] or by the default query binding, and the
//! values are handed to the handler as [`ResolvedParams`].

use crate::error::DispatchError;
use axum::response::{IntoResponse, Response};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

pub(crate) mod binder;
mod processor;

pub use processor::{FnProcessor, ParamProcessor, ProcessorTarget};

/// Identity of a Rust type, with its name kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A marker attached to a handler parameter.
///
/// Any `'static` type can serve as a marker; unit structs are the usual choice:
///
/// ```
/// use paramflow::param::{AnnotationKey, ParamSpec};
///
/// struct CurrentUser;
///
/// let spec = ParamSpec::of::<String>("user").annotated::<CurrentUser>();
/// assert!(spec.annotations().contains(&AnnotationKey::of::<CurrentUser>()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationKey(TypeKey);

impl AnnotationKey {
    pub fn of<A: ?Sized + 'static>() -> Self {
        Self(TypeKey::of::<A>())
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[{}]", self.0.name())
    }
}

/// Declaration of one handler parameter: its name, value type and markers.
///
/// The name doubles as the query parameter key when the value is bound by the
/// default query binding.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    ty: TypeKey,
    annotations: Vec<AnnotationKey>,
}

impl ParamSpec {
    pub fn of<T: Send + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeKey::of::<T>(),
            annotations: Vec::new(),
        }
    }

    /// Attach the marker `A`. Attaching the same marker twice has no effect.
    pub fn annotated<A: ?Sized + 'static>(self) -> Self {
        self.with_annotation(AnnotationKey::of::<A>())
    }

    pub fn with_annotation(mut self, annotation: AnnotationKey) -> Self {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    pub fn annotations(&self) -> &[AnnotationKey] {
        &self.annotations
    }

    pub fn has_annotation<A: ?Sized + 'static>(&self) -> bool {
        self.annotations.contains(&AnnotationKey::of::<A>())
    }
}

/// A type-erased parameter value that remembers its concrete type.
pub struct ParamValue {
    ty: TypeKey,
    value: Box<dyn Any + Send>,
}

impl ParamValue {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            ty: TypeKey::of::<T>(),
            value: Box::new(value),
        }
    }

    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Move the value out, or get it back unchanged if it is not a `T`.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let ty = self.ty;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { ty, value }),
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamValue<{}>", self.ty)
    }
}

/// Outcome of running a parameter processor
///
/// Either the value to hand to the handler, or a response that ends the
/// dispatch before the handler runs.
pub enum ParamProcessorResult {
    Data(ParamValue),
    WebResponse(Response),
}

impl ParamProcessorResult {
    pub fn from_data<T: Send + 'static>(data: T) -> Self {
        Self::Data(ParamValue::new(data))
    }

    pub fn from_web_response(response: impl IntoResponse) -> Self {
        Self::WebResponse(response.into_response())
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

impl fmt::Debug for ParamProcessorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::WebResponse(response) => f
                .debug_tuple("WebResponse")
                .field(&response.status())
                .finish(),
        }
    }
}

/// The values resolved for one handler invocation, in declaration order.
#[derive(Debug, Default)]
pub struct ResolvedParams {
    slots: Vec<(String, Option<ParamValue>)>,
}

impl ResolvedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: ParamValue) {
        self.slots.push((name.into(), Some(value)));
    }

    /// Move the value at `index` out as a `T`.
    ///
    /// # Errors
    /// [`DispatchError::MissingArgument`] if the slot is absent or already
    /// taken, [`DispatchError::TypeMismatch`] if the value is not a `T`. A
    /// mismatched value stays in its slot.
    pub fn take<T: 'static>(&mut self, index: usize) -> Result<T, DispatchError> {
        let (name, slot) = self
            .slots
            .get_mut(index)
            .ok_or(DispatchError::MissingArgument { index })?;
        let value = slot.take().ok_or(DispatchError::MissingArgument { index })?;
        value.downcast::<T>().map_err(|value| {
            let actual = value.ty().name();
            *slot = Some(value);
            DispatchError::TypeMismatch {
                param: name.clone(),
                expected: std::any::type_name::<T>(),
                actual,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
