//! Constructors and their signatures.
//!
//! A [`Constructor`] describes its own parameters and results as
//! [`Signature`] trees and can be called with [`Arguments`] read from
//! the container, emitting [`Outputs`] in result-leaf order.
//!
//! Two implementations ship:
//! - [`FnConstructor`]: a closure plus explicitly declared descriptors.
//! - [`Typed`]: a function from a `#[derive(In)]` object to a
//!   `#[derive(Out)]` object.
//!
//! # Examples
//! ```rust
//! use binaa_container::constructor::{FnConstructor, Outputs};
//! use binaa_container::param::Param;
//! use binaa_container::result::ResultItem;
//!
//! #[derive(Clone)]
//! struct Config { url: String }
//! #[derive(Clone)]
//! struct Database { url: String }
//!
//! let ctor = FnConstructor::new(|args| {
//!     let config: Config = args.next()?;
//!     Ok(Outputs::new().with(Database { url: config.url }))
//! })
//! .with_name("new_database")
//! .param(Param::of::<Config>())
//! .result(ResultItem::of::<Database>());
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{BinaaError, BoxError, Result};
use crate::param::{Param, ParamField, ParamList};
use crate::result::{ResultField, ResultItem, ResultList};

/// A type-erased value held by the container.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Parameters and results of a constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: ParamList,
    pub results: ResultList,
}

/// Something the container can register and later call.
///
/// This is the seam that replaces runtime reflection: a constructor
/// reports its own shape instead of being inspected.
pub trait Constructor: Send + Sync + 'static {
    /// Human-readable function name used in locations.
    fn name(&self) -> &str;

    /// Describes parameters and results, or fails if the shape is
    /// unsupported.
    fn describe(&self) -> Result<Signature>;

    /// Builds values from arguments in parameter-leaf order, returning
    /// one value per result leaf.
    fn call(&self, args: &mut Arguments) -> std::result::Result<Outputs, BoxError>;
}

/// One resolved parameter leaf.
#[derive(Clone)]
pub enum Argument {
    /// Value of a single parameter; `None` for a missing optional.
    Single(Option<Value>),
    /// All values of a group, in registration order.
    Group(Vec<Value>),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Single(value) => write!(f, "Single(present={})", value.is_some()),
            Argument::Group(values) => write!(f, "Group(len={})", values.len()),
        }
    }
}

/// Arguments of a single call, consumed front to back.
#[derive(Debug, Default)]
pub struct Arguments {
    args: Vec<Argument>,
    cursor: usize,
}

impl Arguments {
    pub fn new(args: Vec<Argument>) -> Self {
        Self { args, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Number of arguments not read yet.
    pub fn remaining(&self) -> usize {
        self.args.len() - self.cursor
    }

    fn advance(&mut self) -> Result<&Argument> {
        let position = self.cursor;
        let arg = self.args.get(position).ok_or_else(|| {
            BinaaError::Argument(format!(
                "constructor read argument {position} but only {} were supplied",
                self.args.len()
            ))
        })?;
        self.cursor += 1;
        Ok(arg)
    }

    /// Next required value.
    pub fn next<T: Clone + 'static>(&mut self) -> Result<T> {
        let position = self.cursor;
        self.next_optional::<T>()?.ok_or_else(|| {
            BinaaError::Argument(format!(
                "argument {position} of type {} is missing",
                type_name::<T>()
            ))
        })
    }

    /// Next optional value.
    pub fn next_optional<T: Clone + 'static>(&mut self) -> Result<Option<T>> {
        let position = self.cursor;
        match self.advance()? {
            Argument::Single(None) => Ok(None),
            Argument::Single(Some(value)) => downcast::<T>(value, position).map(Some),
            Argument::Group(_) => Err(BinaaError::Argument(format!(
                "argument {position} is a group, expected a single {}",
                type_name::<T>()
            ))),
        }
    }

    /// Next group of values.
    pub fn next_group<T: Clone + 'static>(&mut self) -> Result<Vec<T>> {
        let position = self.cursor;
        match self.advance()? {
            Argument::Group(values) => values
                .iter()
                .map(|value| downcast::<T>(value, position))
                .collect(),
            Argument::Single(_) => Err(BinaaError::Argument(format!(
                "argument {position} is a single value, expected a group of {}",
                type_name::<T>()
            ))),
        }
    }
}

fn downcast<T: Clone + 'static>(value: &Value, position: usize) -> Result<T> {
    value.downcast_ref::<T>().cloned().ok_or_else(|| {
        BinaaError::Argument(format!(
            "argument {position} is not a {}",
            type_name::<T>()
        ))
    })
}

/// Values emitted by one call, in result-leaf order.
#[derive(Default)]
pub struct Outputs {
    values: Vec<Value>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Debug for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outputs").field("len", &self.values.len()).finish()
    }
}

type CallFn = Arc<dyn Fn(&mut Arguments) -> std::result::Result<Outputs, BoxError> + Send + Sync>;

/// A closure with explicitly declared parameters and results.
#[derive(Clone)]
pub struct FnConstructor {
    name: String,
    params: Vec<Param>,
    results: Vec<ResultItem>,
    call: CallFn,
}

impl FnConstructor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Arguments) -> std::result::Result<Outputs, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: type_name::<F>().to_string(),
            params: Vec::new(),
            results: Vec::new(),
            call: Arc::new(f),
        }
    }

    /// Overrides the closure's type name in diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn result(mut self, result: ResultItem) -> Self {
        self.results.push(result);
        self
    }
}

impl fmt::Debug for FnConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConstructor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("results", &self.results)
            .finish()
    }
}

impl Constructor for FnConstructor {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> Result<Signature> {
        Ok(Signature {
            params: ParamList::new(self.params.clone()),
            results: ResultList::new(self.results.clone()),
        })
    }

    fn call(&self, args: &mut Arguments) -> std::result::Result<Outputs, BoxError> {
        (self.call)(args)
    }
}

/// A struct whose fields are parameters. Implemented by `#[derive(In)]`.
pub trait ParamObject: Sized + 'static {
    fn param_fields() -> Vec<ParamField>;

    /// Reads fields in the same order as [`param_fields`](Self::param_fields)
    /// flattens them.
    fn extract(args: &mut Arguments) -> Result<Self>;
}

/// A constructor without dependencies.
impl ParamObject for () {
    fn param_fields() -> Vec<ParamField> {
        Vec::new()
    }

    fn extract(_args: &mut Arguments) -> Result<Self> {
        Ok(())
    }
}

/// A struct whose fields are results. Implemented by `#[derive(Out)]`.
pub trait ResultObject: Sized + 'static {
    fn result_fields() -> Vec<ResultField>;

    /// Emits one value per leaf, in [`result_fields`](Self::result_fields)
    /// order.
    fn emit(self, outputs: &mut Outputs);
}

/// Adapts `Fn(P) -> Result<R, E>` over parameter and result objects.
///
/// ```rust,ignore
/// container.provide(Typed::new(|p: DbParams| -> Result<DbResults, BoxError> {
///     Ok(DbResults { db: Arc::new(Database::connect(&p.config.url)?) })
/// }))?;
/// ```
pub struct Typed<P, R, F> {
    name: String,
    f: F,
    _marker: PhantomData<fn(P) -> R>,
}

impl<P, R, E, F> Typed<P, R, F>
where
    P: ParamObject,
    R: ResultObject,
    E: Into<BoxError>,
    F: Fn(P) -> std::result::Result<R, E> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            name: type_name::<F>().to_string(),
            f,
            _marker: PhantomData,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<P, R, E, F> Constructor for Typed<P, R, F>
where
    P: ParamObject,
    R: ResultObject,
    E: Into<BoxError>,
    F: Fn(P) -> std::result::Result<R, E> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> Result<Signature> {
        let fields = P::param_fields();
        let params = if fields.is_empty() {
            ParamList::default()
        } else {
            ParamList::new(vec![Param::object(fields)])
        };
        Ok(Signature {
            params,
            results: ResultList::new(vec![ResultItem::object(R::result_fields())]),
        })
    }

    fn call(&self, args: &mut Arguments) -> std::result::Result<Outputs, BoxError> {
        let params = P::extract(args)?;
        let results = match (self.f)(params) {
            Ok(results) => results,
            Err(err) => return Err(err.into()),
        };
        let mut outputs = Outputs::new();
        results.emit(&mut outputs);
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Config(u16);

    #[test]
    fn arguments_read_in_order() {
        let mut args = Arguments::new(vec![
            Argument::Single(Some(Arc::new(Config(8080)))),
            Argument::Single(None),
            Argument::Group(vec![Arc::new(1u8), Arc::new(2u8)]),
        ]);
        assert_eq!(args.next::<Config>().unwrap(), Config(8080));
        assert_eq!(args.next_optional::<String>().unwrap(), None);
        assert_eq!(args.next_group::<u8>().unwrap(), vec![1, 2]);
        assert_eq!(args.remaining(), 0);
        assert!(matches!(args.next::<u8>(), Err(BinaaError::Argument(_))));
    }

    #[test]
    fn wrong_type_is_an_argument_error() {
        let mut args = Arguments::new(vec![Argument::Single(Some(Arc::new(1u32)))]);
        let err = args.next::<Config>().unwrap_err();
        assert!(err.to_string().contains("is not a"));
    }

    #[test]
    fn missing_required_value() {
        let mut args = Arguments::new(vec![Argument::Single(None)]);
        assert!(args.next::<Config>().unwrap_err().to_string().contains("missing"));
    }

    #[test]
    fn group_shape_mismatch() {
        let mut args = Arguments::new(vec![Argument::Group(vec![])]);
        assert!(args.next::<u8>().is_err());
    }

    #[test]
    fn fn_constructor_describes_and_calls() {
        let ctor = FnConstructor::new(|args| {
            let config: Config = args.next()?;
            Ok(Outputs::new().with(u32::from(config.0)))
        })
        .with_name("port_of")
        .param(Param::of::<Config>())
        .result(ResultItem::of::<u32>());

        assert_eq!(ctor.name(), "port_of");
        let sig = ctor.describe().unwrap();
        assert_eq!(sig.params.leaves().len(), 1);
        assert_eq!(sig.results.leaves().len(), 1);

        let mut args = Arguments::new(vec![Argument::Single(Some(Arc::new(Config(80))))]);
        let outputs = ctor.call(&mut args).unwrap().into_values();
        assert_eq!(outputs[0].downcast_ref::<u32>(), Some(&80));
    }

    #[test]
    fn unit_params_extract_nothing() {
        assert!(<() as ParamObject>::param_fields().is_empty());
        let mut args = Arguments::default();
        assert!(<() as ParamObject>::extract(&mut args).is_ok());
    }
}
