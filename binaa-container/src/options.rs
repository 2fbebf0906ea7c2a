//! Registration options and introspection records.
//!
//! Options are independent modifiers applied in the order supplied:
//!
//! ```rust,ignore
//! container.provide_with(new_file, [
//!     as_interface([Interface::new(|f: Arc<File>| f as Arc<dyn Read>)]),
//!     name("temp"),
//! ])?;
//! ```

use std::fmt;
use std::sync::Arc;

use binaa_support::rendering::render_qualified;
use parking_lot::Mutex;

use crate::error::{BinaaError, InvalidInputError, Result};
use crate::key::{Interface, TypeDescriptor};
use crate::location::Location;
use crate::node::NodeId;

/// Names and groups must stay representable inside backquoted field
/// attributes, so the backquote is reserved.
pub const RESERVED_DELIMITER: char = '`';

/// A single modifier of [`Container::provide_with`](crate::container::Container::provide_with).
#[derive(Debug, Clone)]
pub enum ProvideOption {
    Name(String),
    Group(String),
    As(Vec<Interface>),
    FillProvideInfo(InfoSink),
    Location(Location),
}

/// Provide every value of the constructor under `name`.
///
/// Cannot be used with constructors returning result objects.
pub fn name(name: impl Into<String>) -> ProvideOption {
    ProvideOption::Name(name.into())
}

/// Add every value of the constructor to `group`.
///
/// Cannot be combined with [`name`] or [`as_interface`].
pub fn group(group: impl Into<String>) -> ProvideOption {
    ProvideOption::Group(group.into())
}

/// Also provide the value under each interface type, sharing its name.
/// Every target must be a trait object handle. Repeated uses accumulate.
pub fn as_interface(types: impl IntoIterator<Item = Interface>) -> ProvideOption {
    ProvideOption::As(types.into_iter().collect())
}

/// Write the node id and rendered inputs/outputs into `sink` on success.
pub fn fill_provide_info(sink: &InfoSink) -> ProvideOption {
    ProvideOption::FillProvideInfo(sink.clone())
}

/// Report `location` in diagnostics instead of the call site.
pub fn location(location: Location) -> ProvideOption {
    ProvideOption::Location(location)
}

/// Options after all modifiers were applied.
#[derive(Debug, Clone, Default)]
pub struct ProvideOptions {
    pub name: String,
    pub group: String,
    pub as_types: Vec<Interface>,
    pub info: Option<InfoSink>,
    pub location: Option<Location>,
}

impl ProvideOptions {
    /// Applies modifiers in order. Later names and groups win; `As`
    /// lists accumulate.
    pub fn from_options(opts: impl IntoIterator<Item = ProvideOption>) -> Self {
        let mut options = Self::default();
        for opt in opts {
            match opt {
                ProvideOption::Name(name) => options.name = name,
                ProvideOption::Group(group) => options.group = group,
                ProvideOption::As(types) => options.as_types.extend(types),
                ProvideOption::FillProvideInfo(sink) => options.info = Some(sink),
                ProvideOption::Location(location) => options.location = Some(location),
            }
        }
        options
    }

    /// Checks option combinations before anything touches the graph.
    pub fn validate(&self) -> Result<()> {
        if !self.group.is_empty() {
            if !self.name.is_empty() {
                return Err(invalid(format!(
                    "cannot use named values with value groups: name:{:?} provided with group:{:?}",
                    self.name, self.group
                )));
            }
            if !self.as_types.is_empty() {
                return Err(invalid(format!(
                    "cannot use As with value groups: As provided with group:{:?}",
                    self.group
                )));
            }
        }

        if self.name.contains(RESERVED_DELIMITER) {
            return Err(invalid(format!(
                "invalid name({:?}): names cannot contain backquotes",
                self.name
            )));
        }
        if self.group.contains(RESERVED_DELIMITER) {
            return Err(invalid(format!(
                "invalid group({:?}): group names cannot contain backquotes",
                self.group
            )));
        }

        for interface in &self.as_types {
            let target = interface.target();
            if !target.is_interface() {
                return Err(invalid(format!(
                    "invalid As({target}): argument must be an interface type"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> BinaaError {
    BinaaError::InvalidInput(InvalidInputError::new(message))
}

/// What the container recorded about one constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideInfo {
    pub id: NodeId,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

/// An input parameter of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub ty: TypeDescriptor,
    pub optional: bool,
    pub name: String,
    pub group: String,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens = Vec::with_capacity(3);
        if self.optional {
            tokens.push("optional".to_string());
        }
        if !self.name.is_empty() {
            tokens.push(format!("name = {:?}", self.name));
        }
        if !self.group.is_empty() {
            tokens.push(format!("group = {:?}", self.group));
        }
        f.write_str(&render_qualified(&self.ty.short_name(), &tokens))
    }
}

/// A value produced by a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub ty: TypeDescriptor,
    pub name: String,
    pub group: String,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens = Vec::with_capacity(2);
        if !self.name.is_empty() {
            tokens.push(format!("name = {:?}", self.name));
        }
        if !self.group.is_empty() {
            tokens.push(format!("group = {:?}", self.group));
        }
        f.write_str(&render_qualified(&self.ty.short_name(), &tokens))
    }
}

/// Shared slot that receives a [`ProvideInfo`] after a successful
/// registration. Left untouched when the registration fails.
#[derive(Clone, Default)]
pub struct InfoSink(Arc<Mutex<Option<ProvideInfo>>>);

impl InfoSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded info, if a registration has filled the sink.
    pub fn get(&self) -> Option<ProvideInfo> {
        self.0.lock().clone()
    }

    pub(crate) fn fill(&self, info: ProvideInfo) {
        *self.0.lock() = Some(info);
    }
}

impl fmt::Debug for InfoSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InfoSink").field(&*self.0.lock()).finish()
    }
}
