//! Core provider registration and dependency-graph engine for Binaa.

pub mod constructor;
pub mod container;
mod discovery;
pub mod error;
pub mod graph;
pub mod key;
pub mod location;
pub mod node;
pub mod options;
pub mod param;
pub mod provider;
mod registry;
pub mod result;
pub mod store;

pub use constructor::{Constructor, FnConstructor, ParamObject, ResultObject, Typed};
pub use container::{Container, ContainerBuilder, ContainerConfig, prelude};
pub use error::{BinaaError, Result};
pub use key::{DependencyKey, Interface, TypeDescriptor};
pub use location::Location;
