//! Value slot identification.
//!
//! [`TypeDescriptor`] names a Rust type explicitly, standing in for
//! runtime reflection. [`DependencyKey`] combines a descriptor with
//! either a name (singleton slot) or a group (append-only slot).
//! [`Interface`] pairs an interface descriptor with the conversion that
//! turns a concrete value into it.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::constructor::Value;

/// Whether a type is a concrete value type or a behavioral contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete type (`Database`, `Arc<Config>`, `u32`).
    Concrete,
    /// A trait object or a pointer to one (`dyn Logger`,
    /// `Arc<dyn Logger>`, `Box<dyn Logger>`, `&dyn Logger`).
    Interface,
}

impl TypeKind {
    const POINTERS: [&'static str; 3] = ["alloc::sync::Arc<", "alloc::boxed::Box<", "alloc::rc::Rc<"];

    /// Classifies a type by the shape of its name.
    fn classify(type_name: &str) -> Self {
        let pointee = type_name
            .strip_prefix("&mut ")
            .or_else(|| type_name.strip_prefix('&'))
            .unwrap_or(type_name);
        let pointee = Self::POINTERS
            .iter()
            .find_map(|pointer| pointee.strip_prefix(*pointer))
            .unwrap_or(pointee);
        if pointee.starts_with("dyn ") {
            TypeKind::Interface
        } else {
            TypeKind::Concrete
        }
    }
}

/// Explicit token naming a Rust type.
///
/// Equality and hashing only consider the [`TypeId`]; the kind is
/// metadata used to validate interface substitution.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use binaa_container::key::{TypeDescriptor, TypeKind};
///
/// trait Logger {}
///
/// assert_eq!(TypeDescriptor::of::<String>().kind(), TypeKind::Concrete);
/// assert!(TypeDescriptor::of::<dyn Logger>().is_interface());
/// assert!(TypeDescriptor::of::<Arc<dyn Logger>>().is_interface());
/// ```
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Describes `T`. Trait objects and `Arc`, `Box`, `Rc` or reference
    /// handles to them are interfaces.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let name = type_name::<T>();
        Self {
            type_id: TypeId::of::<T>(),
            type_name: name,
            kind: TypeKind::classify(name),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Type name without module paths, for compact diagnostics.
    pub fn short_name(&self) -> String {
        binaa_support::rendering::shorten_type_name(self.type_name)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.type_name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

type Upcast = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Interface substitution: the handle type a result is also provided
/// as, and how a produced value becomes that handle.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use binaa_container::key::Interface;
///
/// trait Reader: Send + Sync {}
/// struct Buffer;
/// impl Reader for Buffer {}
///
/// let reader = Interface::new(|b: Arc<Buffer>| b as Arc<dyn Reader>);
/// assert!(reader.target().is_interface());
/// ```
#[derive(Clone)]
pub struct Interface {
    source: TypeDescriptor,
    target: TypeDescriptor,
    upcast: Upcast,
}

impl Interface {
    /// Substitution from `T` to `I`, usually an unsizing coercion such as
    /// `|b: Arc<Buffer>| b as Arc<dyn Reader>`.
    pub fn new<T, I>(upcast: impl Fn(T) -> I + Send + Sync + 'static) -> Self
    where
        T: Clone + Send + Sync + 'static,
        I: Send + Sync + 'static,
    {
        Self {
            source: TypeDescriptor::of::<T>(),
            target: TypeDescriptor::of::<I>(),
            upcast: Arc::new(move |value: &Value| {
                let concrete = value.downcast_ref::<T>()?.clone();
                Some(Arc::new(upcast(concrete)) as Value)
            }),
        }
    }

    /// Type the substitution converts from.
    #[inline]
    pub fn source(&self) -> TypeDescriptor {
        self.source
    }

    /// Interface type the value is also provided as.
    #[inline]
    pub fn target(&self) -> TypeDescriptor {
        self.target
    }

    /// Converts a produced value; `None` when it is not a `source`.
    pub(crate) fn upcast(&self, value: &Value) -> Option<Value> {
        (self.upcast)(value)
    }
}

impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl Eq for Interface {}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interface({} as {})", self.source, self.target)
    }
}

/// Name or group qualifier of a key. The two never mix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// Singleton slot; the empty name is the default slot for the type.
    Name(String),
    /// Append-only slot shared by every contributor to the group.
    Group(String),
}

/// Uniquely identifies a value slot in the container.
///
/// # Examples
/// ```
/// use binaa_container::key::DependencyKey;
///
/// // Default slot, just a type
/// let key = DependencyKey::of::<String>();
/// assert_eq!(key.name(), Some(""));
/// assert!(!key.is_group());
///
/// // Named slot
/// let primary = DependencyKey::named::<String>("primary_db");
/// let replica = DependencyKey::named::<String>("replica_db");
/// assert_ne!(primary, replica);
///
/// // Group slot
/// let key = DependencyKey::grouped::<String>("routes");
/// assert_eq!(key.group(), Some("routes"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    ty: TypeDescriptor,
    qualifier: Qualifier,
}

impl DependencyKey {
    /// Default (unnamed) singleton key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new_singleton(TypeDescriptor::of::<T>(), "")
    }

    /// Named singleton key for `T`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new_singleton(TypeDescriptor::of::<T>(), name)
    }

    /// Group key for `T`.
    #[inline]
    pub fn grouped<T: ?Sized + 'static>(group: impl Into<String>) -> Self {
        Self::new_group(TypeDescriptor::of::<T>(), group)
    }

    /// Singleton key from a descriptor.
    pub fn new_singleton(ty: TypeDescriptor, name: impl Into<String>) -> Self {
        Self {
            ty,
            qualifier: Qualifier::Name(name.into()),
        }
    }

    /// Group key from a descriptor.
    pub fn new_group(ty: TypeDescriptor, group: impl Into<String>) -> Self {
        Self {
            ty,
            qualifier: Qualifier::Group(group.into()),
        }
    }

    #[inline]
    pub fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    /// Returns the human-readable type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.ty.type_name()
    }

    #[inline]
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// Name of a singleton key (`Some("")` for the default slot),
    /// `None` for group keys.
    pub fn name(&self) -> Option<&str> {
        match &self.qualifier {
            Qualifier::Name(name) => Some(name),
            Qualifier::Group(_) => None,
        }
    }

    /// Group of a group key, `None` for singleton keys.
    pub fn group(&self) -> Option<&str> {
        match &self.qualifier {
            Qualifier::Group(group) => Some(group),
            Qualifier::Name(_) => None,
        }
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.qualifier, Qualifier::Group(_))
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::Name(name) if name.is_empty() => {
                write!(f, "DependencyKey({})", self.ty.type_name())
            }
            Qualifier::Name(name) => {
                write!(f, "DependencyKey({}, name={:?})", self.ty.type_name(), name)
            }
            Qualifier::Group(group) => {
                write!(f, "DependencyKey({}, group={:?})", self.ty.type_name(), group)
            }
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::Name(name) if name.is_empty() => write!(f, "{}", self.ty),
            Qualifier::Name(name) => write!(f, "{}[name={:?}]", self.ty, name),
            Qualifier::Group(group) => write!(f, "{}[group={:?}]", self.ty, group),
        }
    }
}
