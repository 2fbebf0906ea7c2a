//! Parameter descriptions: what a constructor depends on.
//!
//! Parameters form a tree. Leaves are single values (optionally named
//! or optional) or whole groups; aggregate objects hold named fields
//! that are themselves parameters.

use crate::key::{DependencyKey, TypeDescriptor};
use crate::options::Input;

/// One declared dependency of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// A single value; missing optional values resolve to `None`.
    Single {
        ty: TypeDescriptor,
        name: String,
        optional: bool,
    },
    /// Every value contributed to a group, in registration order.
    Grouped { ty: TypeDescriptor, group: String },
    /// An aggregate whose fields are parameters.
    Object { fields: Vec<ParamField> },
}

/// Named field of an aggregate parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamField {
    pub name: String,
    pub param: Param,
}

impl ParamField {
    pub fn new(name: impl Into<String>, param: Param) -> Self {
        Self {
            name: name.into(),
            param,
        }
    }
}

impl Param {
    /// Required, unnamed dependency on `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Param::Single {
            ty: TypeDescriptor::of::<T>(),
            name: String::new(),
            optional: false,
        }
    }

    /// Required dependency on the value named `name`.
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Param::Single {
            ty: TypeDescriptor::of::<T>(),
            name: name.into(),
            optional: false,
        }
    }

    /// Dependency on `T` that may be absent.
    pub fn optional<T: ?Sized + 'static>() -> Self {
        Param::Single {
            ty: TypeDescriptor::of::<T>(),
            name: String::new(),
            optional: true,
        }
    }

    /// All values of group `group`.
    pub fn group<T: ?Sized + 'static>(group: impl Into<String>) -> Self {
        Param::Grouped {
            ty: TypeDescriptor::of::<T>(),
            group: group.into(),
        }
    }

    pub fn object(fields: Vec<ParamField>) -> Self {
        Param::Object { fields }
    }

    /// Marks a single parameter optional. Other shapes are unchanged.
    pub fn into_optional(self) -> Self {
        match self {
            Param::Single { ty, name, .. } => Param::Single {
                ty,
                name,
                optional: true,
            },
            other => other,
        }
    }

    fn collect_leaves(&self, out: &mut Vec<ParamLeaf>) {
        match self {
            Param::Single { ty, name, optional } => out.push(ParamLeaf::Single {
                key: DependencyKey::new_singleton(*ty, name.as_str()),
                optional: *optional,
            }),
            Param::Grouped { ty, group } => out.push(ParamLeaf::Grouped {
                key: DependencyKey::new_group(*ty, group.as_str()),
            }),
            Param::Object { fields } => {
                for field in fields {
                    field.param.collect_leaves(out);
                }
            }
        }
    }
}

/// A flattened parameter leaf: the key to read and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamLeaf {
    Single { key: DependencyKey, optional: bool },
    Grouped { key: DependencyKey },
}

impl ParamLeaf {
    pub fn key(&self) -> &DependencyKey {
        match self {
            ParamLeaf::Single { key, .. } | ParamLeaf::Grouped { key } => key,
        }
    }
}

/// Positional parameters of a constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Leaves in depth-first declaration order. Argument passing and
    /// graph edges both follow this order.
    pub fn leaves(&self) -> Vec<ParamLeaf> {
        let mut out = Vec::new();
        for param in &self.params {
            param.collect_leaves(&mut out);
        }
        out
    }

    /// Introspection records, one per leaf.
    pub fn inputs(&self) -> Vec<Input> {
        let mut inputs = Vec::new();
        for param in &self.params {
            push_inputs(param, &mut inputs);
        }
        inputs
    }
}

fn push_inputs(param: &Param, out: &mut Vec<Input>) {
    match param {
        Param::Single { ty, name, optional } => out.push(Input {
            ty: *ty,
            optional: *optional,
            name: name.clone(),
            group: String::new(),
        }),
        Param::Grouped { ty, group } => out.push(Input {
            ty: *ty,
            optional: false,
            name: String::new(),
            group: group.clone(),
        }),
        Param::Object { fields } => {
            for field in fields {
                push_inputs(&field.param, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Config;
    struct Logger;
    struct Handler;

    #[test]
    fn leaves_flatten_objects_in_order() {
        let list = ParamList::new(vec![
            Param::of::<Config>(),
            Param::object(vec![
                ParamField::new("logger", Param::optional::<Logger>()),
                ParamField::new("handlers", Param::group::<Handler>("routes")),
            ]),
        ]);

        let leaves = list.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].key(), &DependencyKey::of::<Config>());
        assert_eq!(
            leaves[1],
            ParamLeaf::Single {
                key: DependencyKey::of::<Logger>(),
                optional: true,
            }
        );
        assert_eq!(leaves[2].key(), &DependencyKey::grouped::<Handler>("routes"));
    }

    #[test]
    fn empty_object_has_no_leaves() {
        let list = ParamList::new(vec![Param::object(vec![])]);
        assert!(list.leaves().is_empty());
        assert!(!list.is_empty());
    }

    #[test]
    fn into_optional_only_touches_singles() {
        assert_eq!(
            Param::named::<Config>("main").into_optional(),
            Param::Single {
                ty: TypeDescriptor::of::<Config>(),
                name: "main".into(),
                optional: true,
            }
        );
        let group = Param::group::<Handler>("routes");
        assert_eq!(group.clone().into_optional(), group);
    }

    #[test]
    fn inputs_render_qualifiers() {
        let list = ParamList::new(vec![
            Param::named::<Config>("ro").into_optional(),
            Param::group::<Handler>("routes"),
        ]);
        let inputs: Vec<String> = list.inputs().iter().map(ToString::to_string).collect();
        assert_eq!(inputs[0], "Config[optional, name = \"ro\"]");
        assert_eq!(inputs[1], "Handler[group = \"routes\"]");
    }
}
