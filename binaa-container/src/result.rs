//! Result descriptions: what a constructor produces.
//!
//! Results form a tree. Positional results sit at the top; aggregate
//! objects hold named fields that are results themselves, nested to any
//! depth. Every leaf turns into one or more [`DependencyKey`]s.

use std::ops::ControlFlow;

use crate::error::{BinaaError, InvalidInputError, Result};
use crate::key::{DependencyKey, Interface, TypeDescriptor};
use crate::options::Output;

/// One declared output of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultItem {
    /// A single value, also offered under each `as_types` interface.
    Single {
        ty: TypeDescriptor,
        name: String,
        as_types: Vec<Interface>,
    },
    /// A value appended to a group.
    Grouped { ty: TypeDescriptor, group: String },
    /// An aggregate whose fields are results.
    Object { fields: Vec<ResultField> },
}

/// Named field of an aggregate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultField {
    pub name: String,
    pub result: ResultItem,
}

impl ResultField {
    pub fn new(name: impl Into<String>, result: ResultItem) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

impl ResultItem {
    /// Unnamed value of type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        ResultItem::Single {
            ty: TypeDescriptor::of::<T>(),
            name: String::new(),
            as_types: Vec::new(),
        }
    }

    /// Value of type `T` under `name`.
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        ResultItem::Single {
            ty: TypeDescriptor::of::<T>(),
            name: name.into(),
            as_types: Vec::new(),
        }
    }

    /// Value of type `T` appended to `group`.
    pub fn group<T: ?Sized + 'static>(group: impl Into<String>) -> Self {
        ResultItem::Grouped {
            ty: TypeDescriptor::of::<T>(),
            group: group.into(),
        }
    }

    pub fn object(fields: Vec<ResultField>) -> Self {
        ResultItem::Object { fields }
    }

    /// Keys a leaf produces: the value's own key first, then one per
    /// interface substitution under the same name. Objects produce none
    /// directly; their fields do.
    pub fn keys(&self) -> Vec<DependencyKey> {
        match self {
            ResultItem::Single { ty, name, as_types } => {
                let mut keys = Vec::with_capacity(as_types.len() + 1);
                keys.push(DependencyKey::new_singleton(*ty, name.as_str()));
                keys.extend(
                    as_types
                        .iter()
                        .map(|as_ty| DependencyKey::new_singleton(as_ty.target(), name.as_str())),
                );
                keys
            }
            ResultItem::Grouped { ty, group } => {
                vec![DependencyKey::new_group(*ty, group.as_str())]
            }
            ResultItem::Object { .. } => Vec::new(),
        }
    }

    fn apply_options(&mut self, opts: &ResultOptions<'_>) -> Result<()> {
        match self {
            ResultItem::Single { ty, name, as_types } => {
                if !opts.group.is_empty() {
                    let ty = *ty;
                    *self = ResultItem::Grouped {
                        ty,
                        group: opts.group.to_string(),
                    };
                    return Ok(());
                }
                if let Some(mismatch) = opts.as_types.iter().find(|i| i.source() != *ty) {
                    return Err(invalid(format!(
                        "cannot use As({}) with result {ty}: conversion expects {}",
                        mismatch.target(),
                        mismatch.source()
                    )));
                }
                if !opts.name.is_empty() {
                    *name = opts.name.to_string();
                }
                as_types.extend_from_slice(opts.as_types);
                Ok(())
            }
            ResultItem::Grouped { group, ty } => {
                if !opts.name.is_empty() {
                    return Err(invalid(format!(
                        "cannot specify a name for grouped result {ty}: name:{:?} provided with group:{group:?}",
                        opts.name
                    )));
                }
                if !opts.as_types.is_empty() {
                    return Err(invalid(format!(
                        "cannot use As with grouped result {ty} in group:{group:?}"
                    )));
                }
                if !opts.group.is_empty() {
                    *group = opts.group.to_string();
                }
                Ok(())
            }
            ResultItem::Object { .. } => {
                if !opts.name.is_empty() {
                    return Err(invalid(format!(
                        "cannot specify a name for result objects: name:{:?}",
                        opts.name
                    )));
                }
                if !opts.group.is_empty() {
                    return Err(invalid(format!(
                        "cannot specify a group for result objects: group:{:?}",
                        opts.group
                    )));
                }
                if !opts.as_types.is_empty() {
                    return Err(invalid("cannot use As with result objects"));
                }
                Ok(())
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> BinaaError {
    BinaaError::InvalidInput(InvalidInputError::new(message))
}

/// Registration options that rewrite the top-level results.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ResultOptions<'a> {
    pub name: &'a str,
    pub group: &'a str,
    pub as_types: &'a [Interface],
}

/// A flattened result leaf, in the order values are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLeaf {
    Single {
        key: DependencyKey,
        /// Interface keys, each with the conversion its value needs
        as_keys: Vec<(DependencyKey, Interface)>,
    },
    Grouped {
        key: DependencyKey,
    },
}

/// Receives every leaf of a result tree with its provenance path.
pub trait ResultVisitor {
    /// Called for each leaf; `path` holds the segments leading to it,
    /// e.g. `["[1]", "Foo", "Bar"]`. Break to stop the walk.
    fn visit(&mut self, leaf: &ResultItem, path: &[String]) -> ControlFlow<()>;
}

/// Positional results of a constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultList {
    results: Vec<ResultItem>,
}

impl ResultList {
    pub fn new(results: Vec<ResultItem>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[ResultItem] {
        &self.results
    }

    pub(crate) fn apply_options(&mut self, opts: &ResultOptions<'_>) -> Result<()> {
        for result in &mut self.results {
            result.apply_options(opts)?;
        }
        Ok(())
    }

    /// Depth-first walk in declaration order. Stops at the first break.
    pub fn walk(&self, visitor: &mut impl ResultVisitor) {
        let mut path = Vec::new();
        for (index, result) in self.results.iter().enumerate() {
            path.push(format!("[{index}]"));
            let flow = walk_item(result, &mut path, visitor);
            path.pop();
            if flow.is_break() {
                return;
            }
        }
    }

    /// Leaves in emission order.
    pub fn leaves(&self) -> Vec<ResultLeaf> {
        let mut collector = LeafCollector::default();
        self.walk(&mut collector);
        collector.leaves
    }

    /// Introspection records, one per produced key.
    pub fn outputs(&self) -> Vec<Output> {
        self.leaves()
            .into_iter()
            .flat_map(|leaf| match leaf {
                ResultLeaf::Single { key, as_keys } => std::iter::once(key)
                    .chain(as_keys.into_iter().map(|(as_key, _)| as_key))
                    .map(|k| Output {
                        ty: k.ty(),
                        name: k.name().unwrap_or_default().to_string(),
                        group: String::new(),
                    })
                    .collect::<Vec<_>>(),
                ResultLeaf::Grouped { key } => vec![Output {
                    ty: key.ty(),
                    name: String::new(),
                    group: key.group().unwrap_or_default().to_string(),
                }],
            })
            .collect()
    }
}

fn walk_item(
    item: &ResultItem,
    path: &mut Vec<String>,
    visitor: &mut impl ResultVisitor,
) -> ControlFlow<()> {
    match item {
        ResultItem::Object { fields } => {
            for field in fields {
                path.push(field.name.clone());
                let flow = walk_item(&field.result, path, visitor);
                path.pop();
                if flow.is_break() {
                    return flow;
                }
            }
            ControlFlow::Continue(())
        }
        leaf => visitor.visit(leaf, path),
    }
}

#[derive(Default)]
struct LeafCollector {
    leaves: Vec<ResultLeaf>,
}

impl ResultVisitor for LeafCollector {
    fn visit(&mut self, leaf: &ResultItem, _path: &[String]) -> ControlFlow<()> {
        match leaf {
            ResultItem::Single { ty, name, as_types } => {
                self.leaves.push(ResultLeaf::Single {
                    key: DependencyKey::new_singleton(*ty, name.as_str()),
                    as_keys: as_types
                        .iter()
                        .map(|i| (DependencyKey::new_singleton(i.target(), name.as_str()), i.clone()))
                        .collect(),
                });
            }
            ResultItem::Grouped { ty, group } => {
                self.leaves.push(ResultLeaf::Grouped {
                    key: DependencyKey::new_group(*ty, group.as_str()),
                });
            }
            ResultItem::Object { .. } => {}
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct Reader;
    struct Writer;
    struct Buffer;
    trait Read: Send + Sync {}
    trait Write: Send + Sync {}
    impl Read for Buffer {}
    impl Write for Buffer {}

    fn read() -> Interface {
        Interface::new(|b: Arc<Buffer>| b as Arc<dyn Read>)
    }

    fn write() -> Interface {
        Interface::new(|b: Arc<Buffer>| b as Arc<dyn Write>)
    }

    struct Paths(Vec<String>);

    impl ResultVisitor for Paths {
        fn visit(&mut self, _leaf: &ResultItem, path: &[String]) -> ControlFlow<()> {
            self.0.push(path.join("."));
            ControlFlow::Continue(())
        }
    }

    #[test]
    fn single_with_as_types_yields_all_keys() {
        let item = ResultItem::Single {
            ty: TypeDescriptor::of::<Arc<Buffer>>(),
            name: "tmp".into(),
            as_types: vec![read(), write()],
        };
        let keys = item.keys();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], DependencyKey::named::<Arc<Buffer>>("tmp"));
        assert_eq!(keys[1], DependencyKey::named::<Arc<dyn Read>>("tmp"));
        assert_eq!(keys[2], DependencyKey::named::<Arc<dyn Write>>("tmp"));
    }

    #[test]
    fn grouped_yields_one_group_key() {
        let keys = ResultItem::group::<Reader>("readers").keys();
        assert_eq!(keys, vec![DependencyKey::grouped::<Reader>("readers")]);
    }

    #[test]
    fn walk_reports_nested_paths() {
        let list = ResultList::new(vec![
            ResultItem::of::<Reader>(),
            ResultItem::object(vec![ResultField::new(
                "Foo",
                ResultItem::object(vec![ResultField::new("Bar", ResultItem::of::<Writer>())]),
            )]),
        ]);
        let mut paths = Paths(Vec::new());
        list.walk(&mut paths);
        assert_eq!(paths.0, vec!["[0]".to_string(), "[1].Foo.Bar".to_string()]);
    }

    #[test]
    fn walk_stops_on_break() {
        struct First(usize);
        impl ResultVisitor for First {
            fn visit(&mut self, _leaf: &ResultItem, _path: &[String]) -> ControlFlow<()> {
                self.0 += 1;
                ControlFlow::Break(())
            }
        }

        let list = ResultList::new(vec![ResultItem::of::<Reader>(), ResultItem::of::<Writer>()]);
        let mut first = First(0);
        list.walk(&mut first);
        assert_eq!(first.0, 1);
    }

    #[test]
    fn name_option_renames_singles() {
        let mut list = ResultList::new(vec![ResultItem::of::<Reader>()]);
        list.apply_options(&ResultOptions {
            name: "ro",
            ..Default::default()
        })
        .unwrap();
        assert_eq!(list.results()[0].keys(), vec![DependencyKey::named::<Reader>("ro")]);
    }

    #[test]
    fn group_option_turns_singles_into_groups() {
        let mut list = ResultList::new(vec![ResultItem::of::<Reader>()]);
        list.apply_options(&ResultOptions {
            group: "readers",
            ..Default::default()
        })
        .unwrap();
        assert_eq!(list.results()[0], ResultItem::group::<Reader>("readers"));
    }

    #[test]
    fn options_rejected_on_result_objects() {
        let mut list = ResultList::new(vec![ResultItem::object(vec![])]);
        let err = list
            .apply_options(&ResultOptions {
                name: "x",
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("result objects"));

        let as_types = [read()];
        let err = list
            .apply_options(&ResultOptions {
                as_types: &as_types,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BinaaError::InvalidInput(_)));
    }

    #[test]
    fn as_must_convert_from_the_result_type() {
        let mut list = ResultList::new(vec![ResultItem::of::<Reader>()]);
        let as_types = [read()];
        let err = list
            .apply_options(&ResultOptions {
                as_types: &as_types,
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("conversion expects"), "{err}");
    }

    #[test]
    fn leaves_and_outputs() {
        let list = ResultList::new(vec![
            ResultItem::Single {
                ty: TypeDescriptor::of::<Arc<Buffer>>(),
                name: String::new(),
                as_types: vec![read()],
            },
            ResultItem::object(vec![ResultField::new("w", ResultItem::group::<Writer>("ws"))]),
        ]);

        let leaves = list.leaves();
        assert_eq!(leaves.len(), 2);
        assert!(matches!(&leaves[0], ResultLeaf::Single { as_keys, .. } if as_keys.len() == 1));
        assert!(matches!(&leaves[1], ResultLeaf::Grouped { .. }));

        let outputs: Vec<String> = list.outputs().iter().map(ToString::to_string).collect();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0], "Arc<Buffer>");
        assert_eq!(outputs[1], "Arc<dyn Read>");
        assert_eq!(outputs[2], "Writer[group = \"ws\"]");
    }
}
