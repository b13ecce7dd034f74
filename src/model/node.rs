//! Arena storage and typed handles for every node kind that can be shared or that owns
//! shareable children.
//!
//! The [`Document`](crate::model::Document) owns one arena per kind. Nodes refer to each
//! other through copyable handles and record their structural owner as a [`NodeRef`], so
//! the graph never holds live back-pointers.

use crate::model::content::{Example, Link, MediaType, RequestBody, Response};
use crate::model::extensions::Extensible;
use crate::model::parameter::{Header, Parameter};
use crate::model::path::{Callback, Operation, PathItem};
use crate::model::schema::Schema;
use crate::model::security::SecurityScheme;
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Flat slot storage. Slots are never reused, so a handle to a freed node can never alias
/// a node allocated later.
#[doc(hidden)]
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> usize {
        self.slots.push(Some(value));
        self.live += 1;
        self.slots.len() - 1
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let removed = self.slots.get_mut(index).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
    }
}

/// A node that lives in one of the document arenas and knows its structural owner.
pub trait OwnedNode: Extensible {
    /// The node that textually contains this one. Nodes registered in the components
    /// section report [`NodeRef::Components`].
    fn parent(&self) -> NodeRef;
}

macro_rules! impl_owned_node {
    ($($ty:ty),* $(,)?) => {
        $(
            $crate::model::extensions::impl_extensible!($ty);

            impl $crate::model::node::OwnedNode for $ty {
                fn parent(&self) -> $crate::model::node::NodeRef {
                    self.parent
                }
            }
        )*
    };
}

pub(crate) use impl_owned_node;

/// Typed handle into one of the document arenas.
pub trait NodeId: Copy + Eq + Hash + Debug + Into<NodeRef> {
    type Node: OwnedNode;

    /// The typed handle inside `node`, if `node` is of this kind.
    fn from_node(node: NodeRef) -> Option<Self>;
    #[doc(hidden)]
    fn from_index(index: usize) -> Self;
    #[doc(hidden)]
    fn index(self) -> usize;
    #[doc(hidden)]
    fn arena(store: &NodeStore) -> &Arena<Self::Node>;
    #[doc(hidden)]
    fn arena_mut(store: &mut NodeStore) -> &mut Arena<Self::Node>;
}

macro_rules! node_kinds {
    ($($id:ident => $node:ty, $field:ident, $variant:ident;)*) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $id(usize);

            impl NodeId for $id {
                type Node = $node;

                fn from_node(node: NodeRef) -> Option<Self> {
                    match node {
                        NodeRef::$variant(id) => Some(id),
                        _ => None,
                    }
                }

                fn from_index(index: usize) -> Self {
                    $id(index)
                }

                fn index(self) -> usize {
                    self.0
                }

                fn arena(store: &NodeStore) -> &Arena<$node> {
                    &store.$field
                }

                fn arena_mut(store: &mut NodeStore) -> &mut Arena<$node> {
                    &mut store.$field
                }
            }

            impl From<$id> for NodeRef {
                fn from(id: $id) -> Self {
                    NodeRef::$variant(id)
                }
            }
        )*

        /// Identity of any node that can own, or be owned by, another node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NodeRef {
            Document,
            Components,
            $($variant($id),)*
        }

        #[doc(hidden)]
        #[derive(Debug, Default)]
        pub struct NodeStore {
            $(pub(crate) $field: Arena<$node>,)*
        }

        impl NodeStore {
            /// Owner of `node`, or `None` when the handle is stale. The document and its
            /// components section are roots.
            pub(crate) fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
                match node {
                    NodeRef::Document => None,
                    NodeRef::Components => Some(NodeRef::Document),
                    $(NodeRef::$variant(id) => self.$field.get(id.0).map(OwnedNode::parent),)*
                }
            }

            /// Drops the arena slot of a single node without touching its children.
            pub(crate) fn remove(&mut self, node: NodeRef) {
                match node {
                    NodeRef::Document | NodeRef::Components => {}
                    $(NodeRef::$variant(id) => {
                        self.$field.remove(id.0);
                    })*
                }
            }

            pub(crate) fn live_nodes(&self) -> Vec<NodeRef> {
                let mut nodes = Vec::new();
                $(nodes.extend(self.$field.indices().map(|i| NodeRef::$variant($id(i))));)*
                nodes
            }

            pub(crate) fn live_count(&self) -> usize {
                0 $(+ self.$field.len())*
            }
        }
    };
}

node_kinds! {
    SchemaId => Schema, schemas, Schema;
    ParameterId => Parameter, parameters, Parameter;
    HeaderId => Header, headers, Header;
    ResponseId => Response, responses, Response;
    RequestBodyId => RequestBody, request_bodies, RequestBody;
    MediaTypeId => MediaType, media_types, MediaType;
    ExampleId => Example, examples, Example;
    LinkId => Link, links, Link;
    CallbackId => Callback, callbacks, Callback;
    SecuritySchemeId => SecurityScheme, security_schemes, SecurityScheme;
    PathItemId => PathItem, path_items, PathItem;
    OperationId => Operation, operations, Operation;
}

impl NodeStore {
    pub(crate) fn alloc<I: NodeId>(&mut self, node: I::Node) -> I {
        I::from_index(I::arena_mut(self).insert(node))
    }

    pub(crate) fn get<I: NodeId>(&self, id: I) -> Option<&I::Node> {
        I::arena(self).get(id.index())
    }

    pub(crate) fn get_mut<I: NodeId>(&mut self, id: I) -> Option<&mut I::Node> {
        I::arena_mut(self).get_mut(id.index())
    }
}

/// A child to place in a slot: a new node owned by the slot's holder, or a handle to a
/// node registered in the components section.
pub(crate) enum Attach<I: NodeId> {
    New(I::Node),
    Shared(I),
}

/// The child handles a node holds, each with the pointer segments leading to it from
/// the node itself.
#[derive(Debug, Default)]
pub(crate) struct Slots(Vec<(Vec<String>, NodeRef)>);

impl Slots {
    pub(crate) fn one(&mut self, path: &[&str], id: impl Into<NodeRef>) {
        self.0
            .push((path.iter().map(|s| s.to_string()).collect(), id.into()));
    }

    pub(crate) fn optional<I: Into<NodeRef>>(&mut self, path: &[&str], id: Option<I>) {
        if let Some(id) = id {
            self.one(path, id);
        }
    }

    pub(crate) fn keyed<I: Into<NodeRef> + Copy>(&mut self, prefix: &[&str], map: &IndexMap<String, I>) {
        for (key, id) in map {
            let mut path: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            path.push(key.clone());
            self.0.push((path, (*id).into()));
        }
    }

    pub(crate) fn listed<I: Into<NodeRef> + Copy>(&mut self, prefix: &[&str], list: &[I]) {
        for (index, id) in list.iter().enumerate() {
            let mut path: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            path.push(index.to_string());
            self.0.push((path, (*id).into()));
        }
    }

    pub(crate) fn into_vec(self) -> Vec<(Vec<String>, NodeRef)> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_never_reuses_slots() {
        let mut arena = Arena::default();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.remove(a), Some("a"));
        let c = arena.insert("c");
        assert_ne!(a, c);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.indices().collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn test_arena_double_remove_is_harmless() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 0);
    }
}
