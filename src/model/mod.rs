//! The in-memory OpenAPI 3.0.x document graph.
//!
//! Every node that can be shared through the components section, or that owns such a
//! node, lives in an arena owned by [`Document`] and is addressed by a typed handle
//! (`SchemaId`, `OperationId`, ...). Plain value objects such as [`Info`] or [`Server`]
//! are stored inline in their owner.
//!
//! Nodes are only ever created through a factory on their owner, so each node's
//! [`parent`](OwnedNode::parent) is fixed at creation. A node whose parent is
//! [`NodeRef::Components`] is *shared*: other nodes may hold its handle, and the writer
//! emits a `$ref` for every such use.

pub mod components;
pub mod content;
pub mod extensions;
pub mod info;
pub mod node;
pub mod parameter;
pub mod path;
pub mod schema;
pub mod security;
pub mod server;

pub use components::{ComponentId, ComponentKind, Components};
pub use content::{
    ContentOwner, Encoding, Example, ExampleOwner, ExampleValue, HeaderOwner, Link, LinkTarget,
    MediaType, RequestBody, Response, Responses, SchemaOwner,
};
pub use extensions::{Extensible, Extensions, LINT_DISABLE_EXTENSION};
pub use info::{Contact, ExternalDocumentation, Info, License, Tag, Tags};
pub use node::{
    CallbackId, ExampleId, HeaderId, LinkId, MediaTypeId, NodeId, NodeRef, OperationId,
    OwnedNode, ParameterId, PathItemId, RequestBodyId, ResponseId, SchemaId, SecuritySchemeId,
};
pub use parameter::{
    ExampleSet, Header, Parameter, ParameterKind, ParameterLocation, ParameterOwner,
    ParameterStyle, ParameterValue, QueryOptions,
};
pub use path::{Callback, Operation, PathItem};
pub use schema::{
    AdditionalProperties, Discriminator, Schema, SchemaInit, SchemaOptions, SchemaSlot,
    SchemaSource, Xml,
};
pub use security::{
    ApiKeyLocation, OAuthFlow, OAuthFlowKind, OAuthFlows, SecurityRequirement, SecurityScheme,
    SecuritySchemeKind,
};
pub use server::{Server, ServerVariable};

use crate::COMPONENTS_FIELD;
use crate::error::{OpenApiError, Result};
use crate::types::{DEFAULT_OPENAPI_VERSION, OpenApiVersion};
use indexmap::IndexMap;
use node::{Attach, NodeStore};
use security::remove_requirement;
use std::collections::HashSet;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// The root of an OpenAPI document.
#[derive(Debug)]
pub struct Document {
    openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub(crate) paths: IndexMap<String, PathItemId>,
    /// `x-` fields of the Paths Object.
    pub paths_extensions: Extensions,
    pub(crate) components: Components,
    pub(crate) security: Vec<SecurityRequirement>,
    pub tags: Tags,
    pub external_docs: Option<ExternalDocumentation>,
    pub extensions: Extensions,
    pub(crate) nodes: NodeStore,
}

extensions::impl_extensible!(Document);

impl Document {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info: Info::new(title, version),
            servers: Vec::new(),
            paths: IndexMap::new(),
            paths_extensions: Extensions::new(),
            components: Components::default(),
            security: Vec::new(),
            tags: Tags::default(),
            external_docs: None,
            extensions: Extensions::new(),
            nodes: NodeStore::default(),
        }
    }

    /// The `openapi` version tag.
    pub fn openapi(&self) -> &str {
        &self.openapi
    }

    pub fn set_openapi(&mut self, version: impl Into<String>) -> Result<()> {
        let version = version.into();
        OpenApiVersion::from_str(&version)?;
        self.openapi = version;
        Ok(())
    }

    pub(crate) fn set_openapi_unchecked(&mut self, version: String) {
        self.openapi = version;
    }

    pub fn get<I: NodeId>(&self, id: I) -> Option<&I::Node> {
        self.nodes.get(id)
    }

    pub fn get_mut<I: NodeId>(&mut self, id: I) -> Option<&mut I::Node> {
        self.nodes.get_mut(id)
    }

    /// Number of live arena nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.live_count()
    }

    pub fn parent_of(&self, node: impl Into<NodeRef>) -> Option<NodeRef> {
        self.nodes.parent_of(node.into())
    }

    /// Whether the node is registered in the components section.
    pub fn is_shared(&self, node: impl Into<NodeRef>) -> bool {
        self.parent_of(node) == Some(NodeRef::Components)
    }

    /// Whether `rule` is suppressed by `fresha-lint-disable`, on the node itself or on
    /// the document root.
    pub fn is_lint_rule_disabled(&self, node: &Extensions, rule: &str) -> bool {
        node.disables_lint_rule(rule) || self.extensions.disables_lint_rule(rule)
    }

    pub fn security(&self) -> &[SecurityRequirement] {
        &self.security
    }

    pub fn add_security_requirement(&mut self, requirement: SecurityRequirement) {
        self.security.push(requirement);
    }

    pub fn remove_security_requirement(&mut self, index: usize) -> Result<SecurityRequirement> {
        remove_requirement(&mut self.security, index)
    }

    /// Removes every document-level requirement, the first one included.
    pub fn clear_security_requirements(&mut self) -> Vec<SecurityRequirement> {
        self.security.drain(0..).collect()
    }

    /// Fails unless `id` is registered in the components section, the only place a node
    /// may be linked from more than one slot.
    pub(crate) fn ensure_shared<I: NodeId>(&self, id: I) -> Result<()> {
        match self.nodes.parent_of(id.into()) {
            Some(NodeRef::Components) => Ok(()),
            Some(_) => Err(OpenApiError::invariant(format!(
                "{:?} is not registered in components and cannot be referenced",
                id
            ))),
            None => Err(OpenApiError::invariant(format!("{:?} no longer exists", id))),
        }
    }

    /// Allocates a new child or vets a shared one.
    pub(crate) fn place<I: NodeId>(&mut self, child: Attach<I>) -> Result<I> {
        match child {
            Attach::New(node) => Ok(self.nodes.alloc(node)),
            Attach::Shared(id) => {
                self.ensure_shared(id)?;
                Ok(id)
            }
        }
    }

    /// Inserts a child under a unique key of the map `map` selects.
    pub(crate) fn attach<I, F>(
        &mut self,
        collection: &str,
        key: String,
        child: Attach<I>,
        map: F,
    ) -> Result<I>
    where
        I: NodeId,
        F: Fn(&mut Document) -> Result<&mut IndexMap<String, I>>,
    {
        // vetted before `map` runs, since selecting the map may create an empty container
        if let Attach::Shared(id) = &child {
            self.ensure_shared(*id)?;
        }
        if map(self)?.contains_key(&key) {
            return Err(OpenApiError::duplicate_key(collection, &key));
        }
        let id = self.place(child)?;
        map(self)?.insert(key, id);
        Ok(id)
    }

    /// Removes the child under `key` and releases it from `owner`.
    pub(crate) fn detach<I, F>(&mut self, owner: NodeRef, key: &str, map: F) -> Result<Option<I>>
    where
        I: NodeId,
        F: Fn(&mut Document) -> Result<&mut IndexMap<String, I>>,
    {
        let removed = map(self)?.shift_remove(key);
        if let Some(id) = removed {
            self.release(owner, id.into());
        }
        Ok(removed)
    }

    /// Whether `node` is `ancestor` itself or sits in the subtree `ancestor` owns.
    pub(crate) fn is_within(&self, node: NodeRef, ancestor: NodeRef) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes.parent_of(n);
        }
        false
    }

    /// Frees `child` if `owner` owns it; shared children are only unlinked.
    pub(crate) fn release(&mut self, owner: NodeRef, child: NodeRef) {
        if self.nodes.parent_of(child) == Some(owner) {
            self.free(child);
        }
    }

    fn free(&mut self, node: NodeRef) {
        for (_, child) in self.slots(node) {
            if self.nodes.parent_of(child) == Some(node) {
                self.free(child);
            }
        }
        self.nodes.remove(node);
    }

    /// Child handles held by `node`, each with the pointer segments from `node` to it.
    pub(crate) fn slots(&self, node: NodeRef) -> Vec<(Vec<String>, NodeRef)> {
        let nodes = &self.nodes;
        let slots = match node {
            NodeRef::Document => {
                let mut slots = node::Slots::default();
                slots.keyed(&["paths"], &self.paths);
                slots
            }
            NodeRef::Components => {
                return self
                    .components
                    .entries()
                    .into_iter()
                    .map(|(kind, key, id)| {
                        let path = vec![
                            COMPONENTS_FIELD.to_string(),
                            kind.as_str().to_string(),
                            key.to_string(),
                        ];
                        (path, id)
                    })
                    .collect();
            }
            NodeRef::Schema(id) => nodes.get(id).map(Schema::slots).unwrap_or_default(),
            NodeRef::Parameter(id) => nodes
                .get(id)
                .map(|p| parameter::value_slots(&p.value, &p.examples))
                .unwrap_or_default(),
            NodeRef::Header(id) => nodes
                .get(id)
                .map(|h| parameter::value_slots(&h.value, &h.examples))
                .unwrap_or_default(),
            NodeRef::Response(id) => nodes.get(id).map(Response::slots).unwrap_or_default(),
            NodeRef::RequestBody(id) => nodes.get(id).map(RequestBody::slots).unwrap_or_default(),
            NodeRef::MediaType(id) => nodes.get(id).map(MediaType::slots).unwrap_or_default(),
            NodeRef::Callback(id) => nodes.get(id).map(Callback::slots).unwrap_or_default(),
            NodeRef::PathItem(id) => nodes.get(id).map(PathItem::slots).unwrap_or_default(),
            NodeRef::Operation(id) => nodes.get(id).map(Operation::slots).unwrap_or_default(),
            NodeRef::Example(_) | NodeRef::Link(_) | NodeRef::SecurityScheme(_) => {
                node::Slots::default()
            }
        };
        slots.into_vec()
    }

    /// Every node holding `target` in one of its slots, in graph order. The components
    /// section counts as a holder for registered nodes.
    pub fn usages(&self, target: impl Into<NodeRef>) -> Vec<NodeRef> {
        let target = target.into();
        let mut holders = Vec::new();
        let mut seen = HashSet::new();
        let candidates = [NodeRef::Document, NodeRef::Components]
            .into_iter()
            .chain(self.nodes.live_nodes());
        for holder in candidates {
            if self.slots(holder).iter().any(|(_, child)| *child == target) && seen.insert(holder) {
                holders.push(holder);
            }
        }
        holders
    }
}

impl<I: NodeId> Index<I> for Document {
    type Output = I::Node;

    /// Panics on a handle whose node has been removed; use [`Document::get`] to check.
    fn index(&self, id: I) -> &I::Node {
        match self.nodes.get(id) {
            Some(node) => node,
            None => panic!("{:?} refers to a removed node", id),
        }
    }
}

impl<I: NodeId> IndexMut<I> for Document {
    fn index_mut(&mut self, id: I) -> &mut I::Node {
        match self.nodes.get_mut(id) {
            Some(node) => node,
            None => panic!("{:?} refers to a removed node", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaType;
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_new_document_defaults() {
        let doc = Document::new("Pets", "1.0.0");
        assert_eq!(doc.openapi(), "3.0.3");
        assert_eq!(doc.node_count(), 0);
        assert!(doc.components().is_empty());
        assert!(doc.security().is_empty());
    }

    #[test]
    fn test_set_openapi_checks_release_line() {
        let mut doc = Document::new("Pets", "1.0.0");
        doc.set_openapi("3.0.1").unwrap();
        let err = doc.set_openapi("3.1.0").unwrap_err();
        assert!(matches!(err, OpenApiError::UnsupportedVersion(_)));
        assert_eq!(doc.openapi(), "3.0.1");
    }

    #[test]
    fn test_clearing_security_removes_the_first_requirement_too() {
        let mut doc = Document::new("Pets", "1.0.0");
        doc.add_security_requirement(SecurityRequirement::new().with("oauth", &["read"]));
        doc.add_security_requirement(SecurityRequirement::new().with("apiKey", &[]));
        let removed = doc.clear_security_requirements();
        assert_eq!(removed.len(), 2);
        assert!(doc.security().is_empty());
        assert!(doc.remove_security_requirement(0).is_err());
    }

    #[test]
    fn test_usages_lists_every_holder() {
        let mut doc = Document::new("Pets", "1.0.0");
        let pet = doc.add_schema("Pet", SchemaType::Object.into()).unwrap();
        let list = doc.add_schema("Pets", SchemaType::Array.into()).unwrap();
        doc.set_items(list, pet).unwrap();
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        let response = doc.add_response(op, "200", "OK").unwrap();
        let media = doc.add_media_type(response, "application/json").unwrap();
        doc.set_schema(media, pet).unwrap();

        assert_eq!(
            doc.usages(pet),
            vec![NodeRef::Components, NodeRef::Schema(list), NodeRef::MediaType(media)]
        );
        assert_eq!(doc.usages(op), vec![NodeRef::PathItem(item)]);
    }

    #[test]
    fn test_self_referencing_schema_can_be_removed() {
        let mut doc = Document::new("Pets", "1.0.0");
        let node = doc.add_schema("Node", SchemaType::Object.into()).unwrap();
        doc.add_property(node, "next", node).unwrap();
        let children = doc.set_items(node, SchemaType::Array).unwrap();
        doc.set_items(children, node).unwrap();

        let item = doc.add_path_item("/nodes").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        let response = doc.add_response(op, "200", "OK").unwrap();
        let media = doc.add_media_type(response, "application/json").unwrap();
        doc.set_schema(media, node).unwrap();
        assert!(doc.remove_component::<SchemaId>("Node").is_err());

        doc.remove_path_item("/nodes");
        assert_eq!(doc.remove_component::<SchemaId>("Node").unwrap(), Some(node));
        assert!(doc.get(children).is_none());
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_lint_disable_falls_back_to_root() {
        let mut doc = Document::new("Pets", "1.0.0");
        let pet = doc.add_schema("Pet", SchemaType::Object.into()).unwrap();
        assert!(!doc.is_lint_rule_disabled(&doc[pet].extensions, "naming"));
        doc.extensions.set("x-fresha-lint-disable", json!(["naming"]));
        assert!(doc.is_lint_rule_disabled(&doc[pet].extensions, "naming"));
        assert!(!doc.is_lint_rule_disabled(&doc[pet].extensions, "casing"));
    }

    #[test]
    #[should_panic(expected = "removed node")]
    fn test_indexing_a_removed_node_panics() {
        let mut doc = Document::new("Pets", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        doc.remove_path_item("/pets");
        let _ = &doc[item];
    }
}
