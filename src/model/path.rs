//! Paths, Path Items, Operations and Callbacks.

use crate::error::{OpenApiError, Result};
use crate::model::Document;
use crate::model::content::{DEFAULT_RESPONSE, RequestBody, Response, Responses, validate_status_code};
use crate::model::extensions::Extensions;
use crate::model::info::ExternalDocumentation;
use crate::model::node::{
    Attach, CallbackId, NodeRef, OperationId, ParameterId, PathItemId, RequestBodyId, ResponseId,
    Slots, impl_owned_node,
};
use crate::model::security::{SecurityRequirement, remove_requirement};
use crate::model::server::Server;
use http::Method;
use indexmap::IndexMap;

/// The eight verbs a Path Item may carry, in the order they are declared by OpenAPI.
pub const HTTP_METHODS: [Method; 8] = [
    Method::GET,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
    Method::PATCH,
    Method::TRACE,
];

const METHOD_KEYS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// The Path Item field name of a supported verb.
pub fn method_key(method: &Method) -> Option<&'static str> {
    HTTP_METHODS
        .iter()
        .position(|m| m == method)
        .map(|index| METHOD_KEYS[index])
}

/// Inverse of [`method_key`]; only lower-case verb names are field names.
pub fn method_from_key(key: &str) -> Option<Method> {
    METHOD_KEYS
        .iter()
        .position(|k| *k == key)
        .map(|index| HTTP_METHODS[index].clone())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathItem {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub servers: Vec<Server>,
    pub(crate) parameters: Vec<ParameterId>,
    pub(crate) operations: IndexMap<Method, OperationId>,
}

impl_owned_node!(PathItem);

impl PathItem {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            summary: None,
            description: None,
            servers: Vec::new(),
            parameters: Vec::new(),
            operations: IndexMap::new(),
        }
    }

    pub fn operation(&self, method: &Method) -> Option<OperationId> {
        self.operations.get(method).copied()
    }

    pub fn operations(&self) -> impl Iterator<Item = (&Method, OperationId)> {
        self.operations.iter().map(|(m, id)| (m, *id))
    }

    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.listed(&["parameters"], &self.parameters);
        for (method, id) in &self.operations {
            if let Some(key) = method_key(method) {
                slots.one(&[key], *id);
            }
        }
        slots
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub external_docs: Option<ExternalDocumentation>,
    pub operation_id: Option<String>,
    pub(crate) parameters: Vec<ParameterId>,
    pub(crate) request_body: Option<RequestBodyId>,
    pub(crate) responses: Responses,
    pub(crate) callbacks: IndexMap<String, CallbackId>,
    pub deprecated: bool,
    security: Option<Vec<SecurityRequirement>>,
    pub servers: Vec<Server>,
}

impl_owned_node!(Operation);

impl Operation {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            tags: Vec::new(),
            summary: None,
            description: None,
            external_docs: None,
            operation_id: None,
            parameters: Vec::new(),
            request_body: None,
            responses: Responses::default(),
            callbacks: IndexMap::new(),
            deprecated: false,
            security: None,
            servers: Vec::new(),
        }
    }

    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    pub fn request_body(&self) -> Option<RequestBodyId> {
        self.request_body
    }

    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    /// Extensions of the Responses Object.
    pub fn responses_extensions_mut(&mut self) -> &mut Extensions {
        &mut self.responses.extensions
    }

    pub fn callbacks(&self) -> &IndexMap<String, CallbackId> {
        &self.callbacks
    }

    /// `None` inherits the document requirements; `Some(&[])` opts out of security.
    pub fn security(&self) -> Option<&[SecurityRequirement]> {
        self.security.as_deref()
    }

    pub fn set_security(&mut self, security: Option<Vec<SecurityRequirement>>) {
        self.security = security;
    }

    pub fn add_security_requirement(&mut self, requirement: SecurityRequirement) {
        self.security.get_or_insert_with(Vec::new).push(requirement);
    }

    /// Fails without touching an inherited (`None`) requirement list.
    pub fn remove_security_requirement(&mut self, index: usize) -> Result<SecurityRequirement> {
        match self.security.as_mut() {
            Some(list) => remove_requirement(list, index),
            None => Err(OpenApiError::invariant(
                "operation has no security requirements of its own",
            )),
        }
    }

    /// Removes every requirement, leaving an explicit empty list.
    pub fn clear_security_requirements(&mut self) -> Vec<SecurityRequirement> {
        self.security
            .get_or_insert_with(Vec::new)
            .drain(0..)
            .collect()
    }

    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.listed(&["parameters"], &self.parameters);
        slots.optional(&["requestBody"], self.request_body);
        self.responses.push_slots(&mut slots);
        slots.keyed(&["callbacks"], &self.callbacks);
        slots
    }
}

/// A Callback Object: runtime expressions mapped to Path Items.
#[derive(Debug, Clone, PartialEq)]
pub struct Callback {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub(crate) expressions: IndexMap<String, PathItemId>,
}

impl_owned_node!(Callback);

impl Callback {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            expressions: IndexMap::new(),
        }
    }

    pub fn path_item(&self, expression: &str) -> Option<PathItemId> {
        self.expressions.get(expression).copied()
    }

    pub fn expressions(&self) -> impl Iterator<Item = (&str, PathItemId)> {
        self.expressions.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.keyed(&[], &self.expressions);
        slots
    }
}

impl Document {
    /// Adds an empty Path Item under `path`, which must start with `/`.
    pub fn add_path_item(&mut self, path: impl Into<String>) -> Result<PathItemId> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(OpenApiError::invariant(format!(
                "path '{}' must start with '/'",
                path
            )));
        }
        let node = PathItem::new(NodeRef::Document);
        self.attach("paths", path, Attach::New(node), |doc| Ok(&mut doc.paths))
    }

    pub fn path_item(&self, path: &str) -> Option<PathItemId> {
        self.paths.get(path).copied()
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, PathItemId)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn remove_path_item(&mut self, path: &str) -> bool {
        matches!(
            self.detach(NodeRef::Document, path, |doc| Ok(&mut doc.paths)),
            Ok(Some(_))
        )
    }

    pub fn add_operation(&mut self, path_item: PathItemId, method: Method) -> Result<OperationId> {
        if method_key(&method).is_none() {
            return Err(OpenApiError::invariant(format!(
                "{} is not a Path Item operation",
                method
            )));
        }
        if self[path_item].operations.contains_key(&method) {
            return Err(OpenApiError::duplicate_key("path item", method.as_str()));
        }
        let id = self.nodes.alloc(Operation::new(path_item.into()));
        self[path_item].operations.insert(method, id);
        Ok(id)
    }

    pub fn remove_operation(&mut self, path_item: PathItemId, method: &Method) -> bool {
        let Some(id) = self[path_item].operations.shift_remove(method) else {
            return false;
        };
        self.release(path_item.into(), id.into());
        true
    }

    /// Gives the operation a new, empty request body, releasing any previous one.
    pub fn set_request_body(&mut self, operation: OperationId) -> RequestBodyId {
        let id = self.nodes.alloc(RequestBody::new(operation.into()));
        self.replace_request_body(operation, id);
        id
    }

    pub fn set_request_body_ref(&mut self, operation: OperationId, shared: RequestBodyId) -> Result<()> {
        self.ensure_shared(shared)?;
        self.replace_request_body(operation, shared);
        Ok(())
    }

    pub fn clear_request_body(&mut self, operation: OperationId) {
        if let Some(previous) = self[operation].request_body.take() {
            self.release(operation.into(), previous.into());
        }
    }

    fn replace_request_body(&mut self, operation: OperationId, id: RequestBodyId) {
        if let Some(previous) = self[operation].request_body.replace(id) {
            if previous != id {
                self.release(operation.into(), previous.into());
            }
        }
    }

    fn attach_response(
        &mut self,
        operation: OperationId,
        key: String,
        child: Attach<ResponseId>,
    ) -> Result<ResponseId> {
        if key != DEFAULT_RESPONSE {
            validate_status_code(&key)?;
            return self.attach("responses", key, child, |doc| {
                Ok(&mut doc[operation].responses.codes)
            });
        }
        if self[operation].responses.default.is_some() {
            return Err(OpenApiError::duplicate_key("responses", DEFAULT_RESPONSE));
        }
        let id = self.place(child)?;
        self[operation].responses.default = Some(id);
        Ok(id)
    }

    /// Adds a response under a status code, a `1XX`-style range or `default`.
    pub fn add_response(
        &mut self,
        operation: OperationId,
        key: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ResponseId> {
        let node = Response::new(operation.into(), description);
        self.attach_response(operation, key.into(), Attach::New(node))
    }

    pub fn add_response_ref(
        &mut self,
        operation: OperationId,
        key: impl Into<String>,
        shared: ResponseId,
    ) -> Result<()> {
        self.attach_response(operation, key.into(), Attach::Shared(shared))?;
        Ok(())
    }

    pub fn remove_response(&mut self, operation: OperationId, key: &str) -> bool {
        let removed = if key == DEFAULT_RESPONSE {
            self[operation].responses.default.take()
        } else {
            self[operation].responses.codes.shift_remove(key)
        };
        match removed {
            Some(id) => {
                self.release(operation.into(), id.into());
                true
            }
            None => false,
        }
    }

    pub fn add_callback(&mut self, operation: OperationId, name: impl Into<String>) -> Result<CallbackId> {
        let node = Callback::new(operation.into());
        self.attach("callbacks", name.into(), Attach::New(node), |doc| {
            Ok(&mut doc[operation].callbacks)
        })
    }

    pub fn add_callback_ref(
        &mut self,
        operation: OperationId,
        name: impl Into<String>,
        shared: CallbackId,
    ) -> Result<()> {
        self.attach("callbacks", name.into(), Attach::Shared(shared), |doc| {
            Ok(&mut doc[operation].callbacks)
        })?;
        Ok(())
    }

    pub fn remove_callback(&mut self, operation: OperationId, name: &str) -> bool {
        matches!(
            self.detach(operation.into(), name, |doc| Ok(&mut doc[operation].callbacks)),
            Ok(Some(_))
        )
    }

    /// Adds the Path Item invoked for a callback `expression`.
    pub fn add_callback_path_item(
        &mut self,
        callback: CallbackId,
        expression: impl Into<String>,
    ) -> Result<PathItemId> {
        let node = PathItem::new(callback.into());
        self.attach("callback", expression.into(), Attach::New(node), |doc| {
            Ok(&mut doc[callback].expressions)
        })
    }

    pub fn remove_callback_path_item(&mut self, callback: CallbackId, expression: &str) -> bool {
        matches!(
            self.detach(callback.into(), expression, |doc| Ok(&mut doc[callback].expressions)),
            Ok(Some(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::OwnedNode;
    use crate::model::parameter::ParameterLocation;
    use crate::types::SchemaType;

    #[test]
    fn test_method_keys() {
        assert_eq!(method_key(&Method::PATCH), Some("patch"));
        assert_eq!(method_key(&Method::CONNECT), None);
        assert_eq!(method_from_key("trace"), Some(Method::TRACE));
        assert_eq!(method_from_key("GET"), None);
        assert_eq!(method_from_key("connect"), None);
    }

    #[test]
    fn test_paths_must_be_rooted_and_unique() {
        let mut doc = Document::new("Test", "1.0.0");
        assert!(doc.add_path_item("pets").is_err());
        let item = doc.add_path_item("/pets").unwrap();
        assert!(doc.add_path_item("/pets").is_err());
        assert_eq!(doc.path_item("/pets"), Some(item));
        assert_eq!(doc[item].parent(), NodeRef::Document);
    }

    #[test]
    fn test_operations_per_verb() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let get = doc.add_operation(item, Method::GET).unwrap();
        assert!(doc.add_operation(item, Method::GET).is_err());
        assert!(doc.add_operation(item, Method::CONNECT).is_err());
        doc.add_operation(item, Method::POST).unwrap();
        assert_eq!(doc[item].operation(&Method::GET), Some(get));
        assert!(doc.remove_operation(item, &Method::GET));
        assert!(doc.get(get).is_none());
        assert!(!doc.remove_operation(item, &Method::GET));
    }

    #[test]
    fn test_removing_a_path_frees_the_whole_subtree() {
        let mut doc = Document::new("Test", "1.0.0");
        let shared = doc.add_schema("Pet", SchemaType::Object.into()).unwrap();
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        let param = doc.add_parameter(op, "limit", ParameterLocation::Query).unwrap();
        doc.set_schema(param, SchemaType::Integer).unwrap();
        let response = doc.add_response(op, "200", "OK").unwrap();
        let media = doc.add_media_type(response, "application/json").unwrap();
        doc.set_schema(media, shared).unwrap();

        let before = doc.node_count();
        assert!(doc.remove_path_item("/pets"));
        // path item, operation, parameter, its schema, response, media type
        assert_eq!(doc.node_count(), before - 6);
        assert!(doc.get(shared).is_some());
    }

    #[test]
    fn test_response_keys() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        assert!(doc.add_response(op, "600", "Nope").is_err());
        let fallback = doc.add_response(op, "default", "Error").unwrap();
        assert!(doc.add_response(op, "default", "Again").is_err());
        doc.add_response(op, "2XX", "Fine").unwrap();

        let responses = doc[op].responses();
        assert_eq!(responses.default_response(), Some(fallback));
        assert_eq!(responses.codes().map(|(k, _)| k).collect::<Vec<_>>(), vec!["2XX"]);
        assert!(doc.remove_response(op, "default"));
        assert!(doc.get(fallback).is_none());
    }

    #[test]
    fn test_request_body_replacement() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::POST).unwrap();
        let first = doc.set_request_body(op);
        let shared = doc.add_component_request_body("NewPet").unwrap();
        doc.set_request_body_ref(op, shared).unwrap();
        assert!(doc.get(first).is_none());
        doc.clear_request_body(op);
        assert!(doc.get(shared).is_some());
        assert_eq!(doc[op].request_body(), None);
    }

    #[test]
    fn test_operation_security_absent_versus_empty() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        let operation = &mut doc[op];
        assert_eq!(operation.security(), None);

        operation.add_security_requirement(SecurityRequirement::new().with("oauth", &["read"]));
        operation.add_security_requirement(SecurityRequirement::new().with("apiKey", &[]));
        let cleared = operation.clear_security_requirements();
        assert_eq!(cleared.len(), 2);
        assert_eq!(operation.security(), Some(&[][..]));

        operation.set_security(None);
        assert_eq!(operation.security(), None);
    }

    #[test]
    fn test_failed_security_removal_keeps_inherited_requirements() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();

        let err = doc[op].remove_security_requirement(0).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        assert_eq!(doc[op].security(), None);

        doc[op].add_security_requirement(SecurityRequirement::new().with("oauth", &["read"]));
        assert!(doc[op].remove_security_requirement(1).is_err());
        let removed = doc[op].remove_security_requirement(0).unwrap();
        assert_eq!(removed.scopes("oauth"), Some(&["read".to_string()][..]));
        assert_eq!(doc[op].security(), Some(&[][..]));
    }

    #[test]
    fn test_callbacks_own_their_path_items() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/subscribe").unwrap();
        let op = doc.add_operation(item, Method::POST).unwrap();
        let callback = doc.add_callback(op, "onEvent").unwrap();
        let target = doc
            .add_callback_path_item(callback, "{$request.body#/callbackUrl}")
            .unwrap();
        let notify = doc.add_operation(target, Method::POST).unwrap();
        assert_eq!(doc[target].parent(), NodeRef::Callback(callback));

        assert!(doc.remove_callback(op, "onEvent"));
        assert!(doc.get(target).is_none());
        assert!(doc.get(notify).is_none());
    }
}
