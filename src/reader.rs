//! Reads a generic JSON value into a [`Document`] graph.
//!
//! The components section is read first. Every `$ref` is then resolved through a pointer
//! table scoped to the single read call; a reference to a component that has not been
//! read yet reads that component on the spot, so forward and mutual references need no
//! second pass. Any violation aborts the whole read.

use crate::error::{OpenApiError, Result};
use crate::model::components::{ComponentId, ComponentKind, parse_component_pointer};
use crate::model::content::{DEFAULT_RESPONSE, validate_status_code};
use crate::model::node::Attach;
use crate::model::path::{HTTP_METHODS, method_from_key, method_key};
use crate::model::{
    AdditionalProperties, ApiKeyLocation, Callback, CallbackId, Contact, Document, Encoding,
    Example, ExampleId, ExampleSet, ExampleValue, Extensions, ExternalDocumentation, Header,
    HeaderId, Info, License, Link, LinkId, LinkTarget, MediaType, MediaTypeId, NodeRef,
    OAuthFlow, OAuthFlowKind, OAuthFlows, Operation, OperationId, Parameter, ParameterId,
    ParameterLocation, ParameterStyle, ParameterValue, PathItem, PathItemId, RequestBody,
    RequestBodyId, Response, ResponseId, Responses, Schema, SchemaId, SecurityRequirement,
    SecurityScheme, SecuritySchemeId, SecuritySchemeKind, Server, Xml,
};
use crate::types::{JsonPath, OpenApiVersion, SchemaType};
use crate::{
    COMPONENTS_FIELD, CONTENT_FIELD, DEPRECATED_FIELD, DESCRIPTION_FIELD, EXAMPLE_FIELD,
    EXAMPLES_FIELD, EXPLODE_FIELD, EXTENSION_PREFIX, EXTERNAL_DOCS_FIELD, HEADERS_FIELD,
    IN_FIELD, INFO_FIELD, NAME_FIELD, OPENAPI_FIELD, PARAMETERS_FIELD, PATHS_FIELD,
    REF_FIELD, REQUEST_BODY_FIELD, REQUIRED_FIELD, RESPONSES_FIELD,
    SCHEMA_FIELD, SECURITY_FIELD, SERVERS_FIELD, STYLE_FIELD, SUMMARY_FIELD, TAGS_FIELD,
    URL_FIELD,
};
use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

const ROOT_FIELDS: &[&str] = &[
    OPENAPI_FIELD,
    INFO_FIELD,
    SERVERS_FIELD,
    PATHS_FIELD,
    COMPONENTS_FIELD,
    SECURITY_FIELD,
    TAGS_FIELD,
    EXTERNAL_DOCS_FIELD,
];

const SCHEMA_FIELDS: &[&str] = &[
    "title",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxProperties",
    "minProperties",
    REQUIRED_FIELD,
    "enum",
    "type",
    "allOf",
    "oneOf",
    "anyOf",
    "not",
    "items",
    "properties",
    "additionalProperties",
    DESCRIPTION_FIELD,
    "format",
    "default",
    "nullable",
    "discriminator",
    "readOnly",
    "writeOnly",
    "xml",
    EXTERNAL_DOCS_FIELD,
    EXAMPLE_FIELD,
    DEPRECATED_FIELD,
];

const PARAMETER_FIELDS: &[&str] = &[
    NAME_FIELD,
    IN_FIELD,
    DESCRIPTION_FIELD,
    REQUIRED_FIELD,
    DEPRECATED_FIELD,
    STYLE_FIELD,
    EXPLODE_FIELD,
    SCHEMA_FIELD,
    CONTENT_FIELD,
    EXAMPLE_FIELD,
    EXAMPLES_FIELD,
];

const QUERY_FIELDS: &[&str] = &["allowEmptyValue", "allowReserved"];

const HEADER_FIELDS: &[&str] = &[
    DESCRIPTION_FIELD,
    REQUIRED_FIELD,
    DEPRECATED_FIELD,
    STYLE_FIELD,
    EXPLODE_FIELD,
    SCHEMA_FIELD,
    CONTENT_FIELD,
    EXAMPLE_FIELD,
    EXAMPLES_FIELD,
];

const OPERATION_FIELDS: &[&str] = &[
    TAGS_FIELD,
    SUMMARY_FIELD,
    DESCRIPTION_FIELD,
    EXTERNAL_DOCS_FIELD,
    "operationId",
    PARAMETERS_FIELD,
    REQUEST_BODY_FIELD,
    RESPONSES_FIELD,
    "callbacks",
    DEPRECATED_FIELD,
    SECURITY_FIELD,
    SERVERS_FIELD,
];

/// Options controlling how strictly a document is read.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    reject_unknown_fields: bool,
    check_version: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            reject_unknown_fields: true,
            check_version: true,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `false`, fields the model does not know are skipped with a warning instead of
    /// failing the read.
    pub fn reject_unknown_fields(mut self, reject: bool) -> Self {
        self.reject_unknown_fields = reject;
        self
    }

    /// When `false`, the `openapi` tag is kept as-is without checking the release line.
    pub fn check_version(mut self, check: bool) -> Self {
        self.check_version = check;
        self
    }
}

/// Reads documents with a fixed set of [`ReaderOptions`].
#[derive(Debug, Clone, Default)]
pub struct OpenApiReader {
    options: ReaderOptions,
}

impl OpenApiReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    /// Builds a [`Document`] from a generic JSON value.
    ///
    /// # Parameters
    /// - `raw`: The whole OpenAPI document
    ///
    /// # Returns
    /// The document graph, or the first structural, reference or invariant error found.
    pub fn read(&self, raw: &Value) -> Result<Document> {
        let root = Obj::new(raw, JsonPath::new())?;
        let openapi = root.required_str(OPENAPI_FIELD)?;
        if self.options.check_version {
            OpenApiVersion::from_str(openapi)?;
        }
        let info_obj = root.required_object(INFO_FIELD)?;
        let paths = root.required_object(PATHS_FIELD)?;
        debug!("Reading OpenAPI {} document", openapi);

        let mut state = ReadState::new(&self.options, root.object(COMPONENTS_FIELD)?);
        state.doc.set_openapi_unchecked(openapi.to_string());
        state.doc.info = state.read_info(&info_obj)?;
        state.doc.extensions = state.extensions(&root, ROOT_FIELDS)?;
        state.read_components()?;

        state.doc.servers = state.read_servers(&root)?;
        if let Some(security) = state.read_security(&root)? {
            state.doc.security = security;
        }
        state.read_tags(&root)?;
        state.doc.external_docs = state.read_external_docs(&root)?;

        for (key, raw) in paths.map {
            if key.starts_with(EXTENSION_PREFIX) {
                state.doc.paths_extensions.set(key, raw.clone());
                continue;
            }
            if !key.starts_with('/') {
                return Err(
                    OpenApiError::invariant(format!("path '{}' must start with '/'", key))
                        .at(&paths.path),
                );
            }
            let item = state.read_path_item(NodeRef::Document, raw, paths.at(key))?;
            state.doc.paths.insert(key.clone(), item);
        }

        debug!(
            "Read OpenAPI document: {} paths, {} nodes",
            state.doc.paths.len(),
            state.doc.node_count()
        );
        Ok(state.doc)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

/// A JSON object being read, together with its location for error reporting.
#[derive(Debug, Clone)]
struct Obj<'v> {
    map: &'v Map<String, Value>,
    path: JsonPath,
}

impl<'v> Obj<'v> {
    fn new(value: &'v Value, path: JsonPath) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Obj { map, path }),
            other => Err(OpenApiError::type_mismatch(&path, "object", json_type(other))),
        }
    }

    fn at(&self, field: &str) -> JsonPath {
        self.path.child(field)
    }

    fn get(&self, field: &str) -> Option<&'v Value> {
        self.map.get(field)
    }

    fn get_as_type<T, F>(&self, field: &str, expected: &str, converter: F) -> Result<Option<T>>
    where
        F: Fn(&'v Value) -> Option<T>,
    {
        match self.map.get(field) {
            None => Ok(None),
            Some(found) => converter(found).map(Some).ok_or_else(|| {
                OpenApiError::type_mismatch(&self.at(field), expected, json_type(found))
            }),
        }
    }

    fn str(&self, field: &str) -> Result<Option<&'v str>> {
        self.get_as_type(field, "string", Value::as_str)
    }

    fn string(&self, field: &str) -> Result<Option<String>> {
        Ok(self.str(field)?.map(str::to_owned))
    }

    fn required_str(&self, field: &str) -> Result<&'v str> {
        self.str(field)?
            .ok_or_else(|| OpenApiError::missing_field(&self.path, field))
    }

    fn bool(&self, field: &str) -> Result<Option<bool>> {
        self.get_as_type(field, "boolean", Value::as_bool)
    }

    /// A boolean that defaults to `false`.
    fn flag(&self, field: &str) -> Result<bool> {
        Ok(self.bool(field)?.unwrap_or(false))
    }

    fn u64(&self, field: &str) -> Result<Option<u64>> {
        self.get_as_type(field, "non-negative integer", Value::as_u64)
    }

    fn number(&self, field: &str) -> Result<Option<Number>> {
        self.get_as_type(field, "number", |v| match v {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        })
    }

    fn array(&self, field: &str) -> Result<Option<&'v Vec<Value>>> {
        self.get_as_type(field, "array", Value::as_array)
    }

    fn object(&self, field: &str) -> Result<Option<Obj<'v>>> {
        match self.map.get(field) {
            None => Ok(None),
            Some(found) => Obj::new(found, self.at(field)).map(Some),
        }
    }

    fn required_object(&self, field: &str) -> Result<Obj<'v>> {
        self.object(field)?
            .ok_or_else(|| OpenApiError::missing_field(&self.path, field))
    }

    fn strings(&self, field: &str) -> Result<Vec<String>> {
        let Some(items) = self.array(field)? else {
            return Ok(Vec::new());
        };
        let path = self.at(field);
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str().map(str::to_owned).ok_or_else(|| {
                    OpenApiError::type_mismatch(&path.child(index.to_string()), "string", json_type(item))
                })
            })
            .collect()
    }

    /// Parses a string field with `FromStr`, reporting unknown tokens as structural errors.
    fn token<T: FromStr>(&self, field: &str) -> Result<Option<T>> {
        match self.str(field)? {
            None => Ok(None),
            Some(raw) => T::from_str(raw).map(Some).map_err(|_| {
                OpenApiError::structural(&self.at(field), &format!("unexpected value '{}'", raw))
            }),
        }
    }
}

/// Returns the target of a Reference Object. A `$ref` may not carry sibling keys.
fn reference<'v>(value: &'v Value, path: &JsonPath) -> Result<Option<&'v str>> {
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let Some(target) = map.get(REF_FIELD) else {
        return Ok(None);
    };
    let Value::String(target) = target else {
        return Err(OpenApiError::type_mismatch(
            &path.child(REF_FIELD),
            "string",
            json_type(target),
        ));
    };
    if map.len() > 1 {
        return Err(OpenApiError::structural(
            path,
            "a $ref object may not carry sibling keys",
        ));
    }
    Ok(Some(target))
}

/// State of a single read call.
struct ReadState<'o, 'v> {
    options: &'o ReaderOptions,
    doc: Document,
    components: Option<Obj<'v>>,
    /// Canonical pointer to node, for every components entry read so far.
    table: HashMap<String, NodeRef>,
}

impl<'o, 'v> ReadState<'o, 'v> {
    fn new(options: &'o ReaderOptions, components: Option<Obj<'v>>) -> Self {
        Self {
            options,
            doc: Document::new("", ""),
            components,
            table: HashMap::new(),
        }
    }

    /// Collects `x-` fields and rejects fields outside `known`.
    fn extensions(&self, obj: &Obj<'v>, known: &[&str]) -> Result<Extensions> {
        let mut extensions = Extensions::new();
        for (key, value) in obj.map {
            if key.starts_with(EXTENSION_PREFIX) {
                extensions.set(key, value.clone());
            } else if !known.contains(&key.as_str()) {
                if self.options.reject_unknown_fields {
                    return Err(OpenApiError::structural(
                        &obj.path,
                        &format!("unknown field '{}'", key),
                    ));
                }
                warn!("Skipping unknown field '{}' at {}", key, obj.path);
            }
        }
        Ok(extensions)
    }

    fn read_map<I, F>(&mut self, obj: &Obj<'v>, field: &str, mut read: F) -> Result<IndexMap<String, I>>
    where
        F: FnMut(&mut Self, &'v Value, JsonPath) -> Result<I>,
    {
        let mut map = IndexMap::new();
        if let Some(section) = obj.object(field)? {
            for (key, raw) in section.map {
                let id = read(self, raw, section.at(key))?;
                map.insert(key.clone(), id);
            }
        }
        Ok(map)
    }

    fn raw_component(&self, kind: ComponentKind, key: &str) -> Option<(&'v Value, JsonPath)> {
        let components = self.components.as_ref()?;
        let section = components.map.get(kind.as_str())?.as_object()?;
        let raw = section.get(key)?;
        let mut path = components.at(kind.as_str());
        path.add(key);
        Some((raw, path))
    }

    /// Resolves `reference` to a node of kind `I`, reading the component if needed.
    fn resolve<I: ComponentId>(&mut self, reference: &str, path: &JsonPath) -> Result<I> {
        let Some((kind, key)) = parse_component_pointer(reference) else {
            return Err(OpenApiError::unresolved(reference, path));
        };
        if kind != I::KIND {
            return Err(OpenApiError::unresolved(reference, path));
        }
        self.component(kind, &key)?
            .and_then(I::from_node)
            .ok_or_else(|| OpenApiError::unresolved(reference, path))
    }

    fn component(&mut self, kind: ComponentKind, key: &str) -> Result<Option<NodeRef>> {
        if let Some(node) = self.table.get(&kind.pointer(key)) {
            return Ok(Some(*node));
        }
        let Some((raw, path)) = self.raw_component(kind, key) else {
            return Ok(None);
        };
        trace!("Reading {} on first reference", path);
        self.read_component(kind, key, raw, path).map(Some)
    }

    fn read_components(&mut self) -> Result<()> {
        let Some(components) = self.components.clone() else {
            return Ok(());
        };
        let sections: Vec<&str> = ComponentKind::ALL.iter().map(ComponentKind::as_str).collect();
        self.doc.components.extensions = self.extensions(&components, &sections)?;
        for kind in ComponentKind::ALL {
            let Some(section) = components.object(kind.as_str())? else {
                continue;
            };
            let mut order = Vec::with_capacity(section.map.len());
            for (key, raw) in section.map {
                order.push(key.clone());
                if !self.table.contains_key(&kind.pointer(key)) {
                    self.read_component(kind, key, raw, section.at(key))?;
                }
            }
            self.doc.reorder_components(kind, &order);
        }
        debug!("Read {} component nodes", self.doc.node_count());
        Ok(())
    }

    fn register<I: ComponentId>(&mut self, key: &str, node: I::Node) -> Result<I> {
        let id: I = self.doc.register(key.to_string(), Attach::New(node))?;
        self.table.insert(I::KIND.pointer(key), id.into());
        Ok(id)
    }

    /// Follows a chain of alias entries, without reading any body, to the first pointer
    /// that is already known or names an entry that is not itself a `$ref`.
    fn alias_target(&self, kind: ComponentKind, key: &str, first: &str, path: &JsonPath) -> Result<String> {
        let mut seen = HashSet::from([kind.pointer(key)]);
        let mut pointer = first.to_string();
        loop {
            let Some((target_kind, target_key)) = parse_component_pointer(&pointer) else {
                return Ok(pointer);
            };
            if target_kind != kind {
                return Ok(pointer);
            }
            pointer = target_kind.pointer(&target_key);
            if !seen.insert(pointer.clone()) {
                return Err(OpenApiError::structural(path, "circular $ref alias"));
            }
            if self.table.contains_key(&pointer) {
                return Ok(pointer);
            }
            let Some((raw, raw_path)) = self.raw_component(target_kind, &target_key) else {
                return Ok(pointer);
            };
            match reference(raw, &raw_path)? {
                Some(next) => pointer = next.to_string(),
                None => return Ok(pointer),
            }
        }
    }

    fn alias<I: ComponentId>(&mut self, key: &str, target: &str, path: &JsonPath) -> Result<NodeRef> {
        let target = self.alias_target(I::KIND, key, target, path)?;
        let id: I = self.resolve(&target, path)?;
        // a back reference inside the target's body may have aliased `key` already
        if let Some(node) = self.table.get(&I::KIND.pointer(key)) {
            return Ok(*node);
        }
        self.doc.add_component_alias(key, id)?;
        self.table.insert(I::KIND.pointer(key), id.into());
        Ok(id.into())
    }

    /// Reads one components entry. The node is registered before its body is read, so
    /// references back to it from inside resolve to the same node.
    fn read_component(
        &mut self,
        kind: ComponentKind,
        key: &str,
        raw: &'v Value,
        path: JsonPath,
    ) -> Result<NodeRef> {
        if let Some(target) = reference(raw, &path)? {
            return match kind {
                ComponentKind::Schemas => self.alias::<SchemaId>(key, target, &path),
                ComponentKind::Responses => self.alias::<ResponseId>(key, target, &path),
                ComponentKind::Parameters => self.alias::<ParameterId>(key, target, &path),
                ComponentKind::Examples => self.alias::<ExampleId>(key, target, &path),
                ComponentKind::RequestBodies => self.alias::<RequestBodyId>(key, target, &path),
                ComponentKind::Headers => self.alias::<HeaderId>(key, target, &path),
                ComponentKind::SecuritySchemes => {
                    self.alias::<SecuritySchemeId>(key, target, &path)
                }
                ComponentKind::Links => self.alias::<LinkId>(key, target, &path),
                ComponentKind::Callbacks => self.alias::<CallbackId>(key, target, &path),
            };
        }

        let obj = Obj::new(raw, path)?;
        let components = NodeRef::Components;
        let node = match kind {
            ComponentKind::Schemas => {
                let id: SchemaId = self.register(key, Schema::blank(components))?;
                self.fill_schema(id, obj)?;
                id.into()
            }
            ComponentKind::Responses => {
                let response = Response::new(components, obj.required_str(DESCRIPTION_FIELD)?);
                let id: ResponseId = self.register(key, response)?;
                self.fill_response(id, obj)?;
                id.into()
            }
            ComponentKind::Parameters => {
                let parameter = self.new_parameter(components, &obj)?;
                let id: ParameterId = self.register(key, parameter)?;
                self.fill_parameter(id, obj)?;
                id.into()
            }
            ComponentKind::Examples => {
                let id: ExampleId = self.register(key, Example::new(components))?;
                self.fill_example(id, obj)?;
                id.into()
            }
            ComponentKind::RequestBodies => {
                let id: RequestBodyId = self.register(key, RequestBody::new(components))?;
                self.fill_request_body(id, obj)?;
                id.into()
            }
            ComponentKind::Headers => {
                let id: HeaderId = self.register(key, Header::new(components))?;
                self.fill_header(id, obj)?;
                id.into()
            }
            ComponentKind::SecuritySchemes => {
                let scheme = self.read_security_scheme(&obj)?;
                let id: SecuritySchemeId = self.register(key, scheme)?;
                id.into()
            }
            ComponentKind::Links => {
                let id: LinkId = self.register(key, Link::new(components))?;
                self.fill_link(id, obj)?;
                id.into()
            }
            ComponentKind::Callbacks => {
                let id: CallbackId = self.register(key, Callback::new(components))?;
                self.fill_callback(id, obj)?;
                id.into()
            }
        };
        Ok(node)
    }

    fn read_info(&self, obj: &Obj<'v>) -> Result<Info> {
        let mut info = Info::new(
            obj.required_str("title")?,
            obj.required_str("version")?,
        );
        info.description = obj.string(DESCRIPTION_FIELD)?;
        info.terms_of_service = obj.string("termsOfService")?;
        if let Some(contact) = obj.object("contact")? {
            info.contact = Contact {
                name: contact.string(NAME_FIELD)?,
                url: contact.string(URL_FIELD)?,
                email: contact.string("email")?,
                extensions: self.extensions(&contact, &[NAME_FIELD, URL_FIELD, "email"])?,
            };
        }
        if let Some(license) = obj.object("license")? {
            info.license = License {
                name: license.required_str(NAME_FIELD)?.to_string(),
                url: license.string(URL_FIELD)?,
                extensions: self.extensions(&license, &[NAME_FIELD, URL_FIELD])?,
            };
        }
        info.extensions = self.extensions(
            obj,
            &["title", "version", DESCRIPTION_FIELD, "termsOfService", "contact", "license"],
        )?;
        Ok(info)
    }

    fn read_external_docs(&self, obj: &Obj<'v>) -> Result<Option<ExternalDocumentation>> {
        let Some(docs) = obj.object(EXTERNAL_DOCS_FIELD)? else {
            return Ok(None);
        };
        let mut external = ExternalDocumentation::new(docs.required_str(URL_FIELD)?);
        external.description = docs.string(DESCRIPTION_FIELD)?;
        external.extensions = self.extensions(&docs, &[URL_FIELD, DESCRIPTION_FIELD])?;
        Ok(Some(external))
    }

    fn read_tags(&mut self, root: &Obj<'v>) -> Result<()> {
        let Some(tags) = root.array(TAGS_FIELD)? else {
            return Ok(());
        };
        for (index, raw) in tags.iter().enumerate() {
            let obj = Obj::new(raw, root.at(TAGS_FIELD).child(index.to_string()))?;
            let extensions = self.extensions(&obj, &[NAME_FIELD, DESCRIPTION_FIELD, EXTERNAL_DOCS_FIELD])?;
            let external_docs = self.read_external_docs(&obj)?;
            let tag = self
                .doc
                .tags
                .add(obj.required_str(NAME_FIELD)?)
                .map_err(|e| e.at(&obj.path))?;
            tag.description = obj.string(DESCRIPTION_FIELD)?;
            tag.external_docs = external_docs;
            tag.extensions = extensions;
        }
        Ok(())
    }

    fn read_servers(&self, obj: &Obj<'v>) -> Result<Vec<Server>> {
        let Some(servers) = obj.array(SERVERS_FIELD)? else {
            return Ok(Vec::new());
        };
        let base = obj.at(SERVERS_FIELD);
        servers
            .iter()
            .enumerate()
            .map(|(index, raw)| self.read_server(raw, base.child(index.to_string())))
            .collect()
    }

    fn read_server(&self, raw: &'v Value, path: JsonPath) -> Result<Server> {
        let obj = Obj::new(raw, path)?;
        let mut server = Server::new(obj.required_str(URL_FIELD)?);
        server.description = obj.string(DESCRIPTION_FIELD)?;
        server.extensions = self.extensions(&obj, &[URL_FIELD, DESCRIPTION_FIELD, "variables"])?;
        if let Some(variables) = obj.object("variables")? {
            for (name, raw) in variables.map {
                let var = Obj::new(raw, variables.at(name))?;
                let extensions = self.extensions(&var, &["enum", "default", DESCRIPTION_FIELD])?;
                let at = |e: OpenApiError| e.at(&var.path);
                let variable = server.variable_mut(name).ok_or_else(|| {
                    at(OpenApiError::invariant(format!(
                        "server variable '{}' has no placeholder in the url",
                        name
                    )))
                })?;
                // default first, so the enumeration is checked against it
                variable.set_default(var.required_str("default")?).map_err(at)?;
                variable.set_allowed_values(var.strings("enum")?).map_err(at)?;
                variable.description = var.string(DESCRIPTION_FIELD)?;
                variable.extensions = extensions;
            }
        }
        Ok(server)
    }

    fn read_security(&self, obj: &Obj<'v>) -> Result<Option<Vec<SecurityRequirement>>> {
        let Some(list) = obj.array(SECURITY_FIELD)? else {
            return Ok(None);
        };
        let base = obj.at(SECURITY_FIELD);
        let mut requirements = Vec::with_capacity(list.len());
        for (index, raw) in list.iter().enumerate() {
            let entry = Obj::new(raw, base.child(index.to_string()))?;
            let mut requirement = SecurityRequirement::new();
            for scheme in entry.map.keys() {
                let scopes = entry.strings(scheme)?;
                requirement
                    .add_scheme(scheme.clone(), scopes)
                    .map_err(|e| e.at(&entry.path))?;
            }
            requirements.push(requirement);
        }
        Ok(Some(requirements))
    }

    fn read_schema(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<SchemaId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let id = self.doc.nodes.alloc(Schema::blank(parent));
        self.fill_schema(id, obj)?;
        Ok(id)
    }

    fn read_schema_list(&mut self, parent: NodeRef, obj: &Obj<'v>, field: &str) -> Result<Vec<SchemaId>> {
        let Some(items) = obj.array(field)? else {
            return Ok(Vec::new());
        };
        let base = obj.at(field);
        let mut ids = Vec::with_capacity(items.len());
        for (index, raw) in items.iter().enumerate() {
            ids.push(self.read_schema(parent, raw, base.child(index.to_string()))?);
        }
        Ok(ids)
    }

    fn read_optional_schema(&mut self, parent: NodeRef, obj: &Obj<'v>, field: &str) -> Result<Option<SchemaId>> {
        match obj.get(field) {
            None => Ok(None),
            Some(raw) => self.read_schema(parent, raw, obj.at(field)).map(Some),
        }
    }

    fn fill_schema(&mut self, id: SchemaId, obj: Obj<'v>) -> Result<()> {
        let extensions = self.extensions(&obj, SCHEMA_FIELDS)?;
        let owner = NodeRef::Schema(id);

        let properties = self.read_map(&obj, "properties", |state, raw, path| {
            state.read_schema(owner, raw, path)
        })?;
        let items = self.read_optional_schema(owner, &obj, "items")?;
        let additional_properties = match obj.get("additionalProperties") {
            None => AdditionalProperties::default(),
            Some(Value::Bool(allowed)) => AdditionalProperties::Allowed(*allowed),
            Some(raw) => AdditionalProperties::Schema(self.read_schema(
                owner,
                raw,
                obj.at("additionalProperties"),
            )?),
        };
        let all_of = self.read_schema_list(owner, &obj, "allOf")?;
        let one_of = self.read_schema_list(owner, &obj, "oneOf")?;
        let any_of = self.read_schema_list(owner, &obj, "anyOf")?;
        let not = self.read_optional_schema(owner, &obj, "not")?;
        let xml = match obj.object("xml")? {
            Some(xml) => Some(Xml {
                name: xml.string(NAME_FIELD)?,
                namespace: xml.string("namespace")?,
                prefix: xml.string("prefix")?,
                attribute: xml.flag("attribute")?,
                wrapped: xml.flag("wrapped")?,
                extensions: self.extensions(
                    &xml,
                    &[NAME_FIELD, "namespace", "prefix", "attribute", "wrapped"],
                )?,
            }),
            None => None,
        };
        let external_docs = self.read_external_docs(&obj)?;
        let discriminator = obj.object("discriminator")?;
        let discriminator_extensions = match &discriminator {
            Some(discriminator) => self.extensions(discriminator, &["propertyName", "mapping"])?,
            None => Extensions::new(),
        };

        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.title = obj.string("title")?;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.schema_type = obj.token::<SchemaType>("type")?;
        node.format = obj.string("format")?;
        node.nullable = obj.flag("nullable")?;
        node.read_only = obj.flag("readOnly")?;
        node.write_only = obj.flag("writeOnly")?;
        node.deprecated = obj.flag(DEPRECATED_FIELD)?;
        node.multiple_of = obj.number("multipleOf")?;
        node.maximum = obj.number("maximum")?;
        node.exclusive_maximum = obj.flag("exclusiveMaximum")?;
        node.minimum = obj.number("minimum")?;
        node.exclusive_minimum = obj.flag("exclusiveMinimum")?;
        node.max_length = obj.u64("maxLength")?;
        node.min_length = obj.u64("minLength")?;
        node.pattern = obj.string("pattern")?;
        node.max_items = obj.u64("maxItems")?;
        node.min_items = obj.u64("minItems")?;
        node.unique_items = obj.flag("uniqueItems")?;
        node.max_properties = obj.u64("maxProperties")?;
        node.min_properties = obj.u64("minProperties")?;
        for name in obj.strings(REQUIRED_FIELD)? {
            node.set_required(name, true);
        }
        let allowed = obj.array("enum")?.cloned().unwrap_or_default();
        node.set_allowed_values(allowed)
            .map_err(|e| e.at(&obj.at("enum")))?;
        node.set_default(obj.get("default").cloned())
            .map_err(|e| e.at(&obj.at("default")))?;
        node.example = obj.get(EXAMPLE_FIELD).cloned();
        node.properties = properties;
        node.items = items;
        node.additional_properties = additional_properties;
        node.all_of = all_of;
        node.one_of = one_of;
        node.any_of = any_of;
        node.not = not;
        node.xml = xml;
        node.external_docs = external_docs;

        if let Some(discriminator) = discriminator {
            let at = |e: OpenApiError| e.at(&discriminator.path);
            let target = node
                .set_discriminator(discriminator.required_str("propertyName")?)
                .map_err(at)?;
            target.extensions = discriminator_extensions;
            if let Some(mapping) = discriminator.object("mapping")? {
                for (value, raw) in mapping.map {
                    let schema = raw.as_str().ok_or_else(|| {
                        OpenApiError::type_mismatch(&mapping.at(value), "string", json_type(raw))
                    })?;
                    target.add_mapping(value.clone(), schema).map_err(at)?;
                }
            }
        }
        Ok(())
    }

    fn new_parameter(&self, parent: NodeRef, obj: &Obj<'v>) -> Result<Parameter> {
        let name = obj.required_str(NAME_FIELD)?;
        let location = obj
            .token::<ParameterLocation>(IN_FIELD)?
            .ok_or_else(|| OpenApiError::missing_field(&obj.path, IN_FIELD))?;
        Ok(Parameter::new(parent, name, location))
    }

    fn read_parameter(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<ParameterId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let parameter = self.new_parameter(parent, &obj)?;
        let id = self.doc.nodes.alloc(parameter);
        self.fill_parameter(id, obj)?;
        Ok(id)
    }

    /// Reads a parameter list, rejecting two parameters with the same name and location.
    fn read_parameters(&mut self, owner: NodeRef, obj: &Obj<'v>) -> Result<Vec<ParameterId>> {
        let Some(items) = obj.array(PARAMETERS_FIELD)? else {
            return Ok(Vec::new());
        };
        let base = obj.at(PARAMETERS_FIELD);
        let mut ids: Vec<ParameterId> = Vec::with_capacity(items.len());
        for (index, raw) in items.iter().enumerate() {
            let path = base.child(index.to_string());
            let id = self.read_parameter(owner, raw, path.clone())?;
            let param = &self.doc[id];
            let clash = ids.iter().any(|other| {
                let other = &self.doc[*other];
                other.name() == param.name() && other.location() == param.location()
            });
            if clash {
                return Err(OpenApiError::duplicate_key(
                    "parameter list",
                    &format!("{} {}", param.location(), param.name()),
                )
                .at(&path));
            }
            ids.push(id);
        }
        Ok(ids)
    }

    fn fill_parameter(&mut self, id: ParameterId, obj: Obj<'v>) -> Result<()> {
        let query = self.doc[id].location() == ParameterLocation::Query;
        let known: Vec<&str> = if query {
            PARAMETER_FIELDS.iter().chain(QUERY_FIELDS).copied().collect()
        } else {
            PARAMETER_FIELDS.to_vec()
        };
        let extensions = self.extensions(&obj, &known)?;
        let owner = NodeRef::Parameter(id);
        let value = self.read_parameter_value(owner, &obj)?;
        let examples = self.read_example_set(owner, &obj)?;

        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.deprecated = obj.flag(DEPRECATED_FIELD)?;
        if let Some(required) = obj.bool(REQUIRED_FIELD)? {
            node.set_required(required)
                .map_err(|e| e.at(&obj.at(REQUIRED_FIELD)))?;
        }
        if let Some(style) = obj.token::<ParameterStyle>(STYLE_FIELD)? {
            node.set_style(style).map_err(|e| e.at(&obj.at(STYLE_FIELD)))?;
        }
        node.set_explode(obj.bool(EXPLODE_FIELD)?);
        if let Some(options) = node.query_options_mut() {
            options.allow_empty_value = obj.flag("allowEmptyValue")?;
            options.allow_reserved = obj.flag("allowReserved")?;
        }
        node.value = value;
        node.examples = examples;
        Ok(())
    }

    fn read_header(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<HeaderId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let id = self.doc.nodes.alloc(Header::new(parent));
        self.fill_header(id, obj)?;
        Ok(id)
    }

    fn fill_header(&mut self, id: HeaderId, obj: Obj<'v>) -> Result<()> {
        let extensions = self.extensions(&obj, HEADER_FIELDS)?;
        let owner = NodeRef::Header(id);
        let value = self.read_parameter_value(owner, &obj)?;
        let examples = self.read_example_set(owner, &obj)?;

        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.required = obj.flag(REQUIRED_FIELD)?;
        node.deprecated = obj.flag(DEPRECATED_FIELD)?;
        if let Some(style) = obj.token::<ParameterStyle>(STYLE_FIELD)? {
            node.set_style(style).map_err(|e| e.at(&obj.at(STYLE_FIELD)))?;
        }
        node.set_explode(obj.bool(EXPLODE_FIELD)?);
        node.value = value;
        node.examples = examples;
        Ok(())
    }

    /// Reads the `schema` xor `content` pair of a parameter or header.
    fn read_parameter_value(&mut self, owner: NodeRef, obj: &Obj<'v>) -> Result<Option<ParameterValue>> {
        match (obj.get(SCHEMA_FIELD), obj.get(CONTENT_FIELD)) {
            (Some(_), Some(_)) => Err(OpenApiError::invariant(
                "'schema' and 'content' are mutually exclusive",
            )
            .at(&obj.path)),
            (Some(raw), None) => {
                let schema = self.read_schema(owner, raw, obj.at(SCHEMA_FIELD))?;
                Ok(Some(ParameterValue::Schema(schema)))
            }
            (None, Some(_)) => {
                let content = self.read_content(owner, obj)?;
                if content.len() != 1 {
                    return Err(OpenApiError::invariant(
                        "a parameter or header 'content' map holds exactly one entry",
                    )
                    .at(&obj.at(CONTENT_FIELD)));
                }
                Ok(Some(ParameterValue::Content(content)))
            }
            (None, None) => Ok(None),
        }
    }

    /// Reads the `example` xor `examples` pair.
    fn read_example_set(&mut self, owner: NodeRef, obj: &Obj<'v>) -> Result<Option<ExampleSet>> {
        match (obj.get(EXAMPLE_FIELD), obj.get(EXAMPLES_FIELD)) {
            (Some(_), Some(_)) => Err(OpenApiError::invariant(
                "'example' and 'examples' are mutually exclusive",
            )
            .at(&obj.path)),
            (Some(value), None) => Ok(Some(ExampleSet::Example(value.clone()))),
            (None, Some(_)) => {
                let examples = self.read_map(obj, EXAMPLES_FIELD, |state, raw, path| {
                    state.read_example(owner, raw, path)
                })?;
                Ok(Some(ExampleSet::Examples(examples)))
            }
            (None, None) => Ok(None),
        }
    }

    fn read_content(&mut self, owner: NodeRef, obj: &Obj<'v>) -> Result<IndexMap<String, MediaTypeId>> {
        self.read_map(obj, CONTENT_FIELD, |state, raw, path| {
            state.read_media_type(owner, raw, path)
        })
    }

    fn read_headers(&mut self, owner: NodeRef, obj: &Obj<'v>) -> Result<IndexMap<String, HeaderId>> {
        self.read_map(obj, HEADERS_FIELD, |state, raw, path| {
            state.read_header(owner, raw, path)
        })
    }

    fn read_media_type(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<MediaTypeId> {
        let obj = Obj::new(raw, path)?;
        let extensions = self.extensions(&obj, &[SCHEMA_FIELD, EXAMPLE_FIELD, EXAMPLES_FIELD, "encoding"])?;
        let id = self.doc.nodes.alloc(MediaType::new(parent));
        let owner = NodeRef::MediaType(id);
        let schema = self.read_optional_schema(owner, &obj, SCHEMA_FIELD)?;
        let examples = self.read_example_set(owner, &obj)?;
        let mut encodings = IndexMap::new();
        if let Some(section) = obj.object("encoding")? {
            for (property, raw) in section.map {
                let encoding = self.read_encoding(owner, raw, section.at(property))?;
                encodings.insert(property.clone(), encoding);
            }
        }
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.schema = schema;
        node.examples = examples;
        node.encoding = encodings;
        Ok(id)
    }

    fn read_encoding(&mut self, media_type: NodeRef, raw: &'v Value, path: JsonPath) -> Result<Encoding> {
        let obj = Obj::new(raw, path)?;
        let extensions = self.extensions(
            &obj,
            &["contentType", HEADERS_FIELD, STYLE_FIELD, EXPLODE_FIELD, "allowReserved"],
        )?;
        Ok(Encoding {
            content_type: obj.string("contentType")?,
            headers: self.read_headers(media_type, &obj)?,
            style: obj.token::<ParameterStyle>(STYLE_FIELD)?,
            explode: obj.bool(EXPLODE_FIELD)?,
            allow_reserved: obj.flag("allowReserved")?,
            extensions,
        })
    }

    fn read_example(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<ExampleId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let id = self.doc.nodes.alloc(Example::new(parent));
        self.fill_example(id, obj)?;
        Ok(id)
    }

    fn fill_example(&mut self, id: ExampleId, obj: Obj<'v>) -> Result<()> {
        let extensions = self.extensions(
            &obj,
            &[SUMMARY_FIELD, DESCRIPTION_FIELD, "value", "externalValue"],
        )?;
        let value = match (obj.get("value"), obj.str("externalValue")?) {
            (Some(_), Some(_)) => {
                return Err(OpenApiError::invariant(
                    "'value' and 'externalValue' are mutually exclusive",
                )
                .at(&obj.path));
            }
            (Some(value), None) => Some(ExampleValue::Value(value.clone())),
            (None, Some(url)) => Some(ExampleValue::External(url.to_string())),
            (None, None) => None,
        };
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.summary = obj.string(SUMMARY_FIELD)?;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.value = value;
        Ok(())
    }

    fn read_request_body(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<RequestBodyId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let id = self.doc.nodes.alloc(RequestBody::new(parent));
        self.fill_request_body(id, obj)?;
        Ok(id)
    }

    fn fill_request_body(&mut self, id: RequestBodyId, obj: Obj<'v>) -> Result<()> {
        let extensions = self.extensions(&obj, &[DESCRIPTION_FIELD, CONTENT_FIELD, REQUIRED_FIELD])?;
        obj.required_object(CONTENT_FIELD)?;
        let content = self.read_content(NodeRef::RequestBody(id), &obj)?;
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.required = obj.flag(REQUIRED_FIELD)?;
        node.content = content;
        Ok(())
    }

    fn read_response(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<ResponseId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let response = Response::new(parent, obj.required_str(DESCRIPTION_FIELD)?);
        let id = self.doc.nodes.alloc(response);
        self.fill_response(id, obj)?;
        Ok(id)
    }

    fn fill_response(&mut self, id: ResponseId, obj: Obj<'v>) -> Result<()> {
        let extensions = self.extensions(&obj, &[DESCRIPTION_FIELD, HEADERS_FIELD, CONTENT_FIELD, "links"])?;
        let owner = NodeRef::Response(id);
        let headers = self.read_headers(owner, &obj)?;
        let content = self.read_content(owner, &obj)?;
        let links = self.read_map(&obj, "links", |state, raw, path| {
            state.read_link(owner, raw, path)
        })?;
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.headers = headers;
        node.content = content;
        node.links = links;
        Ok(())
    }

    fn read_responses(&mut self, operation: OperationId, obj: &Obj<'v>) -> Result<Responses> {
        let section = obj.required_object(RESPONSES_FIELD)?;
        let owner = NodeRef::Operation(operation);
        let mut responses = Responses::default();
        for (key, raw) in section.map {
            if key.starts_with(EXTENSION_PREFIX) {
                responses.extensions.set(key, raw.clone());
                continue;
            }
            let path = section.at(key);
            if key != DEFAULT_RESPONSE {
                validate_status_code(key).map_err(|e| e.at(&section.path))?;
            }
            let id = self.read_response(owner, raw, path)?;
            if key == DEFAULT_RESPONSE {
                responses.default = Some(id);
            } else {
                responses.codes.insert(key.clone(), id);
            }
        }
        Ok(responses)
    }

    fn read_link(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<LinkId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let id = self.doc.nodes.alloc(Link::new(parent));
        self.fill_link(id, obj)?;
        Ok(id)
    }

    fn fill_link(&mut self, id: LinkId, obj: Obj<'v>) -> Result<()> {
        let extensions = self.extensions(
            &obj,
            &["operationRef", "operationId", PARAMETERS_FIELD, REQUEST_BODY_FIELD, DESCRIPTION_FIELD, "server"],
        )?;
        let target = match (obj.str("operationRef")?, obj.str("operationId")?) {
            (Some(_), Some(_)) => {
                return Err(OpenApiError::invariant(
                    "'operationRef' and 'operationId' are mutually exclusive",
                )
                .at(&obj.path));
            }
            (Some(reference), None) => Some(LinkTarget::OperationRef(reference.to_string())),
            (None, Some(operation)) => Some(LinkTarget::OperationId(operation.to_string())),
            (None, None) => None,
        };
        let parameters = match obj.object(PARAMETERS_FIELD)? {
            Some(parameters) => parameters
                .map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => IndexMap::new(),
        };
        let server = match obj.get("server") {
            Some(raw) => Some(self.read_server(raw, obj.at("server"))?),
            None => None,
        };
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.target = target;
        node.parameters = parameters;
        node.request_body = obj.get(REQUEST_BODY_FIELD).cloned();
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.server = server;
        Ok(())
    }

    fn read_callback(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<CallbackId> {
        if let Some(target) = reference(raw, &path)? {
            return self.resolve(target, &path);
        }
        let obj = Obj::new(raw, path)?;
        let id = self.doc.nodes.alloc(Callback::new(parent));
        self.fill_callback(id, obj)?;
        Ok(id)
    }

    /// Every non-extension key of a Callback Object is a runtime expression.
    fn fill_callback(&mut self, id: CallbackId, obj: Obj<'v>) -> Result<()> {
        let owner = NodeRef::Callback(id);
        let mut expressions = IndexMap::new();
        let mut extensions = Extensions::new();
        for (key, raw) in obj.map {
            if key.starts_with(EXTENSION_PREFIX) {
                extensions.set(key, raw.clone());
            } else {
                let item = self.read_path_item(owner, raw, obj.at(key))?;
                expressions.insert(key.clone(), item);
            }
        }
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.expressions = expressions;
        Ok(())
    }

    fn read_path_item(&mut self, parent: NodeRef, raw: &'v Value, path: JsonPath) -> Result<PathItemId> {
        let obj = Obj::new(raw, path)?;
        let mut known = vec![SUMMARY_FIELD, DESCRIPTION_FIELD, SERVERS_FIELD, PARAMETERS_FIELD];
        known.extend(HTTP_METHODS.iter().filter_map(method_key));
        let extensions = self.extensions(&obj, &known)?;
        let servers = self.read_servers(&obj)?;

        let id = self.doc.nodes.alloc(PathItem::new(parent));
        let parameters = self.read_parameters(NodeRef::PathItem(id), &obj)?;
        let mut operations = IndexMap::new();
        for (key, raw) in obj.map {
            if let Some(method) = method_from_key(key) {
                let operation = self.read_operation(id, raw, obj.at(key))?;
                operations.insert(method, operation);
            }
        }
        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.summary = obj.string(SUMMARY_FIELD)?;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.servers = servers;
        node.parameters = parameters;
        node.operations = operations;
        Ok(id)
    }

    fn read_operation(&mut self, parent: PathItemId, raw: &'v Value, path: JsonPath) -> Result<OperationId> {
        let obj = Obj::new(raw, path)?;
        let extensions = self.extensions(&obj, OPERATION_FIELDS)?;
        let id = self.doc.nodes.alloc(Operation::new(parent.into()));
        let owner = NodeRef::Operation(id);

        let parameters = self.read_parameters(owner, &obj)?;
        let request_body = match obj.get(REQUEST_BODY_FIELD) {
            Some(raw) => Some(self.read_request_body(owner, raw, obj.at(REQUEST_BODY_FIELD))?),
            None => None,
        };
        let responses = self.read_responses(id, &obj)?;
        let callbacks = self.read_map(&obj, "callbacks", |state, raw, path| {
            state.read_callback(owner, raw, path)
        })?;
        let security = self.read_security(&obj)?;
        let servers = self.read_servers(&obj)?;
        let external_docs = self.read_external_docs(&obj)?;

        let node = &mut self.doc[id];
        node.extensions = extensions;
        node.tags = obj.strings(TAGS_FIELD)?;
        node.summary = obj.string(SUMMARY_FIELD)?;
        node.description = obj.string(DESCRIPTION_FIELD)?;
        node.external_docs = external_docs;
        node.operation_id = obj.string("operationId")?;
        node.parameters = parameters;
        node.request_body = request_body;
        node.responses = responses;
        node.callbacks = callbacks;
        node.deprecated = obj.flag(DEPRECATED_FIELD)?;
        node.set_security(security);
        node.servers = servers;
        Ok(id)
    }

    fn read_security_scheme(&self, obj: &Obj<'v>) -> Result<SecurityScheme> {
        let scheme_type = obj.required_str("type")?;
        let (kind, fields): (SecuritySchemeKind, &[&str]) = match scheme_type {
            "apiKey" => (
                SecuritySchemeKind::ApiKey {
                    name: obj.required_str(NAME_FIELD)?.to_string(),
                    location: obj
                        .token::<ApiKeyLocation>(IN_FIELD)?
                        .ok_or_else(|| OpenApiError::missing_field(&obj.path, IN_FIELD))?,
                },
                &[NAME_FIELD, IN_FIELD],
            ),
            "http" => (
                SecuritySchemeKind::Http {
                    scheme: obj.required_str("scheme")?.to_string(),
                    bearer_format: obj.string("bearerFormat")?,
                },
                &["scheme", "bearerFormat"],
            ),
            "oauth2" => (
                SecuritySchemeKind::OAuth2 {
                    flows: self.read_flows(&obj.required_object("flows")?)?,
                },
                &["flows"],
            ),
            "openIdConnect" => (
                SecuritySchemeKind::OpenIdConnect {
                    url: obj.required_str("openIdConnectUrl")?.to_string(),
                },
                &["openIdConnectUrl"],
            ),
            other => {
                return Err(OpenApiError::structural(
                    &obj.at("type"),
                    &format!("unknown security scheme type '{}'", other),
                ));
            }
        };
        let mut known = vec!["type", DESCRIPTION_FIELD];
        known.extend_from_slice(fields);
        let extensions = self.extensions(obj, &known)?;
        let mut scheme =
            SecurityScheme::new(NodeRef::Components, kind).map_err(|e| e.at(&obj.path))?;
        scheme.description = obj.string(DESCRIPTION_FIELD)?;
        scheme.extensions = extensions;
        Ok(scheme)
    }

    fn read_flows(&self, obj: &Obj<'v>) -> Result<OAuthFlows> {
        let names: Vec<&str> = OAuthFlowKind::ALL.iter().map(OAuthFlowKind::as_str).collect();
        let mut flows = OAuthFlows::default();
        flows.extensions = self.extensions(obj, &names)?;
        for kind in OAuthFlowKind::ALL {
            if let Some(flow) = obj.object(kind.as_str())? {
                flows.set_flow(self.read_flow(kind, &flow)?);
            }
        }
        Ok(flows)
    }

    fn read_flow(&self, kind: OAuthFlowKind, obj: &Obj<'v>) -> Result<OAuthFlow> {
        let mut known = vec!["refreshUrl", "scopes"];
        if kind.uses_authorization_url() {
            known.push("authorizationUrl");
        }
        if kind.uses_token_url() {
            known.push("tokenUrl");
        }
        let extensions = self.extensions(obj, &known)?;
        let at = |e: OpenApiError| e.at(&obj.path);
        let mut flow = match kind {
            OAuthFlowKind::Implicit => OAuthFlow::implicit(obj.required_str("authorizationUrl")?),
            OAuthFlowKind::Password => OAuthFlow::password(obj.required_str("tokenUrl")?),
            OAuthFlowKind::ClientCredentials => {
                OAuthFlow::client_credentials(obj.required_str("tokenUrl")?)
            }
            OAuthFlowKind::AuthorizationCode => OAuthFlow::authorization_code(
                obj.required_str("authorizationUrl")?,
                obj.required_str("tokenUrl")?,
            ),
        }
        .map_err(at)?;
        flow.set_refresh_url(obj.string("refreshUrl")?).map_err(at)?;
        let scopes = obj.required_object("scopes")?;
        for (name, raw) in scopes.map {
            let description = raw.as_str().ok_or_else(|| {
                OpenApiError::type_mismatch(&scopes.at(name), "string", json_type(raw))
            })?;
            flow.add_scope(name.clone(), description).map_err(at)?;
        }
        flow.extensions = extensions;
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SchemaOwner, Tag};
    use http::Method;
    use serde_json::json;

    fn document(paths: Value, components: Value) -> Value {
        json!({
            "openapi": "3.0.3",
            "info": { "title": "Pets", "version": "1.0.0" },
            "paths": paths,
            "components": components
        })
    }

    fn parameter(raw: Value) -> Result<(Document, ParameterId)> {
        let doc = OpenApiReader::default().read(&document(
            json!({ "/pets/{id}": { "parameters": [raw] } }),
            json!({}),
        ))?;
        let item = doc.path_item("/pets/{id}").unwrap();
        let id = doc[item].parameters()[0];
        Ok((doc, id))
    }

    #[test]
    fn test_minimal_document() {
        let raw = json!({
            "openapi": "3.0.3",
            "info": { "title": "Pets", "version": "1.0.0" },
            "paths": {}
        });
        let doc = crate::parse(&raw).unwrap();
        assert_eq!(doc.openapi(), "3.0.3");
        assert_eq!(doc.info.title, "Pets");
        assert!(doc.info.license.is_unlicensed());
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_missing_required_fields_are_structural() {
        let cases = [
            json!({ "openapi": "3.0.3", "info": { "version": "1" }, "paths": {} }),
            json!({ "openapi": "3.0.3", "info": { "title": "T" }, "paths": {} }),
            json!({ "openapi": "3.0.3", "info": { "title": "T", "version": "1" } }),
            json!({ "openapi": "3.0.3", "info": { "title": 5, "version": "1" }, "paths": {} }),
            json!({ "openapi": "3.0.3", "info": { "title": "T", "version": "1" }, "paths": [] }),
        ];
        for raw in cases {
            let err = crate::parse(&raw).unwrap_err();
            assert!(matches!(err, OpenApiError::Structural { .. }), "{}", err);
        }
    }

    #[test]
    fn test_version_gate() {
        let mut raw = document(json!({}), json!({}));
        raw["openapi"] = json!("3.1.0");
        let err = crate::parse(&raw).unwrap_err();
        assert_eq!(err, OpenApiError::UnsupportedVersion("3.1.0".into()));

        let lenient = OpenApiReader::new(ReaderOptions::new().check_version(false));
        assert_eq!(lenient.read(&raw).unwrap().openapi(), "3.1.0");
    }

    #[test]
    fn test_unknown_fields() {
        let mut raw = document(json!({}), json!({}));
        raw["info"]["colour"] = json!("blue");
        let err = crate::parse(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown field 'colour'"), "{}", err);

        let lenient = OpenApiReader::new(ReaderOptions::new().reject_unknown_fields(false));
        assert!(lenient.read(&raw).is_ok());
    }

    #[test]
    fn test_extensions_are_stripped_and_ordered() {
        let mut raw = document(json!({}), json!({}));
        raw["x-zeta"] = json!(1);
        raw["x-alpha"] = json!({ "nested": true });
        let doc = crate::parse(&raw).unwrap();
        let names: Vec<_> = doc.extensions.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(doc.extensions.get("alpha"), Some(&json!({ "nested": true })));
    }

    #[test]
    fn test_query_parameter_reads_back_form_exploded() {
        let (doc, id) = parameter(json!({ "name": "q", "in": "query" })).unwrap();
        assert_eq!(doc[id].style(), ParameterStyle::Form);
        assert!(doc[id].explode());
    }

    #[test]
    fn test_path_parameter_is_always_required() {
        let (doc, id) = parameter(json!({ "name": "id", "in": "path" })).unwrap();
        assert!(doc[id].required());
        assert_eq!(doc[id].style(), ParameterStyle::Simple);
        assert!(!doc[id].explode());

        let err = parameter(json!({ "name": "id", "in": "path", "required": false })).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
    }

    #[test]
    fn test_header_parameter_style_must_be_simple() {
        let err = parameter(json!({ "name": "X-A", "in": "header", "style": "form" })).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        assert!(parameter(json!({ "name": "X-A", "in": "header", "style": "simple" })).is_ok());

        let err = parameter(json!({ "name": "X-A", "in": "body" })).unwrap_err();
        assert!(matches!(err, OpenApiError::Structural { .. }));
    }

    #[test]
    fn test_query_only_fields_are_rejected_elsewhere() {
        assert!(parameter(json!({ "name": "q", "in": "query", "allowReserved": true })).is_ok());
        let err = parameter(json!({ "name": "id", "in": "path", "allowReserved": true })).unwrap_err();
        assert!(matches!(err, OpenApiError::Structural { .. }));
    }

    #[test]
    fn test_schema_and_content_are_exclusive() {
        let err = parameter(json!({
            "name": "q",
            "in": "query",
            "schema": { "type": "string" },
            "content": { "application/json": {} }
        }))
        .unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
    }

    #[test]
    fn test_duplicate_parameters_rejected() {
        let raw = document(
            json!({ "/pets": { "parameters": [
                { "name": "q", "in": "query" },
                { "name": "q", "in": "query" }
            ] } }),
            json!({}),
        );
        let err = crate::parse(&raw).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
    }

    #[test]
    fn test_boolean_enum_and_default() {
        let bad = document(
            json!({}),
            json!({ "schemas": { "Flag": { "type": "boolean", "enum": [false], "default": true } } }),
        );
        let err = crate::parse(&bad).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));

        let good = document(
            json!({}),
            json!({ "schemas": { "Flag": { "type": "boolean", "enum": [false], "default": false } } }),
        );
        let doc = crate::parse(&good).unwrap();
        let flag = doc.components().schema("Flag").unwrap();
        assert_eq!(doc[flag].allowed_values(), &[json!(false)]);
        assert_eq!(doc[flag].default_value(), Some(&json!(false)));
    }

    #[test]
    fn test_discriminator_must_name_own_property() {
        let raw = document(
            json!({}),
            json!({ "schemas": { "Pet": {
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "discriminator": { "propertyName": "kind" }
            } } }),
        );
        let err = crate::parse(&raw).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
    }

    #[test]
    fn test_discriminator_mapping_order() {
        let raw = document(
            json!({}),
            json!({ "schemas": { "Pet": {
                "type": "object",
                "properties": { "kind": { "type": "string" } },
                "discriminator": {
                    "propertyName": "kind",
                    "mapping": { "dog": "#/components/schemas/Dog", "cat": "Cat" }
                }
            } } }),
        );
        let doc = crate::parse(&raw).unwrap();
        let pet = doc.components().schema("Pet").unwrap();
        let mapping: Vec<_> = doc[pet].discriminator().unwrap().mapping().collect();
        assert_eq!(mapping, vec![("dog", "#/components/schemas/Dog"), ("cat", "Cat")]);
    }

    #[test]
    fn test_forward_and_mutual_references_share_nodes() {
        let raw = document(
            json!({ "/owners": { "get": { "responses": { "200": {
                "description": "OK",
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Owner" } } }
            } } } } }),
            json!({ "schemas": {
                "Owner": { "type": "object", "properties": { "pet": { "$ref": "#/components/schemas/Pet" } } },
                "Pet": { "type": "object", "properties": { "owner": { "$ref": "#/components/schemas/Owner" } } }
            } }),
        );
        let doc = crate::parse(&raw).unwrap();
        let owner = doc.components().schema("Owner").unwrap();
        let pet = doc.components().schema("Pet").unwrap();
        assert_eq!(doc[owner].property("pet"), Some(pet));
        assert_eq!(doc[pet].property("owner"), Some(owner));

        let item = doc.path_item("/owners").unwrap();
        let op = doc[item].operation(&Method::GET).unwrap();
        let response = doc[op].responses().code("200").unwrap();
        let media = doc[response].content()["application/json"];
        assert_eq!(doc.schema_of(SchemaOwner::MediaType(media)), Some(owner));
        assert_eq!(doc.node_count(), 2 + 4);
    }

    #[test]
    fn test_lazy_resolution_keeps_source_order() {
        let raw = document(
            json!({}),
            json!({ "schemas": {
                "A": { "items": { "$ref": "#/components/schemas/C" } },
                "B": { "type": "string" },
                "C": { "type": "integer" }
            } }),
        );
        let doc = crate::parse(&raw).unwrap();
        let keys: Vec<_> = doc.components().schemas().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unresolved_references() {
        for target in [
            "#/components/schemas/Missing",
            "#/components/responses/Pet",
            "#/definitions/Pet",
            "pets.yaml#/Pet",
        ] {
            let raw = document(
                json!({}),
                json!({ "schemas": {
                    "Pet": { "type": "object" },
                    "List": { "items": { "$ref": target } }
                } }),
            );
            let err = crate::parse(&raw).unwrap_err();
            assert!(matches!(err, OpenApiError::UnresolvedReference { .. }), "{}", target);
        }
    }

    #[test]
    fn test_ref_siblings_rejected() {
        let raw = document(
            json!({}),
            json!({ "schemas": {
                "Pet": { "type": "object" },
                "List": { "items": { "$ref": "#/components/schemas/Pet", "description": "x" } }
            } }),
        );
        let err = crate::parse(&raw).unwrap_err();
        assert!(matches!(err, OpenApiError::Structural { .. }));
    }

    #[test]
    fn test_component_aliases() {
        let raw = document(
            json!({}),
            json!({ "schemas": {
                "Animal": { "$ref": "#/components/schemas/Pet" },
                "Pet": { "type": "object" }
            } }),
        );
        let doc = crate::parse(&raw).unwrap();
        let pet = doc.components().schema("Pet").unwrap();
        assert_eq!(doc.components().schema("Animal"), Some(pet));
        assert!(doc.components().is_alias(ComponentKind::Schemas, "Animal"));
        assert_eq!(doc.node_count(), 1);

        let circular = document(
            json!({}),
            json!({ "schemas": {
                "A": { "$ref": "#/components/schemas/B" },
                "B": { "$ref": "#/components/schemas/A" }
            } }),
        );
        let err = crate::parse(&circular).unwrap_err();
        assert!(matches!(err, OpenApiError::Structural { .. }));

        let self_loop = document(
            json!({}),
            json!({ "schemas": { "A": { "$ref": "#/components/schemas/A" } } }),
        );
        assert!(crate::parse(&self_loop).is_err());
    }

    #[test]
    fn test_alias_referenced_from_its_own_target() {
        let raw = document(
            json!({}),
            json!({ "schemas": {
                "A": { "$ref": "#/components/schemas/B" },
                "B": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } }
            } }),
        );
        let doc = crate::parse(&raw).unwrap();
        let b = doc.components().schema("B").unwrap();
        assert_eq!(doc.components().schema("A"), Some(b));
        assert!(doc.components().is_alias(ComponentKind::Schemas, "A"));
        assert_eq!(doc[b].property("a"), Some(b));
        assert_eq!(doc.node_count(), 1);

        let keys: Vec<_> = doc.components().schemas().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
        let out = crate::write(&doc);
        assert_eq!(out["components"]["schemas"]["A"], json!({ "$ref": "#/components/schemas/B" }));
        assert_eq!(
            out["components"]["schemas"]["B"]["properties"]["a"],
            json!({ "$ref": "#/components/schemas/B" })
        );
    }

    #[test]
    fn test_alias_chain_reads_target_once() {
        let raw = document(
            json!({}),
            json!({ "schemas": {
                "A": { "$ref": "#/components/schemas/B" },
                "B": { "$ref": "#/components/schemas/C" },
                "C": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } }
            } }),
        );
        let doc = crate::parse(&raw).unwrap();
        let c = doc.components().schema("C").unwrap();
        assert_eq!(doc.components().schema("A"), Some(c));
        assert_eq!(doc.components().schema("B"), Some(c));
        assert_eq!(doc.components().key_of(c), Some("C"));
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_path_item_rejects_unknown_keys_by_name() {
        for key in ["connect", "GET", "$ref"] {
            let mut item = Map::new();
            item.insert(key.to_string(), json!({}));
            let raw = document(json!({ "/pets": item }), json!({}));
            let err = crate::parse(&raw).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }
    }

    #[test]
    fn test_paths_must_start_with_slash() {
        let raw = document(json!({ "pets": {} }), json!({}));
        assert!(matches!(
            crate::parse(&raw).unwrap_err(),
            OpenApiError::InvariantViolation(_)
        ));
    }

    #[test]
    fn test_response_keys() {
        let ok = document(
            json!({ "/pets": { "get": { "responses": {
                "default": { "description": "Error" },
                "2XX": { "description": "Fine" },
                "x-note": "kept"
            } } } }),
            json!({}),
        );
        let doc = crate::parse(&ok).unwrap();
        let item = doc.path_item("/pets").unwrap();
        let op = doc[item].operation(&Method::GET).unwrap();
        let responses = doc[op].responses();
        assert!(responses.default_response().is_some());
        assert_eq!(responses.codes().count(), 1);
        assert_eq!(responses.extensions.get("note"), Some(&json!("kept")));

        let bad = document(
            json!({ "/pets": { "get": { "responses": { "600": { "description": "?" } } } } }),
            json!({}),
        );
        assert!(matches!(
            crate::parse(&bad).unwrap_err(),
            OpenApiError::InvariantViolation(_)
        ));
    }

    #[test]
    fn test_server_variables() {
        let mut raw = document(json!({}), json!({}));
        raw["servers"] = json!([{
            "url": "https://{host}.example.com/{path}",
            "variables": {
                "host": { "default": "api", "enum": ["api", "sandbox"] },
                "path": { "default": "v1" }
            }
        }]);
        let mut doc = crate::parse(&raw).unwrap();
        let server = &mut doc.servers[0];
        let names: Vec<_> = server.variable_names().collect();
        assert_eq!(names, vec!["host", "path"]);
        server.set_url("https://{host}.example.com");
        assert_eq!(server.variable("host").unwrap().default_value(), "api");
        assert!(server.variable("path").is_none());

        raw["servers"][0]["variables"]["port"] = json!({ "default": "443" });
        assert!(matches!(
            crate::parse(&raw).unwrap_err(),
            OpenApiError::InvariantViolation(_)
        ));
    }

    #[test]
    fn test_security_schemes_and_requirements() {
        let mut raw = document(
            json!({ "/pets": { "get": { "security": [], "responses": {} } } }),
            json!({ "securitySchemes": {
                "oauth": { "type": "oauth2", "flows": {
                    "authorizationCode": {
                        "authorizationUrl": "https://auth.example.com/authorize",
                        "tokenUrl": "https://auth.example.com/token",
                        "scopes": { "read": "Read pets" }
                    }
                } },
                "key": { "type": "apiKey", "name": "X-Key", "in": "header" }
            } }),
        );
        raw["security"] = json!([{ "oauth": ["read"] }, { "key": [] }]);
        let doc = crate::parse(&raw).unwrap();
        assert_eq!(doc.security().len(), 2);
        let item = doc.path_item("/pets").unwrap();
        let op = doc[item].operation(&Method::GET).unwrap();
        assert_eq!(doc[op].security(), Some(&[][..]));

        let oauth = doc.components().security_scheme("oauth").unwrap();
        let SecuritySchemeKind::OAuth2 { flows } = doc[oauth].kind() else {
            panic!("expected oauth2");
        };
        let flow = flows.flow(OAuthFlowKind::AuthorizationCode).unwrap();
        assert_eq!(flow.scopes().collect::<Vec<_>>(), vec![("read", "Read pets")]);

        raw["components"]["securitySchemes"]["oauth"]["flows"]["authorizationCode"]["tokenUrl"] =
            json!("not a url");
        assert!(matches!(
            crate::parse(&raw).unwrap_err(),
            OpenApiError::InvariantViolation(_)
        ));
    }

    #[test]
    fn test_tags_are_unique() {
        let mut raw = document(json!({}), json!({}));
        raw["tags"] = json!([{ "name": "pets", "description": "Pets" }, { "name": "stores" }]);
        let doc = crate::parse(&raw).unwrap();
        let names: Vec<_> = doc.tags.iter().map(Tag::name).collect();
        assert_eq!(names, vec!["pets", "stores"]);

        raw["tags"] = json!([{ "name": "pets" }, { "name": "pets" }]);
        assert!(crate::parse(&raw).is_err());
    }

    #[test]
    fn test_mutually_exclusive_example_fields() {
        let raw = document(
            json!({}),
            json!({ "examples": { "Cat": { "value": {}, "externalValue": "https://x.test/cat" } } }),
        );
        assert!(matches!(
            crate::parse(&raw).unwrap_err(),
            OpenApiError::InvariantViolation(_)
        ));
    }
}
