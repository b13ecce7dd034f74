//! Writes a [`Document`] graph back to a generic JSON value.
//!
//! A node is inlined where its owner holds it. Any other holder of the same node gets a
//! `{"$ref": ...}` to the node's canonical pointer, which for shared nodes is their key
//! in the components section.

use crate::model::components::ComponentKind;
use crate::model::{
    AdditionalProperties, CallbackId, Document, Encoding, ExampleId, ExampleSet, ExampleValue,
    Extensions, ExternalDocumentation, HeaderId, Info, LinkId, LinkTarget, MediaTypeId, NodeRef,
    OAuthFlows, OperationId, ParameterId, ParameterLocation, ParameterValue, PathItemId,
    RequestBodyId, ResponseId, Responses, SchemaId, SecurityRequirement, SecuritySchemeId,
    SecuritySchemeKind, Server, Tag, Xml,
};
use crate::model::content::DEFAULT_RESPONSE;
use crate::model::path::method_key;
use crate::{
    COMPONENTS_FIELD, CONTENT_FIELD, DEPRECATED_FIELD, DESCRIPTION_FIELD, EXAMPLE_FIELD,
    EXAMPLES_FIELD, EXPLODE_FIELD, EXTENSION_PREFIX, EXTERNAL_DOCS_FIELD, HEADERS_FIELD,
    IN_FIELD, INFO_FIELD, NAME_FIELD, OPENAPI_FIELD, PARAMETERS_FIELD, PATHS_FIELD, REF_FIELD,
    REQUEST_BODY_FIELD, REQUIRED_FIELD, RESPONSES_FIELD, SCHEMA_FIELD, SECURITY_FIELD,
    SERVERS_FIELD, STYLE_FIELD, SUMMARY_FIELD, TAGS_FIELD, URL_FIELD,
};
use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Options controlling how a document is written.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    omit_defaults: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            omit_defaults: true,
        }
    }
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `false`, fields holding their OpenAPI default (`false` flags, default
    /// parameter styles, `additionalProperties: true`, the placeholder license) are
    /// written out explicitly.
    pub fn omit_defaults(mut self, omit: bool) -> Self {
        self.omit_defaults = omit;
        self
    }
}

/// Writes documents with a fixed set of [`WriterOptions`].
#[derive(Debug, Clone, Default)]
pub struct OpenApiWriter {
    options: WriterOptions,
}

impl OpenApiWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Builds the JSON form of `document`.
    pub fn write(&self, document: &Document) -> Value {
        debug!("Writing OpenAPI document with {} nodes", document.node_count());
        let emitter = Emitter {
            doc: document,
            options: &self.options,
            pointers: pointer_map(document),
        };
        emitter.document()
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        crate::write(self).serialize(serializer)
    }
}

/// The canonical pointer of every registered node. Alias keys never become canonical.
fn pointer_map(doc: &Document) -> HashMap<NodeRef, String> {
    let components = doc.components();
    let mut pointers = HashMap::new();
    for (kind, key, node) in components.entries() {
        if components.is_alias(kind, key) {
            continue;
        }
        pointers.entry(node).or_insert_with(|| kind.pointer(key));
    }
    pointers
}

fn put<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

fn put_extensions(map: &mut Map<String, Value>, extensions: &Extensions) {
    for (name, value) in extensions.iter() {
        map.insert(format!("{}{}", EXTENSION_PREFIX, name), value.clone());
    }
}

fn reference(pointer: &str) -> Value {
    let mut map = Map::new();
    map.insert(REF_FIELD.to_string(), Value::String(pointer.to_string()));
    Value::Object(map)
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

struct Emitter<'d> {
    doc: &'d Document,
    options: &'d WriterOptions,
    pointers: HashMap<NodeRef, String>,
}

impl Emitter<'_> {
    /// Writes `flag` unless it is `false` and defaults are omitted.
    fn put_flag(&self, map: &mut Map<String, Value>, key: &str, flag: bool) {
        if flag || !self.options.omit_defaults {
            map.insert(key.to_string(), Value::Bool(flag));
        }
    }

    /// Inlines `node` when `holder` owns it, otherwise refers to its canonical pointer.
    fn child(&self, holder: NodeRef, node: impl Into<NodeRef>) -> Value {
        let node = node.into();
        if self.doc.parent_of(node) == Some(holder) {
            return self.inline(node);
        }
        match self.pointers.get(&node) {
            Some(pointer) => {
                trace!("Writing {:?} as $ref {}", node, pointer);
                reference(pointer)
            }
            None => {
                warn!("{:?} has no canonical location, writing it inline", node);
                self.inline(node)
            }
        }
    }

    fn inline(&self, node: NodeRef) -> Value {
        match node {
            NodeRef::Schema(id) => self.schema(id),
            NodeRef::Parameter(id) => self.parameter(id),
            NodeRef::Header(id) => self.header(id),
            NodeRef::Response(id) => self.response(id),
            NodeRef::RequestBody(id) => self.request_body(id),
            NodeRef::MediaType(id) => self.media_type(id),
            NodeRef::Example(id) => self.example(id),
            NodeRef::Link(id) => self.link(id),
            NodeRef::Callback(id) => self.callback(id),
            NodeRef::SecurityScheme(id) => self.security_scheme(id),
            NodeRef::PathItem(id) => self.path_item(id),
            NodeRef::Operation(id) => self.operation(id),
            NodeRef::Document | NodeRef::Components => Value::Null,
        }
    }

    fn children<I, K>(&self, holder: NodeRef, entries: I) -> Value
    where
        I: IntoIterator<Item = (K, NodeRef)>,
        K: Into<String>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), self.child(holder, node)))
                .collect(),
        )
    }

    fn keyed<I: Copy + Into<NodeRef>>(&self, holder: NodeRef, map: &IndexMap<String, I>) -> Value {
        self.children(holder, map.iter().map(|(k, v)| {
            let node: NodeRef = (*v).into();
            (k.as_str(), node)
        }))
    }

    fn listed<I: Copy + Into<NodeRef>>(&self, holder: NodeRef, list: &[I]) -> Value {
        Value::Array(list.iter().map(|id| self.child(holder, *id)).collect())
    }

    fn document(&self) -> Value {
        let doc = self.doc;
        let mut map = Map::new();
        map.insert(OPENAPI_FIELD.to_string(), Value::String(doc.openapi().to_string()));
        map.insert(INFO_FIELD.to_string(), self.info(&doc.info));
        if !doc.servers.is_empty() {
            map.insert(SERVERS_FIELD.to_string(), self.servers(&doc.servers));
        }

        let mut paths = Map::new();
        for (path, item) in doc.paths() {
            paths.insert(path.to_string(), self.child(NodeRef::Document, item));
        }
        put_extensions(&mut paths, &doc.paths_extensions);
        map.insert(PATHS_FIELD.to_string(), Value::Object(paths));

        if !doc.components().is_empty() {
            map.insert(COMPONENTS_FIELD.to_string(), self.components());
        }
        if !doc.security().is_empty() {
            map.insert(SECURITY_FIELD.to_string(), self.security(doc.security()));
        }
        if !doc.tags.is_empty() {
            let tags = doc.tags.iter().map(|tag| self.tag(tag)).collect();
            map.insert(TAGS_FIELD.to_string(), Value::Array(tags));
        }
        put(&mut map, EXTERNAL_DOCS_FIELD, doc.external_docs.as_ref().map(|d| self.external_docs(d)));
        put_extensions(&mut map, &doc.extensions);
        Value::Object(map)
    }

    fn components(&self) -> Value {
        let components = self.doc.components();
        let mut sections: IndexMap<ComponentKind, Map<String, Value>> = IndexMap::new();
        for (kind, key, node) in components.entries() {
            let value = if components.is_alias(kind, key) {
                match self.pointers.get(&node) {
                    Some(pointer) => reference(pointer),
                    None => self.inline(node),
                }
            } else {
                self.child(NodeRef::Components, node)
            };
            sections.entry(kind).or_default().insert(key.to_string(), value);
        }
        let mut map = Map::new();
        for (kind, section) in sections {
            map.insert(kind.as_str().to_string(), Value::Object(section));
        }
        put_extensions(&mut map, &components.extensions);
        Value::Object(map)
    }

    fn info(&self, info: &Info) -> Value {
        let mut map = Map::new();
        map.insert("title".to_string(), Value::String(info.title.clone()));
        put(&mut map, DESCRIPTION_FIELD, info.description.clone());
        put(&mut map, "termsOfService", info.terms_of_service.clone());
        if !info.contact.is_empty() {
            let contact = &info.contact;
            let mut entry = Map::new();
            put(&mut entry, NAME_FIELD, contact.name.clone());
            put(&mut entry, URL_FIELD, contact.url.clone());
            put(&mut entry, "email", contact.email.clone());
            put_extensions(&mut entry, &contact.extensions);
            map.insert("contact".to_string(), Value::Object(entry));
        }
        let license = &info.license;
        let placeholder =
            license.is_unlicensed() && license.url.is_none() && license.extensions.is_empty();
        if !placeholder || !self.options.omit_defaults {
            let mut entry = Map::new();
            entry.insert(NAME_FIELD.to_string(), Value::String(license.name.clone()));
            put(&mut entry, URL_FIELD, license.url.clone());
            put_extensions(&mut entry, &license.extensions);
            map.insert("license".to_string(), Value::Object(entry));
        }
        map.insert("version".to_string(), Value::String(info.version.clone()));
        put_extensions(&mut map, &info.extensions);
        Value::Object(map)
    }

    fn external_docs(&self, docs: &ExternalDocumentation) -> Value {
        let mut map = Map::new();
        put(&mut map, DESCRIPTION_FIELD, docs.description.clone());
        map.insert(URL_FIELD.to_string(), Value::String(docs.url.clone()));
        put_extensions(&mut map, &docs.extensions);
        Value::Object(map)
    }

    fn tag(&self, tag: &Tag) -> Value {
        let mut map = Map::new();
        map.insert(NAME_FIELD.to_string(), Value::String(tag.name().to_string()));
        put(&mut map, DESCRIPTION_FIELD, tag.description.clone());
        put(&mut map, EXTERNAL_DOCS_FIELD, tag.external_docs.as_ref().map(|d| self.external_docs(d)));
        put_extensions(&mut map, &tag.extensions);
        Value::Object(map)
    }

    fn servers(&self, servers: &[Server]) -> Value {
        Value::Array(servers.iter().map(|server| self.server(server)).collect())
    }

    fn server(&self, server: &Server) -> Value {
        let mut map = Map::new();
        map.insert(URL_FIELD.to_string(), Value::String(server.url().to_string()));
        put(&mut map, DESCRIPTION_FIELD, server.description.clone());
        let mut variables = Map::new();
        for (name, variable) in server.variables() {
            let blank = variable.default_value().is_empty()
                && variable.allowed_values().is_empty()
                && variable.description.is_none()
                && variable.extensions.is_empty();
            if blank {
                continue;
            }
            let mut entry = Map::new();
            if !variable.allowed_values().is_empty() {
                entry.insert("enum".to_string(), strings(variable.allowed_values()));
            }
            entry.insert("default".to_string(), Value::String(variable.default_value().to_string()));
            put(&mut entry, DESCRIPTION_FIELD, variable.description.clone());
            put_extensions(&mut entry, &variable.extensions);
            variables.insert(name.clone(), Value::Object(entry));
        }
        if !variables.is_empty() {
            map.insert("variables".to_string(), Value::Object(variables));
        }
        put_extensions(&mut map, &server.extensions);
        Value::Object(map)
    }

    fn security(&self, requirements: &[SecurityRequirement]) -> Value {
        Value::Array(
            requirements
                .iter()
                .map(|requirement| {
                    Value::Object(
                        requirement
                            .schemes()
                            .map(|(scheme, scopes)| (scheme.to_string(), strings(scopes)))
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    fn schema(&self, id: SchemaId) -> Value {
        let schema = &self.doc[id];
        let owner = NodeRef::Schema(id);
        let mut map = Map::new();
        put(&mut map, "title", schema.title.clone());
        put(&mut map, DESCRIPTION_FIELD, schema.description.clone());
        put(&mut map, "type", schema.schema_type.map(|t| t.as_str()));
        put(&mut map, "format", schema.format.clone());
        self.put_flag(&mut map, "nullable", schema.nullable);
        if !schema.allowed_values().is_empty() {
            map.insert("enum".to_string(), Value::Array(schema.allowed_values().to_vec()));
        }
        put(&mut map, "default", schema.default_value().cloned());

        put(&mut map, "multipleOf", schema.multiple_of.clone());
        put(&mut map, "maximum", schema.maximum.clone());
        self.put_flag(&mut map, "exclusiveMaximum", schema.exclusive_maximum);
        put(&mut map, "minimum", schema.minimum.clone());
        self.put_flag(&mut map, "exclusiveMinimum", schema.exclusive_minimum);
        put(&mut map, "maxLength", schema.max_length);
        put(&mut map, "minLength", schema.min_length);
        put(&mut map, "pattern", schema.pattern.clone());
        put(&mut map, "maxItems", schema.max_items);
        put(&mut map, "minItems", schema.min_items);
        self.put_flag(&mut map, "uniqueItems", schema.unique_items);
        put(&mut map, "maxProperties", schema.max_properties);
        put(&mut map, "minProperties", schema.min_properties);

        let required: Vec<Value> = schema.required().map(|name| Value::String(name.to_string())).collect();
        if !required.is_empty() {
            map.insert(REQUIRED_FIELD.to_string(), Value::Array(required));
        }
        if !schema.properties.is_empty() {
            map.insert("properties".to_string(), self.keyed(owner, &schema.properties));
        }
        match schema.additional_properties() {
            AdditionalProperties::Allowed(true) if self.options.omit_defaults => {}
            AdditionalProperties::Allowed(allowed) => {
                map.insert("additionalProperties".to_string(), Value::Bool(allowed));
            }
            AdditionalProperties::Schema(extra) => {
                map.insert("additionalProperties".to_string(), self.child(owner, extra));
            }
        }
        put(&mut map, "items", schema.items().map(|items| self.child(owner, items)));
        for (keyword, branches) in [
            ("allOf", schema.all_of()),
            ("oneOf", schema.one_of()),
            ("anyOf", schema.any_of()),
        ] {
            if !branches.is_empty() {
                map.insert(keyword.to_string(), self.listed(owner, branches));
            }
        }
        put(&mut map, "not", schema.not().map(|not| self.child(owner, not)));

        if let Some(discriminator) = schema.discriminator() {
            let mut entry = Map::new();
            entry.insert(
                "propertyName".to_string(),
                Value::String(discriminator.property_name().to_string()),
            );
            let mapping: Map<String, Value> = discriminator
                .mapping()
                .map(|(value, target)| (value.to_string(), Value::String(target.to_string())))
                .collect();
            if !mapping.is_empty() {
                entry.insert("mapping".to_string(), Value::Object(mapping));
            }
            put_extensions(&mut entry, &discriminator.extensions);
            map.insert("discriminator".to_string(), Value::Object(entry));
        }
        self.put_flag(&mut map, "readOnly", schema.read_only);
        self.put_flag(&mut map, "writeOnly", schema.write_only);
        put(&mut map, "xml", schema.xml.as_ref().map(|xml| self.xml(xml)));
        put(&mut map, EXTERNAL_DOCS_FIELD, schema.external_docs.as_ref().map(|d| self.external_docs(d)));
        put(&mut map, EXAMPLE_FIELD, schema.example.clone());
        self.put_flag(&mut map, DEPRECATED_FIELD, schema.deprecated);
        put_extensions(&mut map, &schema.extensions);
        Value::Object(map)
    }

    fn xml(&self, xml: &Xml) -> Value {
        let mut map = Map::new();
        put(&mut map, NAME_FIELD, xml.name.clone());
        put(&mut map, "namespace", xml.namespace.clone());
        put(&mut map, "prefix", xml.prefix.clone());
        self.put_flag(&mut map, "attribute", xml.attribute);
        self.put_flag(&mut map, "wrapped", xml.wrapped);
        put_extensions(&mut map, &xml.extensions);
        Value::Object(map)
    }

    /// The `schema`/`content` and `example`/`examples` fields shared by parameters and
    /// headers.
    fn put_value(
        &self,
        map: &mut Map<String, Value>,
        owner: NodeRef,
        value: Option<&ParameterValue>,
        examples: Option<&ExampleSet>,
    ) {
        match value {
            Some(ParameterValue::Schema(schema)) => {
                map.insert(SCHEMA_FIELD.to_string(), self.child(owner, *schema));
            }
            Some(ParameterValue::Content(content)) => {
                map.insert(CONTENT_FIELD.to_string(), self.keyed(owner, content));
            }
            None => {}
        }
        self.put_examples(map, owner, examples);
    }

    fn put_examples(&self, map: &mut Map<String, Value>, owner: NodeRef, examples: Option<&ExampleSet>) {
        match examples {
            Some(ExampleSet::Example(value)) => {
                map.insert(EXAMPLE_FIELD.to_string(), value.clone());
            }
            Some(ExampleSet::Examples(examples)) => {
                map.insert(EXAMPLES_FIELD.to_string(), self.keyed(owner, examples));
            }
            None => {}
        }
    }

    fn parameter(&self, id: ParameterId) -> Value {
        let parameter = &self.doc[id];
        let location = parameter.location();
        let mut map = Map::new();
        map.insert(NAME_FIELD.to_string(), Value::String(parameter.name().to_string()));
        map.insert(IN_FIELD.to_string(), Value::String(location.as_str().to_string()));
        put(&mut map, DESCRIPTION_FIELD, parameter.description.clone());
        if location == ParameterLocation::Path {
            map.insert(REQUIRED_FIELD.to_string(), Value::Bool(true));
        } else {
            self.put_flag(&mut map, REQUIRED_FIELD, parameter.required());
        }
        self.put_flag(&mut map, DEPRECATED_FIELD, parameter.deprecated);
        if let Some(options) = parameter.query_options() {
            self.put_flag(&mut map, "allowEmptyValue", options.allow_empty_value);
        }
        let style = parameter.style();
        if style != location.default_style() || !self.options.omit_defaults {
            map.insert(STYLE_FIELD.to_string(), Value::String(style.as_str().to_string()));
        }
        if parameter.explode() != style.default_explode() || !self.options.omit_defaults {
            map.insert(EXPLODE_FIELD.to_string(), Value::Bool(parameter.explode()));
        }
        if let Some(options) = parameter.query_options() {
            self.put_flag(&mut map, "allowReserved", options.allow_reserved);
        }
        self.put_value(&mut map, NodeRef::Parameter(id), parameter.value(), parameter.examples());
        put_extensions(&mut map, &parameter.extensions);
        Value::Object(map)
    }

    fn header(&self, id: HeaderId) -> Value {
        let header = &self.doc[id];
        let mut map = Map::new();
        put(&mut map, DESCRIPTION_FIELD, header.description.clone());
        self.put_flag(&mut map, REQUIRED_FIELD, header.required);
        self.put_flag(&mut map, DEPRECATED_FIELD, header.deprecated);
        if !self.options.omit_defaults {
            map.insert(STYLE_FIELD.to_string(), Value::String(header.style().as_str().to_string()));
        }
        if header.explode() != header.style().default_explode() || !self.options.omit_defaults {
            map.insert(EXPLODE_FIELD.to_string(), Value::Bool(header.explode()));
        }
        self.put_value(&mut map, NodeRef::Header(id), header.value(), header.examples());
        put_extensions(&mut map, &header.extensions);
        Value::Object(map)
    }

    fn media_type(&self, id: MediaTypeId) -> Value {
        let media_type = &self.doc[id];
        let owner = NodeRef::MediaType(id);
        let mut map = Map::new();
        put(&mut map, SCHEMA_FIELD, media_type.schema().map(|schema| self.child(owner, schema)));
        self.put_examples(&mut map, owner, media_type.examples());
        let encodings: Map<String, Value> = media_type
            .encodings()
            .map(|(property, encoding)| (property.to_string(), self.encoding(owner, encoding)))
            .collect();
        if !encodings.is_empty() {
            map.insert("encoding".to_string(), Value::Object(encodings));
        }
        put_extensions(&mut map, &media_type.extensions);
        Value::Object(map)
    }

    fn encoding(&self, owner: NodeRef, encoding: &Encoding) -> Value {
        let mut map = Map::new();
        put(&mut map, "contentType", encoding.content_type.clone());
        if !encoding.headers.is_empty() {
            map.insert(HEADERS_FIELD.to_string(), self.keyed(owner, &encoding.headers));
        }
        put(&mut map, STYLE_FIELD, encoding.style.map(|style| style.as_str()));
        put(&mut map, EXPLODE_FIELD, encoding.explode);
        self.put_flag(&mut map, "allowReserved", encoding.allow_reserved);
        put_extensions(&mut map, &encoding.extensions);
        Value::Object(map)
    }

    fn example(&self, id: ExampleId) -> Value {
        let example = &self.doc[id];
        let mut map = Map::new();
        put(&mut map, SUMMARY_FIELD, example.summary.clone());
        put(&mut map, DESCRIPTION_FIELD, example.description.clone());
        match &example.value {
            Some(ExampleValue::Value(value)) => {
                map.insert("value".to_string(), value.clone());
            }
            Some(ExampleValue::External(url)) => {
                map.insert("externalValue".to_string(), Value::String(url.clone()));
            }
            None => {}
        }
        put_extensions(&mut map, &example.extensions);
        Value::Object(map)
    }

    fn request_body(&self, id: RequestBodyId) -> Value {
        let body = &self.doc[id];
        let mut map = Map::new();
        put(&mut map, DESCRIPTION_FIELD, body.description.clone());
        map.insert(CONTENT_FIELD.to_string(), self.keyed(NodeRef::RequestBody(id), body.content()));
        self.put_flag(&mut map, REQUIRED_FIELD, body.required);
        put_extensions(&mut map, &body.extensions);
        Value::Object(map)
    }

    fn response(&self, id: ResponseId) -> Value {
        let response = &self.doc[id];
        let owner = NodeRef::Response(id);
        let mut map = Map::new();
        map.insert(DESCRIPTION_FIELD.to_string(), Value::String(response.description.clone()));
        if !response.headers().is_empty() {
            map.insert(HEADERS_FIELD.to_string(), self.keyed(owner, response.headers()));
        }
        if !response.content().is_empty() {
            map.insert(CONTENT_FIELD.to_string(), self.keyed(owner, response.content()));
        }
        if !response.links().is_empty() {
            map.insert("links".to_string(), self.keyed(owner, response.links()));
        }
        put_extensions(&mut map, &response.extensions);
        Value::Object(map)
    }

    fn responses(&self, owner: NodeRef, responses: &Responses) -> Value {
        let mut map = Map::new();
        for (code, response) in responses.codes() {
            map.insert(code.to_string(), self.child(owner, response));
        }
        if let Some(default) = responses.default_response() {
            map.insert(DEFAULT_RESPONSE.to_string(), self.child(owner, default));
        }
        put_extensions(&mut map, &responses.extensions);
        Value::Object(map)
    }

    fn link(&self, id: LinkId) -> Value {
        let link = &self.doc[id];
        let mut map = Map::new();
        match &link.target {
            Some(LinkTarget::OperationRef(reference)) => {
                map.insert("operationRef".to_string(), Value::String(reference.clone()));
            }
            Some(LinkTarget::OperationId(operation)) => {
                map.insert("operationId".to_string(), Value::String(operation.clone()));
            }
            None => {}
        }
        if !link.parameters.is_empty() {
            let parameters = link
                .parameters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            map.insert(PARAMETERS_FIELD.to_string(), Value::Object(parameters));
        }
        put(&mut map, REQUEST_BODY_FIELD, link.request_body.clone());
        put(&mut map, DESCRIPTION_FIELD, link.description.clone());
        put(&mut map, "server", link.server.as_ref().map(|server| self.server(server)));
        put_extensions(&mut map, &link.extensions);
        Value::Object(map)
    }

    fn callback(&self, id: CallbackId) -> Value {
        let callback = &self.doc[id];
        let owner = NodeRef::Callback(id);
        let mut map = Map::new();
        for (expression, item) in callback.expressions() {
            map.insert(expression.to_string(), self.child(owner, item));
        }
        put_extensions(&mut map, &callback.extensions);
        Value::Object(map)
    }

    fn security_scheme(&self, id: SecuritySchemeId) -> Value {
        let scheme = &self.doc[id];
        let kind = scheme.kind();
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(kind.type_name().to_string()));
        put(&mut map, DESCRIPTION_FIELD, scheme.description.clone());
        match kind {
            SecuritySchemeKind::ApiKey { name, location } => {
                map.insert(NAME_FIELD.to_string(), Value::String(name.clone()));
                map.insert(IN_FIELD.to_string(), Value::String(location.as_str().to_string()));
            }
            SecuritySchemeKind::Http {
                scheme,
                bearer_format,
            } => {
                map.insert("scheme".to_string(), Value::String(scheme.clone()));
                put(&mut map, "bearerFormat", bearer_format.clone());
            }
            SecuritySchemeKind::OAuth2 { flows } => {
                map.insert("flows".to_string(), self.flows(flows));
            }
            SecuritySchemeKind::OpenIdConnect { url } => {
                map.insert("openIdConnectUrl".to_string(), Value::String(url.clone()));
            }
        }
        put_extensions(&mut map, &scheme.extensions);
        Value::Object(map)
    }

    fn flows(&self, flows: &OAuthFlows) -> Value {
        let mut map = Map::new();
        for flow in flows.flows() {
            let mut entry = Map::new();
            put(&mut entry, "authorizationUrl", flow.authorization_url());
            put(&mut entry, "tokenUrl", flow.token_url());
            put(&mut entry, "refreshUrl", flow.refresh_url());
            let scopes = flow
                .scopes()
                .map(|(name, description)| (name.to_string(), Value::String(description.to_string())))
                .collect();
            entry.insert("scopes".to_string(), Value::Object(scopes));
            put_extensions(&mut entry, &flow.extensions);
            map.insert(flow.kind().as_str().to_string(), Value::Object(entry));
        }
        put_extensions(&mut map, &flows.extensions);
        Value::Object(map)
    }

    fn path_item(&self, id: PathItemId) -> Value {
        let item = &self.doc[id];
        let owner = NodeRef::PathItem(id);
        let mut map = Map::new();
        put(&mut map, SUMMARY_FIELD, item.summary.clone());
        put(&mut map, DESCRIPTION_FIELD, item.description.clone());
        for (method, operation) in item.operations() {
            if let Some(key) = method_key(method) {
                map.insert(key.to_string(), self.child(owner, operation));
            }
        }
        if !item.servers.is_empty() {
            map.insert(SERVERS_FIELD.to_string(), self.servers(&item.servers));
        }
        if !item.parameters().is_empty() {
            map.insert(PARAMETERS_FIELD.to_string(), self.listed(owner, item.parameters()));
        }
        put_extensions(&mut map, &item.extensions);
        Value::Object(map)
    }

    fn operation(&self, id: OperationId) -> Value {
        let operation = &self.doc[id];
        let owner = NodeRef::Operation(id);
        let mut map = Map::new();
        if !operation.tags.is_empty() {
            map.insert(TAGS_FIELD.to_string(), strings(&operation.tags));
        }
        put(&mut map, SUMMARY_FIELD, operation.summary.clone());
        put(&mut map, DESCRIPTION_FIELD, operation.description.clone());
        put(&mut map, EXTERNAL_DOCS_FIELD, operation.external_docs.as_ref().map(|d| self.external_docs(d)));
        put(&mut map, "operationId", operation.operation_id.clone());
        if !operation.parameters().is_empty() {
            map.insert(PARAMETERS_FIELD.to_string(), self.listed(owner, operation.parameters()));
        }
        put(&mut map, REQUEST_BODY_FIELD, operation.request_body().map(|body| self.child(owner, body)));
        map.insert(RESPONSES_FIELD.to_string(), self.responses(owner, operation.responses()));
        if !operation.callbacks().is_empty() {
            map.insert("callbacks".to_string(), self.keyed(owner, operation.callbacks()));
        }
        self.put_flag(&mut map, DEPRECATED_FIELD, operation.deprecated);
        // an explicit empty list opts the operation out of document-level security
        put(&mut map, SECURITY_FIELD, operation.security().map(|list| self.security(list)));
        if !operation.servers.is_empty() {
            map.insert(SERVERS_FIELD.to_string(), self.servers(&operation.servers));
        }
        put_extensions(&mut map, &operation.extensions);
        Value::Object(map)
    }
}
