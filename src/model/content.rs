//! Payload description nodes: media types, request bodies, responses, examples, links.

use crate::error::{OpenApiError, Result};
use crate::model::Document;
use crate::model::extensions::{Extensions, impl_extensible};
use crate::model::node::{
    Attach, ExampleId, HeaderId, LinkId, MediaTypeId, NodeRef, ParameterId, RequestBodyId,
    ResponseId, SchemaId, Slots, impl_owned_node,
};
use crate::model::parameter::{ExampleSet, Header, ParameterStyle, ParameterValue};
use crate::model::schema::SchemaSource;
use crate::model::server::Server;
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub(crate) schema: Option<SchemaId>,
    pub(crate) examples: Option<ExampleSet>,
    pub(crate) encoding: IndexMap<String, Encoding>,
}

impl_owned_node!(MediaType);

impl MediaType {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            schema: None,
            examples: None,
            encoding: IndexMap::new(),
        }
    }

    pub fn schema(&self) -> Option<SchemaId> {
        self.schema
    }

    pub fn examples(&self) -> Option<&ExampleSet> {
        self.examples.as_ref()
    }

    pub fn encoding(&self, property: &str) -> Option<&Encoding> {
        self.encoding.get(property)
    }

    pub fn encoding_mut(&mut self, property: &str) -> Option<&mut Encoding> {
        self.encoding.get_mut(property)
    }

    pub fn encodings(&self) -> impl Iterator<Item = (&str, &Encoding)> {
        self.encoding.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.optional(&["schema"], self.schema);
        if let Some(examples) = &self.examples {
            examples.push_slots(&mut slots);
        }
        for (property, encoding) in &self.encoding {
            slots.keyed(&["encoding", property, "headers"], &encoding.headers);
        }
        slots
    }
}

/// Serialization rules for one property of a multipart or form-encoded body.
///
/// Headers declared here are owned by the enclosing [`MediaType`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoding {
    pub content_type: Option<String>,
    pub(crate) headers: IndexMap<String, HeaderId>,
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
    pub allow_reserved: bool,
    pub extensions: Extensions,
}

impl Encoding {
    pub fn headers(&self) -> impl Iterator<Item = (&str, HeaderId)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn header(&self, name: &str) -> Option<HeaderId> {
        self.headers.get(name).copied()
    }
}

/// The two mutually exclusive ways an Example Object carries its sample.
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleValue {
    Value(Value),
    External(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub value: Option<ExampleValue>,
}

impl_owned_node!(Example);

impl Example {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            summary: None,
            description: None,
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub description: Option<String>,
    pub required: bool,
    pub(crate) content: IndexMap<String, MediaTypeId>,
}

impl_owned_node!(RequestBody);

impl RequestBody {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            description: None,
            required: false,
            content: IndexMap::new(),
        }
    }

    pub fn content(&self) -> &IndexMap<String, MediaTypeId> {
        &self.content
    }

    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.keyed(&["content"], &self.content);
        slots
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub description: String,
    pub(crate) headers: IndexMap<String, HeaderId>,
    pub(crate) content: IndexMap<String, MediaTypeId>,
    pub(crate) links: IndexMap<String, LinkId>,
}

impl_owned_node!(Response);

impl Response {
    pub(crate) fn new(parent: NodeRef, description: impl Into<String>) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            description: description.into(),
            headers: IndexMap::new(),
            content: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    pub fn headers(&self) -> &IndexMap<String, HeaderId> {
        &self.headers
    }

    pub fn content(&self) -> &IndexMap<String, MediaTypeId> {
        &self.content
    }

    pub fn links(&self) -> &IndexMap<String, LinkId> {
        &self.links
    }

    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.keyed(&["headers"], &self.headers);
        slots.keyed(&["content"], &self.content);
        slots.keyed(&["links"], &self.links);
        slots
    }
}

/// Key of the catch-all response; it has its own slot and never enters the code map.
pub const DEFAULT_RESPONSE: &str = "default";

/// The Responses Object of an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Responses {
    pub(crate) default: Option<ResponseId>,
    pub(crate) codes: IndexMap<String, ResponseId>,
    pub extensions: Extensions,
}

impl Responses {
    pub fn default_response(&self) -> Option<ResponseId> {
        self.default
    }

    pub fn code(&self, status: &str) -> Option<ResponseId> {
        self.codes.get(status).copied()
    }

    /// Looks up either `default` or a status code.
    pub fn get(&self, key: &str) -> Option<ResponseId> {
        if key == DEFAULT_RESPONSE {
            self.default
        } else {
            self.code(key)
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = (&str, ResponseId)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.codes.is_empty()
    }

    pub(crate) fn push_slots(&self, slots: &mut Slots) {
        slots.keyed(&["responses"], &self.codes);
        slots.optional(&["responses", DEFAULT_RESPONSE], self.default);
    }
}

impl_extensible!(Encoding, Responses);

/// Checks a Responses key: a literal `100`..`599` or a `1XX`..`5XX` range.
pub fn validate_status_code(code: &str) -> Result<()> {
    let bytes = code.as_bytes();
    let valid = bytes.len() == 3
        && (b'1'..=b'5').contains(&bytes[0])
        && ((bytes[1].is_ascii_digit() && bytes[2].is_ascii_digit())
            || (bytes[1] == b'X' && bytes[2] == b'X'));
    if valid {
        Ok(())
    } else {
        Err(OpenApiError::invariant(format!(
            "'{}' is not a response status code",
            code
        )))
    }
}

/// How a Link Object names its target operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    OperationRef(String),
    OperationId(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub target: Option<LinkTarget>,
    pub parameters: IndexMap<String, Value>,
    pub request_body: Option<Value>,
    pub description: Option<String>,
    pub server: Option<Server>,
}

impl_owned_node!(Link);

impl Link {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            target: None,
            parameters: IndexMap::new(),
            request_body: None,
            description: None,
            server: None,
        }
    }
}

/// Nodes with a MIME-keyed `content` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOwner {
    RequestBody(RequestBodyId),
    Response(ResponseId),
    Parameter(ParameterId),
    Header(HeaderId),
}

/// Nodes with a `schema` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOwner {
    Parameter(ParameterId),
    Header(HeaderId),
    MediaType(MediaTypeId),
}

/// Nodes with an `example`/`examples` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleOwner {
    Parameter(ParameterId),
    Header(HeaderId),
    MediaType(MediaTypeId),
}

/// Places that hold a name-keyed header map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOwner {
    Response(ResponseId),
    Encoding(MediaTypeId, String),
}

macro_rules! owner_conversions {
    ($owner:ident { $($variant:ident($id:ty)),* $(,)? }) => {
        $(
            impl From<$id> for $owner {
                fn from(id: $id) -> Self {
                    $owner::$variant(id)
                }
            }
        )*

        impl From<$owner> for NodeRef {
            fn from(owner: $owner) -> Self {
                match owner {
                    $($owner::$variant(id) => id.into(),)*
                }
            }
        }
    };
}

owner_conversions!(ContentOwner {
    RequestBody(RequestBodyId),
    Response(ResponseId),
    Parameter(ParameterId),
    Header(HeaderId),
});
owner_conversions!(SchemaOwner {
    Parameter(ParameterId),
    Header(HeaderId),
    MediaType(MediaTypeId),
});
owner_conversions!(ExampleOwner {
    Parameter(ParameterId),
    Header(HeaderId),
    MediaType(MediaTypeId),
});

impl From<ResponseId> for HeaderOwner {
    fn from(id: ResponseId) -> Self {
        HeaderOwner::Response(id)
    }
}

impl HeaderOwner {
    fn node(&self) -> NodeRef {
        match self {
            HeaderOwner::Response(id) => (*id).into(),
            HeaderOwner::Encoding(id, _) => (*id).into(),
        }
    }
}

fn content_of(value: &mut Option<ParameterValue>) -> Result<&mut IndexMap<String, MediaTypeId>> {
    match value.get_or_insert_with(|| ParameterValue::Content(IndexMap::new())) {
        ParameterValue::Content(content) => Ok(content),
        ParameterValue::Schema(_) => Err(OpenApiError::invariant(
            "'content' cannot be set while 'schema' is present",
        )),
    }
}

fn examples_map(slot: &mut Option<ExampleSet>) -> Result<&mut IndexMap<String, ExampleId>> {
    match slot.get_or_insert_with(|| ExampleSet::Examples(IndexMap::new())) {
        ExampleSet::Examples(examples) => Ok(examples),
        ExampleSet::Example(_) => Err(OpenApiError::invariant(
            "'examples' cannot be set while 'example' is present",
        )),
    }
}

impl Document {
    pub fn content(&self, owner: impl Into<ContentOwner>) -> Option<&IndexMap<String, MediaTypeId>> {
        let value = match owner.into() {
            ContentOwner::RequestBody(id) => return Some(&self[id].content),
            ContentOwner::Response(id) => return Some(&self[id].content),
            ContentOwner::Parameter(id) => &self[id].value,
            ContentOwner::Header(id) => &self[id].value,
        };
        match value {
            Some(ParameterValue::Content(content)) => Some(content),
            _ => None,
        }
    }

    fn content_map_mut(&mut self, owner: ContentOwner) -> Result<&mut IndexMap<String, MediaTypeId>> {
        match owner {
            ContentOwner::RequestBody(id) => Ok(&mut self[id].content),
            ContentOwner::Response(id) => Ok(&mut self[id].content),
            ContentOwner::Parameter(id) => content_of(&mut self[id].value),
            ContentOwner::Header(id) => content_of(&mut self[id].value),
        }
    }

    /// Adds a media type under `mime`. Parameters and headers accept a single entry,
    /// and only while no `schema` is set.
    pub fn add_media_type(
        &mut self,
        owner: impl Into<ContentOwner>,
        mime: impl Into<String>,
    ) -> Result<MediaTypeId> {
        let owner = owner.into();
        if matches!(owner, ContentOwner::Parameter(_) | ContentOwner::Header(_))
            && self.content(owner).is_some_and(|c| !c.is_empty())
        {
            return Err(OpenApiError::invariant(
                "a parameter or header 'content' map holds exactly one entry",
            ));
        }
        let node = MediaType::new(owner.into());
        self.attach("content", mime.into(), Attach::New(node), |doc| {
            doc.content_map_mut(owner)
        })
    }

    pub fn remove_media_type(&mut self, owner: impl Into<ContentOwner>, mime: &str) -> Result<bool> {
        let owner = owner.into();
        let removed = self.detach(owner.into(), mime, |doc| doc.content_map_mut(owner))?;
        let value = match owner {
            ContentOwner::Parameter(id) => Some(&mut self[id].value),
            ContentOwner::Header(id) => Some(&mut self[id].value),
            _ => None,
        };
        if let Some(value) = value {
            if matches!(value, Some(ParameterValue::Content(c)) if c.is_empty()) {
                *value = None;
            }
        }
        Ok(removed.is_some())
    }

    pub fn schema_of(&self, owner: impl Into<SchemaOwner>) -> Option<SchemaId> {
        match owner.into() {
            SchemaOwner::Parameter(id) => self[id].schema(),
            SchemaOwner::Header(id) => self[id].schema(),
            SchemaOwner::MediaType(id) => self[id].schema,
        }
    }

    /// Sets the `schema` slot, releasing a previous schema. Fails on a parameter or header
    /// that uses `content`.
    pub fn set_schema(
        &mut self,
        owner: impl Into<SchemaOwner>,
        source: impl Into<SchemaSource>,
    ) -> Result<SchemaId> {
        let owner = owner.into();
        let value = match owner {
            SchemaOwner::Parameter(id) => Some(&self[id].value),
            SchemaOwner::Header(id) => Some(&self[id].value),
            SchemaOwner::MediaType(_) => None,
        };
        if matches!(value, Some(Some(ParameterValue::Content(_)))) {
            return Err(OpenApiError::invariant(
                "'schema' cannot be set while 'content' is present",
            ));
        }
        let child = self.resolve_schema_source(owner.into(), source.into())?;
        let previous = match owner {
            SchemaOwner::Parameter(id) => self[id].value.replace(ParameterValue::Schema(child)),
            SchemaOwner::Header(id) => self[id].value.replace(ParameterValue::Schema(child)),
            SchemaOwner::MediaType(id) => self[id].schema.replace(child).map(ParameterValue::Schema),
        };
        if let Some(ParameterValue::Schema(previous)) = previous {
            if previous != child {
                self.release(owner.into(), previous.into());
            }
        }
        Ok(child)
    }

    pub fn clear_schema(&mut self, owner: impl Into<SchemaOwner>) {
        let owner = owner.into();
        let Some(previous) = self.schema_of(owner) else {
            return;
        };
        match owner {
            SchemaOwner::Parameter(id) => self[id].value = None,
            SchemaOwner::Header(id) => self[id].value = None,
            SchemaOwner::MediaType(id) => self[id].schema = None,
        }
        self.release(owner.into(), previous.into());
    }

    fn example_slot_mut(&mut self, owner: ExampleOwner) -> &mut Option<ExampleSet> {
        match owner {
            ExampleOwner::Parameter(id) => &mut self[id].examples,
            ExampleOwner::Header(id) => &mut self[id].examples,
            ExampleOwner::MediaType(id) => &mut self[id].examples,
        }
    }

    pub fn examples_of(&self, owner: impl Into<ExampleOwner>) -> Option<&ExampleSet> {
        match owner.into() {
            ExampleOwner::Parameter(id) => self[id].examples.as_ref(),
            ExampleOwner::Header(id) => self[id].examples.as_ref(),
            ExampleOwner::MediaType(id) => self[id].examples.as_ref(),
        }
    }

    /// Sets the single `example` value. Fails while named `examples` exist.
    pub fn set_example(&mut self, owner: impl Into<ExampleOwner>, value: Value) -> Result<()> {
        let slot = self.example_slot_mut(owner.into());
        if matches!(slot, Some(ExampleSet::Examples(examples)) if !examples.is_empty()) {
            return Err(OpenApiError::invariant(
                "'example' cannot be set while 'examples' is present",
            ));
        }
        *slot = Some(ExampleSet::Example(value));
        Ok(())
    }

    pub fn add_example(&mut self, owner: impl Into<ExampleOwner>, name: impl Into<String>) -> Result<ExampleId> {
        let owner = owner.into();
        let node = Example::new(owner.into());
        self.attach("examples", name.into(), Attach::New(node), |doc| {
            examples_map(doc.example_slot_mut(owner))
        })
    }

    pub fn add_example_ref(
        &mut self,
        owner: impl Into<ExampleOwner>,
        name: impl Into<String>,
        shared: ExampleId,
    ) -> Result<()> {
        let owner = owner.into();
        self.attach("examples", name.into(), Attach::Shared(shared), |doc| {
            examples_map(doc.example_slot_mut(owner))
        })?;
        Ok(())
    }

    pub fn remove_example(&mut self, owner: impl Into<ExampleOwner>, name: &str) -> Result<bool> {
        let owner = owner.into();
        if !matches!(self.examples_of(owner), Some(ExampleSet::Examples(_))) {
            return Ok(false);
        }
        let removed = self.detach(owner.into(), name, |doc| {
            examples_map(doc.example_slot_mut(owner))
        })?;
        let slot = self.example_slot_mut(owner);
        if matches!(slot, Some(ExampleSet::Examples(e)) if e.is_empty()) {
            *slot = None;
        }
        Ok(removed.is_some())
    }

    /// Drops `example` or every entry of `examples`.
    pub fn clear_examples(&mut self, owner: impl Into<ExampleOwner>) {
        let owner = owner.into();
        if let Some(ExampleSet::Examples(examples)) = self.example_slot_mut(owner).take() {
            for id in examples.into_values() {
                self.release(owner.into(), id.into());
            }
        }
    }

    fn header_map_mut(&mut self, owner: &HeaderOwner) -> Result<&mut IndexMap<String, HeaderId>> {
        match owner {
            HeaderOwner::Response(id) => Ok(&mut self[*id].headers),
            HeaderOwner::Encoding(id, property) => self[*id]
                .encoding
                .get_mut(property)
                .map(|encoding| &mut encoding.headers)
                .ok_or_else(|| {
                    OpenApiError::invariant(format!("no encoding for property '{}'", property))
                }),
        }
    }

    pub fn add_header(&mut self, owner: impl Into<HeaderOwner>, name: impl Into<String>) -> Result<HeaderId> {
        let owner = owner.into();
        let node = Header::new(owner.node());
        self.attach("headers", name.into(), Attach::New(node), |doc| {
            doc.header_map_mut(&owner)
        })
    }

    pub fn add_header_ref(
        &mut self,
        owner: impl Into<HeaderOwner>,
        name: impl Into<String>,
        shared: HeaderId,
    ) -> Result<()> {
        let owner = owner.into();
        self.attach("headers", name.into(), Attach::Shared(shared), |doc| {
            doc.header_map_mut(&owner)
        })?;
        Ok(())
    }

    pub fn remove_header(&mut self, owner: impl Into<HeaderOwner>, name: &str) -> Result<bool> {
        let owner = owner.into();
        let removed = self.detach(owner.node(), name, |doc| doc.header_map_mut(&owner))?;
        Ok(removed.is_some())
    }

    pub fn add_encoding(&mut self, media_type: MediaTypeId, property: impl Into<String>) -> Result<&mut Encoding> {
        let property = property.into();
        let encodings = &mut self[media_type].encoding;
        if encodings.contains_key(&property) {
            return Err(OpenApiError::duplicate_key("encoding", &property));
        }
        Ok(encodings.entry(property).or_default())
    }

    pub fn remove_encoding(&mut self, media_type: MediaTypeId, property: &str) -> bool {
        let Some(encoding) = self[media_type].encoding.shift_remove(property) else {
            return false;
        };
        for id in encoding.headers.into_values() {
            self.release(media_type.into(), id.into());
        }
        true
    }

    pub fn add_link(&mut self, response: ResponseId, name: impl Into<String>) -> Result<LinkId> {
        let node = Link::new(response.into());
        self.attach("links", name.into(), Attach::New(node), |doc| {
            Ok(&mut doc[response].links)
        })
    }

    pub fn add_link_ref(&mut self, response: ResponseId, name: impl Into<String>, shared: LinkId) -> Result<()> {
        self.attach("links", name.into(), Attach::Shared(shared), |doc| {
            Ok(&mut doc[response].links)
        })?;
        Ok(())
    }

    pub fn remove_link(&mut self, response: ResponseId, name: &str) -> bool {
        matches!(
            self.detach(response.into(), name, |doc| Ok(&mut doc[response].links)),
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
    use http::Method;
    use serde_json::json;

    fn response() -> (Document, ResponseId) {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        let response = doc.add_response(op, "200", "OK").unwrap();
        (doc, response)
    }

    #[test]
    fn test_status_codes() {
        for code in ["200", "404", "1XX", "5XX", "599"] {
            assert!(validate_status_code(code).is_ok(), "{}", code);
        }
        for code in ["default", "600", "2X0", "20", "2000", "0XX", "abc"] {
            assert!(validate_status_code(code).is_err(), "{}", code);
        }
    }

    #[test]
    fn test_media_types_are_keyed_by_mime() {
        let (mut doc, response) = response();
        let json = doc.add_media_type(response, "application/json").unwrap();
        assert!(doc.add_media_type(response, "application/json").is_err());
        let schema = doc.set_schema(json, SchemaType::Object).unwrap();
        assert_eq!(doc[json].schema(), Some(schema));
        assert_eq!(doc[schema].parent(), NodeRef::MediaType(json));

        assert!(doc.remove_media_type(response, "application/json").unwrap());
        assert!(doc.get(json).is_none());
        assert!(doc.get(schema).is_none());
        assert!(!doc.remove_media_type(response, "application/json").unwrap());
    }

    #[test]
    fn test_parameter_schema_and_content_are_exclusive() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let param = doc.add_parameter(item, "filter", ParameterLocation::Query).unwrap();

        doc.set_schema(param, SchemaType::String).unwrap();
        let err = doc.add_media_type(param, "application/json").unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));

        doc.clear_schema(param);
        assert_eq!(doc[param].value(), None);
        doc.add_media_type(param, "application/json").unwrap();
        assert!(doc.add_media_type(param, "text/plain").is_err());
        assert!(doc.set_schema(param, SchemaType::String).is_err());

        doc.remove_media_type(param, "application/json").unwrap();
        assert_eq!(doc[param].value(), None);
        doc.set_schema(param, SchemaType::Integer).unwrap();
    }

    #[test]
    fn test_example_and_examples_are_exclusive() {
        let (mut doc, response) = response();
        let media = doc.add_media_type(response, "application/json").unwrap();
        doc.set_example(media, json!({"id": 1})).unwrap();
        assert!(doc.add_example(media, "first").is_err());

        doc.clear_examples(media);
        let first = doc.add_example(media, "first").unwrap();
        doc[first].value = Some(ExampleValue::External("https://example.com/pet.json".into()));
        assert!(doc.set_example(media, json!(1)).is_err());
        assert!(doc.add_example(media, "first").is_err());

        assert!(doc.remove_example(media, "first").unwrap());
        assert!(doc.examples_of(media).is_none());
        doc.set_example(media, json!(1)).unwrap();
        assert_eq!(doc.examples_of(media), Some(&ExampleSet::Example(json!(1))));
    }

    #[test]
    fn test_shared_examples_are_unlinked_not_freed() {
        let (mut doc, response) = response();
        let shared = doc.add_component_example("Cat").unwrap();
        let media = doc.add_media_type(response, "application/json").unwrap();
        doc.add_example_ref(media, "cat", shared).unwrap();
        doc.clear_examples(media);
        assert!(doc.get(shared).is_some());
    }

    #[test]
    fn test_rejected_example_ref_leaves_no_empty_examples() {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets").unwrap();
        let first = doc.add_parameter(item, "x", ParameterLocation::Query).unwrap();
        let second = doc.add_parameter(item, "y", ParameterLocation::Query).unwrap();
        let owned = doc.add_example(first, "sample").unwrap();

        let err = doc.add_example_ref(second, "y", owned).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        assert!(doc.examples_of(second).is_none());
        assert_eq!(doc[owned].parent(), NodeRef::Parameter(first));
    }

    #[test]
    fn test_encoding_headers_belong_to_the_media_type() {
        let (mut doc, response) = response();
        let media = doc.add_media_type(response, "multipart/form-data").unwrap();
        let owner = HeaderOwner::Encoding(media, "avatar".into());
        assert!(doc.add_header(owner.clone(), "X-Rate").is_err());

        doc.add_encoding(media, "avatar").unwrap().content_type = Some("image/png".into());
        let header = doc.add_header(owner.clone(), "X-Rate").unwrap();
        assert_eq!(doc[header].parent(), NodeRef::MediaType(media));
        assert_eq!(doc[media].encoding("avatar").unwrap().header("X-Rate"), Some(header));

        assert!(doc.remove_encoding(media, "avatar"));
        assert!(doc.get(header).is_none());
    }

    #[test]
    fn test_response_headers_and_links() {
        let (mut doc, response) = response();
        let header = doc.add_header(response, "X-Total").unwrap();
        doc.set_schema(header, SchemaType::Integer).unwrap();
        let link = doc.add_link(response, "self").unwrap();
        doc[link].target = Some(LinkTarget::OperationId("getPet".into()));
        doc[link].parameters.insert("id".into(), json!("$response.body#/id"));

        assert!(doc.add_link(response, "self").is_err());
        assert!(doc.remove_header(response, "X-Total").unwrap());
        assert!(doc.remove_link(response, "self"));
        assert!(!doc.remove_link(response, "self"));
        assert!(doc.get(header).is_none());
        assert!(doc.get(link).is_none());
    }

    #[test]
    fn test_responses_lookup() {
        let (_, response) = response();
        let mut responses = Responses::default();
        assert!(responses.is_empty());
        responses.default = Some(response);
        assert_eq!(responses.get(DEFAULT_RESPONSE), Some(response));
        assert_eq!(responses.code(DEFAULT_RESPONSE), None);
        assert!(!responses.is_empty());
    }
}
