//! Parameter and Header Objects, with the per-location style rules of OpenAPI 3.0.x.

use crate::error::{OpenApiError, Result};
use crate::model::Document;
use crate::model::extensions::Extensions;
use crate::model::node::{
    ExampleId, MediaTypeId, NodeRef, OperationId, ParameterId, PathItemId, SchemaId, Slots,
    impl_owned_node,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }

    /// Styles a parameter in this location may use.
    pub fn allowed_styles(&self) -> &'static [ParameterStyle] {
        match self {
            ParameterLocation::Path => &[
                ParameterStyle::Matrix,
                ParameterStyle::Label,
                ParameterStyle::Simple,
            ],
            ParameterLocation::Query => &[
                ParameterStyle::Form,
                ParameterStyle::SpaceDelimited,
                ParameterStyle::PipeDelimited,
                ParameterStyle::DeepObject,
            ],
            ParameterLocation::Header => &[ParameterStyle::Simple],
            ParameterLocation::Cookie => &[ParameterStyle::Form],
        }
    }

    pub fn default_style(&self) -> ParameterStyle {
        match self {
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
            ParameterLocation::Query | ParameterLocation::Cookie => ParameterStyle::Form,
        }
    }
}

impl Display for ParameterLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "path" => Ok(ParameterLocation::Path),
            "query" => Ok(ParameterLocation::Query),
            "header" => Ok(ParameterLocation::Header),
            "cookie" => Ok(ParameterLocation::Cookie),
            other => Err(OpenApiError::invariant(format!(
                "'{}' is not a parameter location",
                other
            ))),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        }
    }

    /// `explode` defaults to `true` for `form` and to `false` for every other style.
    pub fn default_explode(&self) -> bool {
        *self == ParameterStyle::Form
    }
}

impl Display for ParameterStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParameterStyle {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "matrix" => Ok(ParameterStyle::Matrix),
            "label" => Ok(ParameterStyle::Label),
            "form" => Ok(ParameterStyle::Form),
            "simple" => Ok(ParameterStyle::Simple),
            "spaceDelimited" => Ok(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Ok(ParameterStyle::PipeDelimited),
            "deepObject" => Ok(ParameterStyle::DeepObject),
            other => Err(OpenApiError::invariant(format!(
                "'{}' is not a parameter style",
                other
            ))),
        }
    }
}

/// Query-only switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub allow_empty_value: bool,
    pub allow_reserved: bool,
}

/// The `in` of a parameter together with the fields only that location carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Path,
    Query(QueryOptions),
    Header,
    Cookie,
}

impl ParameterKind {
    pub fn location(&self) -> ParameterLocation {
        match self {
            ParameterKind::Path => ParameterLocation::Path,
            ParameterKind::Query(_) => ParameterLocation::Query,
            ParameterKind::Header => ParameterLocation::Header,
            ParameterKind::Cookie => ParameterLocation::Cookie,
        }
    }
}

impl From<ParameterLocation> for ParameterKind {
    fn from(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Path => ParameterKind::Path,
            ParameterLocation::Query => ParameterKind::Query(QueryOptions::default()),
            ParameterLocation::Header => ParameterKind::Header,
            ParameterLocation::Cookie => ParameterKind::Cookie,
        }
    }
}

/// `schema` and `content` are mutually exclusive; a parameter holds one or the other.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Schema(SchemaId),
    Content(IndexMap<String, MediaTypeId>),
}

impl ParameterValue {
    pub(crate) fn push_slots(&self, slots: &mut Slots) {
        match self {
            ParameterValue::Schema(id) => slots.one(&["schema"], *id),
            ParameterValue::Content(content) => slots.keyed(&["content"], content),
        }
    }
}

/// `example` and `examples` are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleSet {
    Example(Value),
    Examples(IndexMap<String, ExampleId>),
}

impl ExampleSet {
    pub(crate) fn push_slots(&self, slots: &mut Slots) {
        if let ExampleSet::Examples(examples) = self {
            slots.keyed(&["examples"], examples);
        }
    }
}

pub(crate) fn value_slots(value: &Option<ParameterValue>, examples: &Option<ExampleSet>) -> Slots {
    let mut slots = Slots::default();
    if let Some(value) = value {
        value.push_slots(&mut slots);
    }
    if let Some(examples) = examples {
        examples.push_slots(&mut slots);
    }
    slots
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    name: String,
    kind: ParameterKind,
    pub description: Option<String>,
    pub deprecated: bool,
    required: bool,
    style: ParameterStyle,
    explode: Option<bool>,
    pub(crate) value: Option<ParameterValue>,
    pub(crate) examples: Option<ExampleSet>,
}

impl_owned_node!(Parameter);

impl Parameter {
    pub(crate) fn new(parent: NodeRef, name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            name: name.into(),
            kind: location.into(),
            description: None,
            deprecated: false,
            required: location == ParameterLocation::Path,
            style: location.default_style(),
            explode: None,
            value: None,
            examples: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> ParameterLocation {
        self.kind.location()
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn query_options(&self) -> Option<&QueryOptions> {
        match &self.kind {
            ParameterKind::Query(options) => Some(options),
            _ => None,
        }
    }

    pub fn query_options_mut(&mut self) -> Option<&mut QueryOptions> {
        match &mut self.kind {
            ParameterKind::Query(options) => Some(options),
            _ => None,
        }
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// Path parameters are always required.
    pub fn set_required(&mut self, required: bool) -> Result<()> {
        if !required && self.location() == ParameterLocation::Path {
            return Err(OpenApiError::invariant(format!(
                "path parameter '{}' must be required",
                self.name
            )));
        }
        self.required = required;
        Ok(())
    }

    pub fn style(&self) -> ParameterStyle {
        self.style
    }

    pub fn set_style(&mut self, style: ParameterStyle) -> Result<()> {
        check_style(self.location(), style, &self.name)?;
        self.style = style;
        Ok(())
    }

    /// Effective `explode`: the explicit value, or the default for the current style.
    pub fn explode(&self) -> bool {
        self.explode.unwrap_or_else(|| self.style.default_explode())
    }

    pub fn set_explode(&mut self, explode: Option<bool>) {
        self.explode = explode;
    }

    pub fn value(&self) -> Option<&ParameterValue> {
        self.value.as_ref()
    }

    pub fn schema(&self) -> Option<SchemaId> {
        match &self.value {
            Some(ParameterValue::Schema(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn examples(&self) -> Option<&ExampleSet> {
        self.examples.as_ref()
    }
}

fn check_style(location: ParameterLocation, style: ParameterStyle, name: &str) -> Result<()> {
    if location.allowed_styles().contains(&style) {
        Ok(())
    } else {
        Err(OpenApiError::invariant(format!(
            "style '{}' is not allowed for {} parameter '{}'",
            style, location, name
        )))
    }
}

/// The Header Object: a header parameter without `name` and `in`.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    explode: Option<bool>,
    pub(crate) value: Option<ParameterValue>,
    pub(crate) examples: Option<ExampleSet>,
}

impl_owned_node!(Header);

impl Header {
    pub(crate) fn new(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            description: None,
            required: false,
            deprecated: false,
            explode: None,
            value: None,
            examples: None,
        }
    }

    pub fn style(&self) -> ParameterStyle {
        ParameterStyle::Simple
    }

    pub fn set_style(&mut self, style: ParameterStyle) -> Result<()> {
        check_style(ParameterLocation::Header, style, "header")
    }

    pub fn explode(&self) -> bool {
        self.explode.unwrap_or(false)
    }

    pub fn set_explode(&mut self, explode: Option<bool>) {
        self.explode = explode;
    }

    pub fn value(&self) -> Option<&ParameterValue> {
        self.value.as_ref()
    }

    pub fn schema(&self) -> Option<SchemaId> {
        match &self.value {
            Some(ParameterValue::Schema(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn examples(&self) -> Option<&ExampleSet> {
        self.examples.as_ref()
    }
}

/// Nodes that carry a parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterOwner {
    PathItem(PathItemId),
    Operation(OperationId),
}

impl From<PathItemId> for ParameterOwner {
    fn from(id: PathItemId) -> Self {
        ParameterOwner::PathItem(id)
    }
}

impl From<OperationId> for ParameterOwner {
    fn from(id: OperationId) -> Self {
        ParameterOwner::Operation(id)
    }
}

impl From<ParameterOwner> for NodeRef {
    fn from(owner: ParameterOwner) -> Self {
        match owner {
            ParameterOwner::PathItem(id) => id.into(),
            ParameterOwner::Operation(id) => id.into(),
        }
    }
}

impl Document {
    pub(crate) fn parameter_list(&self, owner: ParameterOwner) -> &Vec<ParameterId> {
        match owner {
            ParameterOwner::PathItem(id) => &self[id].parameters,
            ParameterOwner::Operation(id) => &self[id].parameters,
        }
    }

    fn parameter_list_mut(&mut self, owner: ParameterOwner) -> &mut Vec<ParameterId> {
        match owner {
            ParameterOwner::PathItem(id) => &mut self[id].parameters,
            ParameterOwner::Operation(id) => &mut self[id].parameters,
        }
    }

    fn ensure_unique_parameter(
        &self,
        owner: ParameterOwner,
        name: &str,
        location: ParameterLocation,
        except: Option<ParameterId>,
    ) -> Result<()> {
        let clash = self
            .parameter_list(owner)
            .iter()
            .filter(|id| Some(**id) != except)
            .filter_map(|id| self.get(*id))
            .any(|p| p.name == name && p.location() == location);
        if clash {
            return Err(OpenApiError::duplicate_key(
                "parameter list",
                &format!("{} {}", location, name),
            ));
        }
        Ok(())
    }

    /// Appends a new inline parameter to a path item or operation.
    pub fn add_parameter(
        &mut self,
        owner: impl Into<ParameterOwner>,
        name: impl Into<String>,
        location: ParameterLocation,
    ) -> Result<ParameterId> {
        let owner = owner.into();
        let name = name.into();
        self.ensure_unique_parameter(owner, &name, location, None)?;
        let id = self.nodes.alloc(Parameter::new(owner.into(), name, location));
        self.parameter_list_mut(owner).push(id);
        Ok(id)
    }

    /// Appends a reference to a parameter registered in the components section.
    pub fn add_parameter_ref(
        &mut self,
        owner: impl Into<ParameterOwner>,
        shared: ParameterId,
    ) -> Result<()> {
        let owner = owner.into();
        self.ensure_shared(shared)?;
        let (name, location) = {
            let p = &self[shared];
            (p.name.clone(), p.location())
        };
        self.ensure_unique_parameter(owner, &name, location, None)?;
        self.parameter_list_mut(owner).push(shared);
        Ok(())
    }

    pub fn remove_parameter(&mut self, owner: impl Into<ParameterOwner>, index: usize) -> Result<ParameterId> {
        let owner = owner.into();
        let list = self.parameter_list_mut(owner);
        if index >= list.len() {
            return Err(OpenApiError::invariant(format!(
                "parameter index {} out of range ({} parameters)",
                index,
                list.len()
            )));
        }
        let id = list.remove(index);
        self.release(owner.into(), id.into());
        Ok(id)
    }

    pub fn parameters(&self, owner: impl Into<ParameterOwner>) -> &[ParameterId] {
        self.parameter_list(owner.into())
    }

    /// Renames a parameter. Fails if the new `(name, in)` pair is already taken in any
    /// path item or operation list that holds the parameter.
    pub fn rename_parameter(&mut self, id: ParameterId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let location = self[id].location();
        for holder in self.usages(id) {
            let owner = match holder {
                NodeRef::PathItem(item) => ParameterOwner::PathItem(item),
                NodeRef::Operation(op) => ParameterOwner::Operation(op),
                _ => continue,
            };
            self.ensure_unique_parameter(owner, &name, location, Some(id))?;
        }
        self[id].name = name;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn operation() -> (Document, OperationId) {
        let mut doc = Document::new("Test", "1.0.0");
        let item = doc.add_path_item("/pets/{id}").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        (doc, op)
    }

    #[test]
    fn test_query_parameter_defaults_to_exploded_form() {
        let (mut doc, op) = operation();
        let id = doc.add_parameter(op, "filter", ParameterLocation::Query).unwrap();
        let param = &doc[id];
        assert_eq!(param.style(), ParameterStyle::Form);
        assert!(param.explode());
        assert!(!param.required());
        assert_eq!(param.query_options(), Some(&QueryOptions::default()));
    }

    #[test]
    fn test_path_parameter_is_required_simple() {
        let (mut doc, op) = operation();
        let id = doc.add_parameter(op, "id", ParameterLocation::Path).unwrap();
        let param = &mut doc[id];
        assert!(param.required());
        assert_eq!(param.style(), ParameterStyle::Simple);
        assert!(!param.explode());
        assert!(param.set_required(false).is_err());
        assert!(param.required());
        param.set_style(ParameterStyle::Label).unwrap();
        assert!(param.set_style(ParameterStyle::Form).is_err());
    }

    #[test]
    fn test_header_parameter_only_allows_simple() {
        let (mut doc, op) = operation();
        let id = doc.add_parameter(op, "X-Trace", ParameterLocation::Header).unwrap();
        for style in [
            ParameterStyle::Form,
            ParameterStyle::Matrix,
            ParameterStyle::Label,
            ParameterStyle::DeepObject,
        ] {
            let err = doc[id].set_style(style).unwrap_err();
            assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        }
        doc[id].set_style(ParameterStyle::Simple).unwrap();
    }

    #[test]
    fn test_explode_follows_style_until_set() {
        let (mut doc, op) = operation();
        let id = doc.add_parameter(op, "tags", ParameterLocation::Query).unwrap();
        let param = &mut doc[id];
        param.set_style(ParameterStyle::PipeDelimited).unwrap();
        assert!(!param.explode());
        param.set_explode(Some(true));
        param.set_style(ParameterStyle::SpaceDelimited).unwrap();
        assert!(param.explode());
    }

    #[test]
    fn test_duplicate_name_and_location_rejected() {
        let (mut doc, op) = operation();
        doc.add_parameter(op, "id", ParameterLocation::Query).unwrap();
        assert!(doc.add_parameter(op, "id", ParameterLocation::Query).is_err());
        doc.add_parameter(op, "id", ParameterLocation::Header).unwrap();
        assert_eq!(doc.parameters(op).len(), 2);
    }

    #[test]
    fn test_rename_keeps_name_and_location_unique() {
        let (mut doc, op) = operation();
        doc.add_parameter(op, "limit", ParameterLocation::Query).unwrap();
        let offset = doc.add_parameter(op, "offset", ParameterLocation::Query).unwrap();
        let trace = doc.add_parameter(op, "offset", ParameterLocation::Header).unwrap();

        let err = doc.rename_parameter(offset, "limit").unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        assert_eq!(doc[offset].name(), "offset");

        doc.rename_parameter(offset, "offset").unwrap();
        doc.rename_parameter(offset, "page").unwrap();
        doc.rename_parameter(trace, "limit").unwrap();
        assert_eq!(doc[offset].name(), "page");

        let shared = doc.add_component_parameter("Sort", "sort", ParameterLocation::Query).unwrap();
        doc.add_parameter_ref(op, shared).unwrap();
        assert!(doc.rename_parameter(shared, "page").is_err());
        doc.rename_parameter(shared, "order").unwrap();
        assert_eq!(doc[shared].name(), "order");
    }

    #[test]
    fn test_parameter_refs_are_unlinked_not_freed() {
        let (mut doc, op) = operation();
        let shared = doc.add_component_parameter("Limit", "limit", ParameterLocation::Query).unwrap();
        doc.add_parameter_ref(op, shared).unwrap();
        assert!(doc.add_parameter_ref(op, shared).is_err());

        let inline = doc.add_parameter(op, "offset", ParameterLocation::Query).unwrap();
        assert_eq!(doc.remove_parameter(op, 0).unwrap(), shared);
        assert!(doc.get(shared).is_some());
        assert_eq!(doc.remove_parameter(op, 0).unwrap(), inline);
        assert!(doc.get(inline).is_none());
        assert!(doc.remove_parameter(op, 0).is_err());
    }

    #[test]
    fn test_location_and_style_parse() {
        assert_eq!(ParameterLocation::from_str("cookie").unwrap(), ParameterLocation::Cookie);
        assert!(ParameterLocation::from_str("body").is_err());
        assert_eq!(
            ParameterStyle::from_str("deepObject").unwrap(),
            ParameterStyle::DeepObject
        );
        assert!(ParameterStyle::from_str("tabDelimited").is_err());
    }
}
