//! The Schema Object: the JSON-Schema-like validation vocabulary of OpenAPI 3.0.x.

use crate::error::{OpenApiError, Result};
use crate::model::Document;
use crate::model::extensions::{Extensions, impl_extensible};
use crate::model::info::ExternalDocumentation;
use crate::model::node::{NodeRef, SchemaId, Slots, impl_owned_node};
use crate::types::SchemaType;
use indexmap::{IndexMap, IndexSet};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::str::FromStr;

/// The `additionalProperties` keyword: either a plain switch or a schema for extra keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(SchemaId),
}

impl Default for AdditionalProperties {
    fn default() -> Self {
        AdditionalProperties::Allowed(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    property_name: String,
    mapping: IndexMap<String, String>,
    pub extensions: Extensions,
}

impl Discriminator {
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Maps a discriminator value to a schema name or reference.
    pub fn add_mapping(&mut self, value: impl Into<String>, schema: impl Into<String>) -> Result<()> {
        let value = value.into();
        if self.mapping.contains_key(&value) {
            return Err(OpenApiError::duplicate_key("discriminator mapping", &value));
        }
        self.mapping.insert(value, schema.into());
        Ok(())
    }

    pub fn delete_mapping(&mut self, value: &str) -> Option<String> {
        self.mapping.shift_remove(value)
    }

    pub fn mapping(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn mapping_for(&self, value: &str) -> Option<&str> {
        self.mapping.get(value).map(String::as_str)
    }

    pub fn clear_mapping(&mut self) {
        self.mapping.clear()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Xml {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub attribute: bool,
    pub wrapped: bool,
    pub extensions: Extensions,
}

/// Typed construction options for a new schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaOptions {
    pub schema_type: Option<SchemaType>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    pub allowed_values: Vec<Value>,
    pub default: Option<Value>,
}

/// How a new schema starts out.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaInit {
    /// `{}`: accepts anything.
    Empty,
    /// The canonical null schema: no `type`, `enum: [null]`.
    Null,
    Typed {
        schema_type: SchemaType,
        format: Option<String>,
    },
    Options(SchemaOptions),
}

impl FromStr for SchemaInit {
    type Err = OpenApiError;

    /// Expands a primitive token such as `int32` or `date-time` into `(type, format)`.
    fn from_str(token: &str) -> Result<Self> {
        let (schema_type, format) = match token {
            "null" => return Ok(SchemaInit::Null),
            "boolean" => (SchemaType::Boolean, None),
            "integer" => (SchemaType::Integer, None),
            "int32" | "int64" => (SchemaType::Integer, Some(token)),
            "number" => (SchemaType::Number, None),
            "float" | "double" => (SchemaType::Number, Some(token)),
            "string" => (SchemaType::String, None),
            "date" | "date-time" | "password" | "byte" | "binary" => {
                (SchemaType::String, Some(token))
            }
            "object" => (SchemaType::Object, None),
            "array" => (SchemaType::Array, None),
            other => {
                return Err(OpenApiError::invariant(format!(
                    "unknown schema type token '{}'",
                    other
                )));
            }
        };
        Ok(SchemaInit::Typed {
            schema_type,
            format: format.map(str::to_owned),
        })
    }
}

impl From<SchemaType> for SchemaInit {
    fn from(schema_type: SchemaType) -> Self {
        SchemaInit::Typed {
            schema_type,
            format: None,
        }
    }
}

impl From<SchemaOptions> for SchemaInit {
    fn from(options: SchemaOptions) -> Self {
        SchemaInit::Options(options)
    }
}

/// Where a schema slot gets its value from: a freshly created, exclusively owned schema,
/// or a schema already registered in the components section.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    New(SchemaInit),
    Shared(SchemaId),
}

impl From<SchemaInit> for SchemaSource {
    fn from(init: SchemaInit) -> Self {
        SchemaSource::New(init)
    }
}

impl From<SchemaType> for SchemaSource {
    fn from(schema_type: SchemaType) -> Self {
        SchemaSource::New(schema_type.into())
    }
}

impl From<SchemaOptions> for SchemaSource {
    fn from(options: SchemaOptions) -> Self {
        SchemaSource::New(options.into())
    }
}

impl From<SchemaId> for SchemaSource {
    fn from(id: SchemaId) -> Self {
        SchemaSource::Shared(id)
    }
}

/// The schema-valued positions inside a Schema Object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSlot {
    Property(String),
    Items,
    AdditionalProperties,
    AllOf,
    OneOf,
    AnyOf,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,

    pub title: Option<String>,
    pub description: Option<String>,
    pub schema_type: Option<SchemaType>,
    pub format: Option<String>,

    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub deprecated: bool,

    pub multiple_of: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_maximum: bool,
    pub minimum: Option<Number>,
    pub exclusive_minimum: bool,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: bool,
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,

    required: IndexSet<String>,
    allowed_values: Vec<Value>,
    default: Option<Value>,
    pub example: Option<Value>,

    pub(crate) properties: IndexMap<String, SchemaId>,
    pub(crate) items: Option<SchemaId>,
    pub(crate) additional_properties: AdditionalProperties,
    pub(crate) all_of: Vec<SchemaId>,
    pub(crate) one_of: Vec<SchemaId>,
    pub(crate) any_of: Vec<SchemaId>,
    pub(crate) not: Option<SchemaId>,

    discriminator: Option<Discriminator>,
    pub xml: Option<Xml>,
    pub external_docs: Option<ExternalDocumentation>,
}

impl_owned_node!(Schema);
impl_extensible!(Xml, Discriminator);

impl Schema {
    pub(crate) fn blank(parent: NodeRef) -> Self {
        Self {
            parent,
            extensions: Extensions::new(),
            title: None,
            description: None,
            schema_type: None,
            format: None,
            nullable: false,
            read_only: false,
            write_only: false,
            deprecated: false,
            multiple_of: None,
            maximum: None,
            exclusive_maximum: false,
            minimum: None,
            exclusive_minimum: false,
            max_length: None,
            min_length: None,
            pattern: None,
            max_items: None,
            min_items: None,
            unique_items: false,
            max_properties: None,
            min_properties: None,
            required: IndexSet::new(),
            allowed_values: Vec::new(),
            default: None,
            example: None,
            properties: IndexMap::new(),
            items: None,
            additional_properties: AdditionalProperties::default(),
            all_of: Vec::new(),
            one_of: Vec::new(),
            any_of: Vec::new(),
            not: None,
            discriminator: None,
            xml: None,
            external_docs: None,
        }
    }

    pub(crate) fn create(parent: NodeRef, init: SchemaInit) -> Result<Self> {
        let mut schema = Self::blank(parent);
        match init {
            SchemaInit::Empty => {}
            SchemaInit::Null => schema.allowed_values.push(Value::Null),
            SchemaInit::Typed {
                schema_type,
                format,
            } => {
                schema.schema_type = Some(schema_type);
                schema.format = format;
            }
            SchemaInit::Options(options) => {
                schema.schema_type = options.schema_type;
                schema.format = options.format;
                schema.title = options.title;
                schema.description = options.description;
                schema.nullable = options.nullable;
                schema.set_allowed_values(options.allowed_values)?;
                schema.set_default(options.default)?;
            }
        }
        Ok(schema)
    }

    pub fn is_composite(&self) -> bool {
        !self.all_of.is_empty() || !self.one_of.is_empty() || !self.any_of.is_empty()
    }

    /// `type` absent and `enum` exactly `[null]`.
    pub fn is_null_singleton(&self) -> bool {
        self.schema_type.is_none() && self.allowed_values == [Value::Null]
    }

    pub fn allowed_values(&self) -> &[Value] {
        &self.allowed_values
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Sets or clears `default`. When an `enum` is present the value must be one of it.
    pub fn set_default(&mut self, value: Option<Value>) -> Result<()> {
        if let Some(value) = &value {
            if !self.allowed_values.is_empty() && !self.allowed_values.contains(value) {
                return Err(OpenApiError::invariant(format!(
                    "default {} is not one of the allowed values {}",
                    value,
                    Value::Array(self.allowed_values.clone())
                )));
            }
        }
        self.default = value;
        Ok(())
    }

    /// Replaces `enum`, dropping deep-equal duplicates while keeping first occurrences.
    pub fn set_allowed_values(&mut self, values: impl IntoIterator<Item = Value>) -> Result<()> {
        let mut deduped: Vec<Value> = Vec::new();
        for value in values {
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }
        if let Some(default) = &self.default {
            if !deduped.is_empty() && !deduped.contains(default) {
                return Err(OpenApiError::invariant(format!(
                    "default {} is not one of the allowed values {}",
                    default,
                    Value::Array(deduped)
                )));
            }
        }
        self.allowed_values = deduped;
        Ok(())
    }

    /// Appends a value to `enum` unless a deep-equal one is already present.
    pub fn add_allowed_value(&mut self, value: Value) -> Result<()> {
        if self.allowed_values.contains(&value) {
            return Ok(());
        }
        if let Some(default) = &self.default {
            if self.allowed_values.is_empty() && *default != value {
                return Err(OpenApiError::invariant(format!(
                    "default {} would not be an allowed value",
                    default
                )));
            }
        }
        self.allowed_values.push(value);
        Ok(())
    }

    pub fn delete_allowed_value(&mut self, value: &Value) -> Result<bool> {
        let Some(index) = self.allowed_values.iter().position(|v| v == value) else {
            return Ok(false);
        };
        if self.allowed_values.len() > 1 && self.default.as_ref() == Some(value) {
            return Err(OpenApiError::invariant(format!(
                "cannot remove {} from enum while it is the default",
                value
            )));
        }
        self.allowed_values.remove(index);
        Ok(true)
    }

    pub fn clear_allowed_values(&mut self) {
        self.allowed_values.clear()
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    pub fn set_required(&mut self, name: impl Into<String>, required: bool) {
        let name = name.into();
        if required {
            self.required.insert(name);
        } else {
            self.required.shift_remove(&name);
        }
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, SchemaId)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn property(&self, name: &str) -> Option<SchemaId> {
        self.properties.get(name).copied()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn items(&self) -> Option<SchemaId> {
        self.items
    }

    pub fn additional_properties(&self) -> AdditionalProperties {
        self.additional_properties
    }

    pub fn all_of(&self) -> &[SchemaId] {
        &self.all_of
    }

    pub fn one_of(&self) -> &[SchemaId] {
        &self.one_of
    }

    pub fn any_of(&self) -> &[SchemaId] {
        &self.any_of
    }

    pub fn not(&self) -> Option<SchemaId> {
        self.not
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn discriminator_mut(&mut self) -> Option<&mut Discriminator> {
        self.discriminator.as_mut()
    }

    /// Declares `property_name` as the discriminator. It must already be one of this
    /// schema's own properties. An existing mapping is kept.
    pub fn set_discriminator(&mut self, property_name: impl Into<String>) -> Result<&mut Discriminator> {
        let property_name = property_name.into();
        if !self.properties.contains_key(&property_name) {
            return Err(OpenApiError::invariant(format!(
                "discriminator property '{}' is not a property of the schema",
                property_name
            )));
        }
        let (mapping, extensions) = self
            .discriminator
            .take()
            .map(|d| (d.mapping, d.extensions))
            .unwrap_or_default();
        Ok(self.discriminator.insert(Discriminator {
            property_name,
            mapping,
            extensions,
        }))
    }

    pub fn clear_discriminator(&mut self) -> Option<Discriminator> {
        self.discriminator.take()
    }

    /// Every schema handle this node holds, with the pointer segments leading to it.
    pub(crate) fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        slots.keyed(&["properties"], &self.properties);
        slots.optional(&["items"], self.items);
        if let AdditionalProperties::Schema(id) = self.additional_properties {
            slots.one(&["additionalProperties"], id);
        }
        slots.listed(&["allOf"], &self.all_of);
        slots.listed(&["oneOf"], &self.one_of);
        slots.listed(&["anyOf"], &self.any_of);
        slots.optional(&["not"], self.not);
        slots
    }
}

impl Document {
    /// Creates a new schema owned by `parent`, or checks that a shared one may be used.
    pub(crate) fn resolve_schema_source(
        &mut self,
        parent: NodeRef,
        source: SchemaSource,
    ) -> Result<SchemaId> {
        match source {
            SchemaSource::New(init) => {
                let schema = Schema::create(parent, init)?;
                Ok(self.nodes.alloc(schema))
            }
            SchemaSource::Shared(id) => {
                self.ensure_shared(id)?;
                Ok(id)
            }
        }
    }

    /// Fills a schema-valued position of `schema`. Returns the handle now stored there.
    ///
    /// Single-valued slots (`items`, `additionalProperties`, `not`) replace and release
    /// their previous occupant; list slots append; `Property` fails on a duplicate name.
    pub fn set_subschema(
        &mut self,
        schema: SchemaId,
        slot: SchemaSlot,
        source: impl Into<SchemaSource>,
    ) -> Result<SchemaId> {
        let source = source.into();
        let owner = NodeRef::Schema(schema);
        if let SchemaSlot::Property(name) = &slot {
            if self[schema].properties.contains_key(name) {
                return Err(OpenApiError::duplicate_key("schema properties", name));
            }
        }
        let child = self.resolve_schema_source(owner, source)?;
        let node = &mut self[schema];
        let replaced = match slot {
            SchemaSlot::Property(name) => {
                node.properties.insert(name, child);
                None
            }
            SchemaSlot::Items => node.items.replace(child),
            SchemaSlot::AdditionalProperties => {
                match std::mem::replace(
                    &mut node.additional_properties,
                    AdditionalProperties::Schema(child),
                ) {
                    AdditionalProperties::Schema(previous) => Some(previous),
                    AdditionalProperties::Allowed(_) => None,
                }
            }
            SchemaSlot::AllOf => {
                node.all_of.push(child);
                None
            }
            SchemaSlot::OneOf => {
                node.one_of.push(child);
                None
            }
            SchemaSlot::AnyOf => {
                node.any_of.push(child);
                None
            }
            SchemaSlot::Not => node.not.replace(child),
        };
        if let Some(previous) = replaced {
            if previous != child {
                self.release(owner, previous.into());
            }
        }
        Ok(child)
    }

    pub fn add_property(
        &mut self,
        schema: SchemaId,
        name: impl Into<String>,
        source: impl Into<SchemaSource>,
    ) -> Result<SchemaId> {
        self.set_subschema(schema, SchemaSlot::Property(name.into()), source)
    }

    pub fn add_all_of(&mut self, schema: SchemaId, source: impl Into<SchemaSource>) -> Result<SchemaId> {
        self.set_subschema(schema, SchemaSlot::AllOf, source)
    }

    pub fn add_one_of(&mut self, schema: SchemaId, source: impl Into<SchemaSource>) -> Result<SchemaId> {
        self.set_subschema(schema, SchemaSlot::OneOf, source)
    }

    pub fn add_any_of(&mut self, schema: SchemaId, source: impl Into<SchemaSource>) -> Result<SchemaId> {
        self.set_subschema(schema, SchemaSlot::AnyOf, source)
    }

    pub fn set_items(&mut self, schema: SchemaId, source: impl Into<SchemaSource>) -> Result<SchemaId> {
        self.set_subschema(schema, SchemaSlot::Items, source)
    }

    pub fn set_not(&mut self, schema: SchemaId, source: impl Into<SchemaSource>) -> Result<SchemaId> {
        self.set_subschema(schema, SchemaSlot::Not, source)
    }

    /// Sets `additionalProperties` to a plain boolean, releasing a previous schema.
    pub fn set_additional_properties(&mut self, schema: SchemaId, allowed: bool) {
        let previous = std::mem::replace(
            &mut self[schema].additional_properties,
            AdditionalProperties::Allowed(allowed),
        );
        if let AdditionalProperties::Schema(previous) = previous {
            self.release(schema.into(), previous.into());
        }
    }

    /// Removes a property. Fails while the property is named by the discriminator.
    pub fn delete_property(&mut self, schema: SchemaId, name: &str) -> Result<bool> {
        let node = &mut self[schema];
        if node
            .discriminator
            .as_ref()
            .is_some_and(|d| d.property_name == name)
        {
            return Err(OpenApiError::invariant(format!(
                "property '{}' is used by the discriminator",
                name
            )));
        }
        let Some(child) = node.properties.shift_remove(name) else {
            return Ok(false);
        };
        self.release(schema.into(), child.into());
        Ok(true)
    }

    pub fn clear_items(&mut self, schema: SchemaId) {
        if let Some(child) = self[schema].items.take() {
            self.release(schema.into(), child.into());
        }
    }

    pub fn clear_not(&mut self, schema: SchemaId) {
        if let Some(child) = self[schema].not.take() {
            self.release(schema.into(), child.into());
        }
    }

    /// Removes the branch at `index` of `allOf`, `oneOf` or `anyOf`.
    pub fn remove_composition_branch(
        &mut self,
        schema: SchemaId,
        slot: SchemaSlot,
        index: usize,
    ) -> Result<SchemaId> {
        let node = &mut self[schema];
        let list = match slot {
            SchemaSlot::AllOf => &mut node.all_of,
            SchemaSlot::OneOf => &mut node.one_of,
            SchemaSlot::AnyOf => &mut node.any_of,
            other => {
                return Err(OpenApiError::invariant(format!(
                    "{:?} is not a composition keyword",
                    other
                )));
            }
        };
        if index >= list.len() {
            return Err(OpenApiError::invariant(format!(
                "composition index {} out of range ({} branches)",
                index,
                list.len()
            )));
        }
        let child = list.remove(index);
        self.release(schema.into(), child.into());
        Ok(child)
    }

    /// Whether `null` is an acceptable instance of the schema.
    ///
    /// True when the schema is `nullable`, is the null singleton, or any of its own
    /// `oneOf`/`anyOf` branches admits `null`. The schema's own `allOf` operands are not
    /// consulted: one nullable operand does not make the intersection nullable. Branches
    /// reached through `oneOf`/`anyOf` are inspected in full, `allOf` included.
    pub fn is_nullish(&self, schema: SchemaId) -> bool {
        let mut visited = HashSet::new();
        let Some(node) = self.get(schema) else {
            return false;
        };
        visited.insert(schema);
        if node.nullable || node.is_null_singleton() {
            return true;
        }
        node.one_of
            .iter()
            .chain(node.any_of.iter())
            .any(|branch| self.admits_null(*branch, &mut visited))
    }

    fn admits_null(&self, schema: SchemaId, visited: &mut HashSet<SchemaId>) -> bool {
        if !visited.insert(schema) {
            return false;
        }
        let Some(node) = self.get(schema) else {
            return false;
        };
        if node.nullable || node.is_null_singleton() {
            return true;
        }
        node.one_of
            .iter()
            .chain(node.any_of.iter())
            .chain(node.all_of.iter())
            .any(|branch| self.admits_null(*branch, visited))
    }

    /// Looks a property up on an object schema, then on each `allOf` branch's own
    /// properties, one level deep.
    pub fn get_property_deep(&self, schema: SchemaId, name: &str) -> Option<SchemaId> {
        let node = self.get(schema)?;
        if node.schema_type == Some(SchemaType::Object) {
            if let Some(found) = node.properties.get(name) {
                return Some(*found);
            }
        }
        node.all_of
            .iter()
            .filter_map(|branch| self.get(*branch))
            .find_map(|branch| branch.properties.get(name).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_schema(init: SchemaInit) -> (Document, SchemaId) {
        let mut doc = Document::new("Test", "1.0.0");
        let id = doc.add_schema("Subject", init).unwrap();
        (doc, id)
    }

    #[test]
    fn test_token_expansion() {
        assert_eq!(
            SchemaInit::from_str("int32").unwrap(),
            SchemaInit::Typed {
                schema_type: SchemaType::Integer,
                format: Some("int32".into())
            }
        );
        assert_eq!(
            SchemaInit::from_str("date-time").unwrap(),
            SchemaInit::Typed {
                schema_type: SchemaType::String,
                format: Some("date-time".into())
            }
        );
        assert_eq!(SchemaInit::from_str("null").unwrap(), SchemaInit::Null);
        assert!(SchemaInit::from_str("uuid").is_err());
    }

    #[test]
    fn test_boolean_enum_rejects_foreign_default() {
        let (mut doc, id) = doc_with_schema(SchemaType::Boolean.into());
        let schema = &mut doc[id];
        schema.set_allowed_values([json!(false)]).unwrap();
        let err = schema.set_default(Some(json!(true))).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));

        schema.set_default(Some(json!(false))).unwrap();
        assert_eq!(schema.allowed_values(), &[json!(false)]);
    }

    #[test]
    fn test_options_apply_enum_before_default() {
        let options = SchemaOptions {
            schema_type: Some(SchemaType::Boolean),
            allowed_values: vec![json!(false)],
            default: Some(json!(true)),
            ..SchemaOptions::default()
        };
        let mut doc = Document::new("Test", "1.0.0");
        assert!(doc.add_schema("Flag", options.into()).is_err());
        assert!(doc.components().schema("Flag").is_none());
    }

    #[test]
    fn test_enum_deduplicates_by_deep_equality() {
        let (mut doc, id) = doc_with_schema(SchemaInit::Empty);
        let schema = &mut doc[id];
        schema
            .set_allowed_values([json!({"a": 1}), json!("x"), json!({"a": 1})])
            .unwrap();
        schema.add_allowed_value(json!("x")).unwrap();
        assert_eq!(schema.allowed_values(), &[json!({"a": 1}), json!("x")]);
    }

    #[test]
    fn test_enum_cannot_drop_the_default() {
        let (mut doc, id) = doc_with_schema(SchemaType::String.into());
        let schema = &mut doc[id];
        schema.set_allowed_values([json!("a"), json!("b")]).unwrap();
        schema.set_default(Some(json!("a"))).unwrap();
        assert!(schema.delete_allowed_value(&json!("a")).is_err());
        assert!(schema.delete_allowed_value(&json!("b")).unwrap());
        assert!(schema.set_allowed_values([json!("c")]).is_err());
        assert!(schema.add_allowed_value(json!("c")).is_ok());
    }

    #[test]
    fn test_discriminator_requires_own_property() {
        let (mut doc, id) = doc_with_schema(SchemaType::Object.into());
        assert!(doc[id].set_discriminator("kind").is_err());

        doc.add_property(id, "kind", SchemaType::String).unwrap();
        let discriminator = doc[id].set_discriminator("kind").unwrap();
        discriminator.add_mapping("dog", "#/components/schemas/Dog").unwrap();
        discriminator.add_mapping("cat", "#/components/schemas/Cat").unwrap();
        discriminator.add_mapping("bird", "#/components/schemas/Bird").unwrap();
        assert!(discriminator.add_mapping("cat", "Cat").is_err());
        assert_eq!(discriminator.delete_mapping("cat").as_deref(), Some("#/components/schemas/Cat"));

        let values: Vec<_> = doc[id].discriminator().unwrap().mapping().map(|(k, _)| k).collect();
        assert_eq!(values, vec!["dog", "bird"]);

        assert!(doc.delete_property(id, "kind").is_err());
        doc[id].clear_discriminator();
        assert!(doc.delete_property(id, "kind").unwrap());
    }

    #[test]
    fn test_is_composite() {
        let (mut doc, id) = doc_with_schema(SchemaInit::Empty);
        assert!(!doc[id].is_composite());
        doc.add_any_of(id, SchemaType::String).unwrap();
        assert!(doc[id].is_composite());
    }

    #[test]
    fn test_is_nullish_through_one_of_branch_intersection() {
        let (mut doc, id) = doc_with_schema(SchemaInit::Empty);
        doc.add_one_of(id, SchemaType::Object).unwrap();
        let branch = doc.add_one_of(id, SchemaInit::Empty).unwrap();
        doc.add_all_of(branch, SchemaType::Array).unwrap();
        let null = doc.add_all_of(branch, SchemaInit::Null).unwrap();
        assert!(doc[null].is_null_singleton());

        assert!(doc.is_nullish(id));
        // the branch on its own only has allOf operands, which it does not consult
        assert!(!doc.is_nullish(branch));
    }

    #[test]
    fn test_is_nullish_direct_flags() {
        let (mut doc, id) = doc_with_schema(SchemaType::String.into());
        assert!(!doc.is_nullish(id));
        doc[id].nullable = true;
        assert!(doc.is_nullish(id));

        let null = doc.add_schema("Null", SchemaInit::Null).unwrap();
        assert!(doc.is_nullish(null));
    }

    #[test]
    fn test_is_nullish_ignores_nullable_all_of_operand() {
        let (mut doc, id) = doc_with_schema(SchemaInit::Empty);
        doc.add_all_of(id, SchemaType::String).unwrap();
        let nullable = doc.add_all_of(id, SchemaInit::Empty).unwrap();
        doc[nullable].nullable = true;
        assert!(!doc.is_nullish(id));
    }

    #[test]
    fn test_is_nullish_terminates_on_recursive_shared_schema() {
        let (mut doc, id) = doc_with_schema(SchemaInit::Empty);
        doc.add_any_of(id, id).unwrap();
        assert!(!doc.is_nullish(id));
        doc.add_any_of(id, SchemaInit::Null).unwrap();
        assert!(doc.is_nullish(id));
    }

    #[test]
    fn test_get_property_deep_checks_own_then_all_of() {
        let (mut doc, id) = doc_with_schema(SchemaType::Object.into());
        let own = doc.add_property(id, "id", SchemaType::String).unwrap();
        let envelope = doc.add_all_of(id, SchemaType::Object).unwrap();
        let attributes = doc.add_property(envelope, "attributes", SchemaType::Object).unwrap();
        let nested = doc.add_all_of(envelope, SchemaType::Object).unwrap();
        doc.add_property(nested, "deep", SchemaType::String).unwrap();

        assert_eq!(doc.get_property_deep(id, "id"), Some(own));
        assert_eq!(doc.get_property_deep(id, "attributes"), Some(attributes));
        assert_eq!(doc.get_property_deep(id, "deep"), None);

        doc[id].schema_type = None;
        assert_eq!(doc.get_property_deep(id, "id"), None);
    }

    #[test]
    fn test_duplicate_property_is_rejected() {
        let (mut doc, id) = doc_with_schema(SchemaType::Object.into());
        doc.add_property(id, "name", SchemaType::String).unwrap();
        let before = doc.node_count();
        assert!(doc.add_property(id, "name", SchemaType::Integer).is_err());
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn test_replacing_items_frees_owned_but_not_shared() {
        let (mut doc, id) = doc_with_schema(SchemaType::Array.into());
        let shared = doc.add_schema("Item", SchemaType::String.into()).unwrap();
        let owned = doc.set_items(id, SchemaType::Integer).unwrap();
        doc.set_items(id, shared).unwrap();
        assert!(doc.get(owned).is_none());

        doc.clear_items(id);
        assert!(doc.get(shared).is_some());
        assert_eq!(doc[id].items(), None);
    }

    #[test]
    fn test_linking_requires_registered_schema() {
        let (mut doc, id) = doc_with_schema(SchemaType::Object.into());
        let inline = doc.add_property(id, "inline", SchemaType::String).unwrap();
        let err = doc.add_property(id, "again", inline).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
    }

    #[test]
    fn test_additional_properties_switch() {
        let (mut doc, id) = doc_with_schema(SchemaType::Object.into());
        assert_eq!(doc[id].additional_properties(), AdditionalProperties::Allowed(true));
        let extra = doc
            .set_subschema(id, SchemaSlot::AdditionalProperties, SchemaType::String)
            .unwrap();
        assert_eq!(doc[id].additional_properties(), AdditionalProperties::Schema(extra));
        doc.set_additional_properties(id, false);
        assert!(doc.get(extra).is_none());
        assert_eq!(doc[id].additional_properties(), AdditionalProperties::Allowed(false));
    }

    #[test]
    fn test_remove_composition_branch() {
        let (mut doc, id) = doc_with_schema(SchemaInit::Empty);
        let a = doc.add_one_of(id, SchemaType::String).unwrap();
        let b = doc.add_one_of(id, SchemaType::Integer).unwrap();
        assert_eq!(doc.remove_composition_branch(id, SchemaSlot::OneOf, 0).unwrap(), a);
        assert_eq!(doc[id].one_of(), &[b]);
        assert!(doc.get(a).is_none());
        assert!(doc.remove_composition_branch(id, SchemaSlot::OneOf, 5).is_err());
        assert!(doc.remove_composition_branch(id, SchemaSlot::Items, 0).is_err());
    }
}
