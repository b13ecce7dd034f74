//! The Components Object: the registry of shared, referenceable nodes.

use crate::error::{OpenApiError, Result};
use crate::model::Document;
use crate::model::content::{Example, Link, RequestBody, Response};
use crate::model::extensions::{Extensions, impl_extensible};
use crate::model::node::{
    Attach, CallbackId, ExampleId, HeaderId, LinkId, NodeId, NodeRef, ParameterId,
    RequestBodyId, ResponseId, SchemaId, SecuritySchemeId,
};
use crate::model::parameter::{Header, Parameter, ParameterLocation};
use crate::model::path::Callback;
use crate::model::schema::{Schema, SchemaInit};
use crate::model::security::{SecurityScheme, SecuritySchemeKind};
use crate::types::JsonPath;
use crate::{COMPONENTS_FIELD, POINTER_PREFIX};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The registries of the components section, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Schemas,
    Responses,
    Parameters,
    Examples,
    RequestBodies,
    Headers,
    SecuritySchemes,
    Links,
    Callbacks,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::Schemas,
        ComponentKind::Responses,
        ComponentKind::Parameters,
        ComponentKind::Examples,
        ComponentKind::RequestBodies,
        ComponentKind::Headers,
        ComponentKind::SecuritySchemes,
        ComponentKind::Links,
        ComponentKind::Callbacks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Schemas => "schemas",
            ComponentKind::Responses => "responses",
            ComponentKind::Parameters => "parameters",
            ComponentKind::Examples => "examples",
            ComponentKind::RequestBodies => "requestBodies",
            ComponentKind::Headers => "headers",
            ComponentKind::SecuritySchemes => "securitySchemes",
            ComponentKind::Links => "links",
            ComponentKind::Callbacks => "callbacks",
        }
    }

    /// Canonical pointer of the entry `key` in this registry.
    pub fn pointer(&self, key: &str) -> String {
        let mut path = JsonPath::new();
        path.add(COMPONENTS_FIELD).add(self.as_str()).add(key);
        path.to_pointer()
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OpenApiError::invariant(format!("'{}' is not a components section", s)))
    }
}

/// Splits `#/components/<kind>/<key>` into its parts, unescaping the key.
pub fn parse_component_pointer(pointer: &str) -> Option<(ComponentKind, String)> {
    let rest = pointer.strip_prefix(POINTER_PREFIX)?;
    let mut segments = rest.splitn(3, '/');
    if segments.next()? != COMPONENTS_FIELD {
        return None;
    }
    let kind = ComponentKind::from_str(segments.next()?).ok()?;
    let key = segments.next()?;
    if key.is_empty() || key.contains('/') {
        return None;
    }
    Some((kind, JsonPath::decode_segment(key)))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    pub(crate) schemas: IndexMap<String, SchemaId>,
    pub(crate) responses: IndexMap<String, ResponseId>,
    pub(crate) parameters: IndexMap<String, ParameterId>,
    pub(crate) examples: IndexMap<String, ExampleId>,
    pub(crate) request_bodies: IndexMap<String, RequestBodyId>,
    pub(crate) headers: IndexMap<String, HeaderId>,
    pub(crate) security_schemes: IndexMap<String, SecuritySchemeId>,
    pub(crate) links: IndexMap<String, LinkId>,
    pub(crate) callbacks: IndexMap<String, CallbackId>,
    /// Keys registered through [`Document::add_component_alias`]; they are written as a
    /// `$ref` to the node's original key.
    pub(crate) aliases: HashSet<(ComponentKind, String)>,
    pub extensions: Extensions,
}

impl_extensible!(Components);

/// A handle kind that has a registry in the components section.
pub trait ComponentId: NodeId {
    const KIND: ComponentKind;

    #[doc(hidden)]
    fn registry(components: &Components) -> &IndexMap<String, Self>;
    #[doc(hidden)]
    fn registry_mut(components: &mut Components) -> &mut IndexMap<String, Self>;
}

macro_rules! component_ids {
    ($($id:ty => $kind:ident, $field:ident, $getter:ident;)*) => {
        $(
            impl ComponentId for $id {
                const KIND: ComponentKind = ComponentKind::$kind;

                fn registry(components: &Components) -> &IndexMap<String, Self> {
                    &components.$field
                }

                fn registry_mut(components: &mut Components) -> &mut IndexMap<String, Self> {
                    &mut components.$field
                }
            }
        )*

        impl Components {
            $(
                pub fn $getter(&self, key: &str) -> Option<$id> {
                    self.$field.get(key).copied()
                }

                pub fn $field(&self) -> impl Iterator<Item = (&str, $id)> {
                    self.$field.iter().map(|(k, v)| (k.as_str(), *v))
                }
            )*

            pub fn is_empty(&self) -> bool {
                $(self.$field.is_empty() &&)* self.extensions.is_empty()
            }

            /// Every registry entry as `(kind, key, node)`, registries in document order.
            pub(crate) fn entries(&self) -> Vec<(ComponentKind, &str, NodeRef)> {
                let mut entries = Vec::new();
                $(
                    entries.extend(
                        self.$field
                            .iter()
                            .map(|(k, v)| (ComponentKind::$kind, k.as_str(), NodeRef::from(*v))),
                    );
                )*
                entries
            }

            pub(crate) fn len_of(&self, kind: ComponentKind) -> usize {
                match kind {
                    $(ComponentKind::$kind => self.$field.len(),)*
                }
            }
        }
    };
}

component_ids! {
    SchemaId => Schemas, schemas, schema;
    ResponseId => Responses, responses, response;
    ParameterId => Parameters, parameters, parameter;
    ExampleId => Examples, examples, example;
    RequestBodyId => RequestBodies, request_bodies, request_body;
    HeaderId => Headers, headers, header;
    SecuritySchemeId => SecuritySchemes, security_schemes, security_scheme;
    LinkId => Links, links, link;
    CallbackId => Callbacks, callbacks, callback;
}

impl Components {
    pub fn get<I: ComponentId>(&self, key: &str) -> Option<I> {
        I::registry(self).get(key).copied()
    }

    /// The original, non-alias key under which `id` is registered.
    pub fn key_of<'a, I: ComponentId + 'a>(&'a self, id: I) -> Option<&'a str> {
        I::registry(self)
            .iter()
            .find(|(k, v)| **v == id && !self.is_alias(I::KIND, k))
            .map(|(k, _)| k.as_str())
    }

    pub fn is_alias(&self, kind: ComponentKind, key: &str) -> bool {
        self.aliases.contains(&(kind, key.to_string()))
    }
}

impl Document {
    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn components_extensions_mut(&mut self) -> &mut Extensions {
        &mut self.components.extensions
    }

    pub(crate) fn register<I: ComponentId>(&mut self, key: String, child: Attach<I>) -> Result<I> {
        self.attach(I::KIND.as_str(), key, child, |doc| {
            Ok(I::registry_mut(&mut doc.components))
        })
    }

    /// Registers an existing shared node under a second key. The entry is written out as
    /// a `$ref` to the first one.
    pub fn add_component_alias<I: ComponentId>(&mut self, key: impl Into<String>, target: I) -> Result<()> {
        let key = key.into();
        self.register(key.clone(), Attach::Shared(target))?;
        self.components.aliases.insert((I::KIND, key));
        Ok(())
    }

    pub fn add_schema(&mut self, key: impl Into<String>, init: SchemaInit) -> Result<SchemaId> {
        let schema = Schema::create(NodeRef::Components, init)?;
        self.register(key.into(), Attach::New(schema))
    }

    pub fn add_component_response(
        &mut self,
        key: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ResponseId> {
        let node = Response::new(NodeRef::Components, description);
        self.register(key.into(), Attach::New(node))
    }

    pub fn add_component_parameter(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        location: ParameterLocation,
    ) -> Result<ParameterId> {
        let node = Parameter::new(NodeRef::Components, name, location);
        self.register(key.into(), Attach::New(node))
    }

    pub fn add_component_example(&mut self, key: impl Into<String>) -> Result<ExampleId> {
        self.register(key.into(), Attach::New(Example::new(NodeRef::Components)))
    }

    pub fn add_component_request_body(&mut self, key: impl Into<String>) -> Result<RequestBodyId> {
        self.register(key.into(), Attach::New(RequestBody::new(NodeRef::Components)))
    }

    pub fn add_component_header(&mut self, key: impl Into<String>) -> Result<HeaderId> {
        self.register(key.into(), Attach::New(Header::new(NodeRef::Components)))
    }

    pub fn add_security_scheme(
        &mut self,
        key: impl Into<String>,
        kind: SecuritySchemeKind,
    ) -> Result<SecuritySchemeId> {
        let node = SecurityScheme::new(NodeRef::Components, kind)?;
        self.register(key.into(), Attach::New(node))
    }

    pub fn add_component_link(&mut self, key: impl Into<String>) -> Result<LinkId> {
        self.register(key.into(), Attach::New(Link::new(NodeRef::Components)))
    }

    pub fn add_component_callback(&mut self, key: impl Into<String>) -> Result<CallbackId> {
        self.register(key.into(), Attach::New(Callback::new(NodeRef::Components)))
    }

    /// Removes a registry entry. Fails while any node outside the components section and
    /// outside the entry's own subtree still refers to the entry's node, unless another
    /// key keeps it registered.
    pub fn remove_component<I: ComponentId>(&mut self, key: &str) -> Result<Option<I>> {
        let Some(id) = I::registry(&self.components).get(key).copied() else {
            return Ok(None);
        };
        let aliased = I::registry(&self.components)
            .iter()
            .any(|(k, v)| *v == id && k != key);
        if !aliased {
            let users: Vec<NodeRef> = self
                .usages(id.into())
                .into_iter()
                .filter(|user| *user != NodeRef::Components && !self.is_within(*user, id.into()))
                .collect();
            if !users.is_empty() {
                return Err(OpenApiError::invariant(format!(
                    "{} is still referenced by {:?}",
                    I::KIND.pointer(key),
                    users
                )));
            }
        }
        I::registry_mut(&mut self.components).shift_remove(key);
        let was_alias = self.components.aliases.remove(&(I::KIND, key.to_string()));
        if !aliased {
            self.release(NodeRef::Components, id.into());
        } else if !was_alias && self.components.key_of(id).is_none() {
            // the original key is gone; the first remaining alias takes its place
            let promoted = I::registry(&self.components)
                .iter()
                .find(|(_, v)| **v == id)
                .map(|(k, _)| k.clone());
            if let Some(promoted) = promoted {
                self.components.aliases.remove(&(I::KIND, promoted));
            }
        }
        Ok(Some(id))
    }

    /// Moves registry entries into `order`; keys not listed keep their relative order at
    /// the end.
    pub(crate) fn reorder_components(&mut self, kind: ComponentKind, order: &[String]) {
        fn reorder<I: Copy>(map: &mut IndexMap<String, I>, order: &[String]) {
            let mut sorted: IndexMap<String, I> = IndexMap::with_capacity(map.len());
            for key in order {
                if let Some(id) = map.shift_remove(key) {
                    sorted.insert(key.clone(), id);
                }
            }
            sorted.extend(map.drain(..));
            *map = sorted;
        }
        let c = &mut self.components;
        match kind {
            ComponentKind::Schemas => reorder(&mut c.schemas, order),
            ComponentKind::Responses => reorder(&mut c.responses, order),
            ComponentKind::Parameters => reorder(&mut c.parameters, order),
            ComponentKind::Examples => reorder(&mut c.examples, order),
            ComponentKind::RequestBodies => reorder(&mut c.request_bodies, order),
            ComponentKind::Headers => reorder(&mut c.headers, order),
            ComponentKind::SecuritySchemes => reorder(&mut c.security_schemes, order),
            ComponentKind::Links => reorder(&mut c.links, order),
            ComponentKind::Callbacks => reorder(&mut c.callbacks, order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaType;
    use http::Method;

    #[test]
    fn test_component_pointers() {
        assert_eq!(
            ComponentKind::RequestBodies.pointer("a/b"),
            "#/components/requestBodies/a~1b"
        );
        assert_eq!(
            parse_component_pointer("#/components/schemas/a~1b"),
            Some((ComponentKind::Schemas, "a/b".to_string()))
        );
        assert_eq!(
            parse_component_pointer("#/components/schemas/Pet%20Store"),
            Some((ComponentKind::Schemas, "Pet Store".to_string()))
        );
        assert_eq!(parse_component_pointer("#/components/widgets/A"), None);
        assert_eq!(parse_component_pointer("#/components/schemas/A/properties/b"), None);
        assert_eq!(parse_component_pointer("#/info"), None);
        assert_eq!(parse_component_pointer("other.yaml#/components/schemas/A"), None);
    }

    #[test]
    fn test_keys_are_unique_per_registry() {
        let mut doc = Document::new("Test", "1.0.0");
        doc.add_schema("Pet", SchemaType::Object.into()).unwrap();
        let err = doc.add_schema("Pet", SchemaType::String.into()).unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        doc.add_component_example("Pet").unwrap();
        assert!(!doc.components().is_empty());
        assert_eq!(doc.components().len_of(ComponentKind::Schemas), 1);
    }

    #[test]
    fn test_referenced_component_cannot_be_removed() {
        let mut doc = Document::new("Test", "1.0.0");
        let pet = doc.add_schema("Pet", SchemaType::Object.into()).unwrap();
        let item = doc.add_path_item("/pets").unwrap();
        let op = doc.add_operation(item, Method::GET).unwrap();
        let response = doc.add_response(op, "200", "OK").unwrap();
        let media = doc.add_media_type(response, "application/json").unwrap();
        doc.set_schema(media, pet).unwrap();

        let err = doc.remove_component::<SchemaId>("Pet").unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));

        doc.clear_schema(media);
        assert_eq!(doc.remove_component::<SchemaId>("Pet").unwrap(), Some(pet));
        assert!(doc.get(pet).is_none());
        assert_eq!(doc.remove_component::<SchemaId>("Pet").unwrap(), None);
    }

    #[test]
    fn test_alias_keeps_node_alive() {
        let mut doc = Document::new("Test", "1.0.0");
        let pet = doc.add_schema("Pet", SchemaType::Object.into()).unwrap();
        doc.add_component_alias("Animal", pet).unwrap();
        assert_eq!(doc.components().schema("Animal"), Some(pet));
        assert_eq!(doc.components().key_of(pet), Some("Pet"));

        assert!(doc.components().is_alias(ComponentKind::Schemas, "Animal"));

        doc.remove_component::<SchemaId>("Pet").unwrap();
        assert!(doc.get(pet).is_some());
        assert_eq!(doc.components().key_of(pet), Some("Animal"));
        assert!(!doc.components().is_alias(ComponentKind::Schemas, "Animal"));
    }

    #[test]
    fn test_reorder_components() {
        let mut doc = Document::new("Test", "1.0.0");
        for key in ["C", "A", "B"] {
            doc.add_schema(key, SchemaInit::Empty).unwrap();
        }
        doc.reorder_components(ComponentKind::Schemas, &["A".to_string(), "B".to_string()]);
        let keys: Vec<_> = doc.components().schemas().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }
}
