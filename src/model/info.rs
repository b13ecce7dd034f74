use crate::error::{OpenApiError, Result};
use crate::model::extensions::{Extensions, impl_extensible};

/// License name that stands for "no license declared"; such a block is not written out.
pub const UNLICENSED: &str = "UNLICENSED";

#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Contact,
    pub license: License,
    pub extensions: Extensions,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            terms_of_service: None,
            contact: Contact::default(),
            license: License::default(),
            extensions: Extensions::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub extensions: Extensions,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.url.is_none() && self.email.is_none() && self.extensions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct License {
    pub name: String,
    pub url: Option<String>,
    pub extensions: Extensions,
}

impl Default for License {
    fn default() -> Self {
        Self {
            name: UNLICENSED.to_string(),
            url: None,
            extensions: Extensions::new(),
        }
    }
}

impl License {
    pub fn is_unlicensed(&self) -> bool {
        self.name == UNLICENSED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalDocumentation {
    pub url: String,
    pub description: Option<String>,
    pub extensions: Extensions,
}

impl ExternalDocumentation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            extensions: Extensions::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    pub description: Option<String>,
    pub external_docs: Option<ExternalDocumentation>,
    pub extensions: Extensions,
}

impl Tag {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_docs: None,
            extensions: Extensions::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered tag list with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn add(&mut self, name: impl Into<String>) -> Result<&mut Tag> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(OpenApiError::duplicate_key("tags", &name));
        }
        self.0.push(Tag::new(name));
        let last = self.0.len() - 1;
        Ok(&mut self.0[last])
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.0.iter().find(|t| t.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tag> {
        self.0.iter_mut().find(|t| t.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        let index = self.0.iter().position(|t| t.name == name)?;
        Some(self.0.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl_extensible!(Info, Contact, License, ExternalDocumentation, Tag);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_info_has_blank_contact_and_unlicensed_license() {
        let info = Info::new("Pets", "1.0.0");
        assert!(info.contact.is_empty());
        assert!(info.license.is_unlicensed());
    }

    #[test]
    fn test_tags_reject_duplicate_names() {
        let mut tags = Tags::default();
        tags.add("pets").unwrap().description = Some("Pet operations".into());
        tags.add("stores").unwrap();
        let err = tags.add("pets").unwrap_err();
        assert!(matches!(err, OpenApiError::InvariantViolation(_)));
        assert_eq!(tags.len(), 2);
        assert_eq!(
            tags.get("pets").unwrap().description.as_deref(),
            Some("Pet operations")
        );
    }

    #[test]
    fn test_tags_remove_keeps_order() {
        let mut tags = Tags::default();
        for name in ["a", "b", "c"] {
            tags.add(name).unwrap();
        }
        assert!(tags.remove("b").is_some());
        assert!(tags.remove("b").is_none());
        let names: Vec<_> = tags.iter().map(Tag::name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
