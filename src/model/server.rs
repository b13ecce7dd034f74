use crate::error::{OpenApiError, Result};
use crate::model::extensions::{Extensions, impl_extensible};
use indexmap::IndexMap;

/// A server URL template. The variable map always has exactly one entry per `{name}`
/// placeholder found in the URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    url: String,
    pub description: Option<String>,
    variables: IndexMap<String, ServerVariable>,
    pub extensions: Extensions,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        let mut server = Self {
            url: String::new(),
            description: None,
            variables: IndexMap::new(),
            extensions: Extensions::new(),
        };
        server.set_url(url);
        server
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replaces the URL template. Variables whose placeholder disappeared are dropped,
    /// new placeholders get a blank variable, retained ones keep their state.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        let names = placeholders(&self.url);
        let mut previous = std::mem::take(&mut self.variables);
        for name in names {
            let variable = previous.shift_remove(&name).unwrap_or_default();
            self.variables.insert(name, variable);
        }
        if !previous.is_empty() {
            log::debug!(
                "Server {} dropped variables {:?}",
                self.url,
                previous.keys().collect::<Vec<_>>()
            );
        }
    }

    pub fn variable(&self, name: &str) -> Option<&ServerVariable> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut ServerVariable> {
        self.variables.get_mut(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &ServerVariable)> {
        self.variables.iter()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

/// Names of the `{name}` placeholders in a URL template, in order of first appearance.
fn placeholders(url: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = url;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerVariable {
    default: String,
    allowed_values: Vec<String>,
    pub description: Option<String>,
    pub extensions: Extensions,
}

impl ServerVariable {
    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn set_default(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if !self.allowed_values.is_empty() && !self.allowed_values.contains(&value) {
            return Err(OpenApiError::invariant(format!(
                "server variable default '{}' is not one of {:?}",
                value, self.allowed_values
            )));
        }
        self.default = value;
        Ok(())
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    /// Replaces the enumeration. Duplicates are dropped; the current default must remain
    /// one of the values.
    pub fn set_allowed_values<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }
        if !deduped.is_empty() && !deduped.contains(&self.default) {
            return Err(OpenApiError::invariant(format!(
                "server variable default '{}' is not one of {:?}",
                self.default, deduped
            )));
        }
        self.allowed_values = deduped;
        Ok(())
    }
}

impl_extensible!(Server, ServerVariable);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_placeholders_become_variables() {
        let server = Server::new("https://{host}.example.com/{path}");
        let names: Vec<_> = server.variable_names().collect();
        assert_eq!(names, vec!["host", "path"]);
        assert_eq!(server.variable("host").unwrap().default_value(), "");
    }

    #[test]
    fn test_changing_url_drops_and_preserves_variables() {
        let mut server = Server::new("https://{host}.example.com/{path}");
        server.variable_mut("host").unwrap().set_default("api").unwrap();
        server.variable_mut("path").unwrap().set_default("v1").unwrap();

        server.set_url("https://{host}.example.com");
        let names: Vec<_> = server.variable_names().collect();
        assert_eq!(names, vec!["host"]);
        assert_eq!(server.variable("host").unwrap().default_value(), "api");
        assert!(server.variable("path").is_none());

        server.set_url("https://{host}.example.com/{path}");
        assert_eq!(server.variable("path").unwrap().default_value(), "");
    }

    #[test]
    fn test_placeholders_ignore_repeats_and_unclosed_braces() {
        assert_eq!(placeholders("{a}/{b}/{a}"), vec!["a", "b"]);
        assert_eq!(placeholders("https://{host"), Vec::<String>::new());
        assert_eq!(placeholders("https://{}/x"), Vec::<String>::new());
    }

    #[test]
    fn test_variable_enum_constrains_default() {
        let mut variable = ServerVariable::default();
        variable.set_default("8443").unwrap();
        assert!(variable.set_allowed_values(["80", "443"]).is_err());
        variable.set_allowed_values(["8443", "443", "8443"]).unwrap();
        assert_eq!(variable.allowed_values(), &["8443".to_string(), "443".to_string()]);
        assert!(variable.set_default("80").is_err());
        variable.set_default("443").unwrap();
    }
}
