use crate::EXTENSION_PREFIX;
use indexmap::IndexMap;
use serde_json::Value;

/// Extension key the lint tooling looks for to suppress rules on a node or document.
pub const LINT_DISABLE_EXTENSION: &str = "fresha-lint-disable";

/// Vendor extension fields of a node, keyed by name without the `x-` prefix.
///
/// Insertion order is preserved; overwriting an existing name keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions(IndexMap<String, Value>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Sets `name` (with or without the `x-` prefix) and returns the previous value.
    pub fn set(&mut self, name: impl AsRef<str>, value: Value) -> Option<Value> {
        let name = name.as_ref();
        let name = name.strip_prefix(EXTENSION_PREFIX).unwrap_or(name);
        self.0.insert(name.to_owned(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Whether the `fresha-lint-disable` extension on this node names `rule`.
    ///
    /// The extension may be `true` (every rule), a single rule name or a list of names.
    pub fn disables_lint_rule(&self, rule: &str) -> bool {
        match self.0.get(LINT_DISABLE_EXTENSION) {
            Some(Value::Bool(all)) => *all,
            Some(Value::String(name)) => name == rule,
            Some(Value::Array(names)) => names.iter().any(|n| n.as_str() == Some(rule)),
            _ => false,
        }
    }
}

/// Implemented by every model node carrying an extension bag.
pub trait Extensible {
    fn extensions(&self) -> &Extensions;
    fn extensions_mut(&mut self) -> &mut Extensions;
}

macro_rules! impl_extensible {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::model::extensions::Extensible for $ty {
                fn extensions(&self) -> &$crate::model::extensions::Extensions {
                    &self.extensions
                }

                fn extensions_mut(&mut self) -> &mut $crate::model::extensions::Extensions {
                    &mut self.extensions
                }
            }
        )*
    };
}

pub(crate) use impl_extensible;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_strips_prefix_and_keeps_order() {
        let mut ext = Extensions::new();
        ext.set("x-b", json!(1));
        ext.set("a", json!(2));
        ext.set("b", json!(3));
        let names: Vec<_> = ext.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(ext.get("b"), Some(&json!(3)));
    }

    #[test]
    fn test_remove_shifts_remaining_entries() {
        let mut ext = Extensions::new();
        ext.set("one", json!(1));
        ext.set("two", json!(2));
        ext.set("three", json!(3));
        assert_eq!(ext.remove("two"), Some(json!(2)));
        let names: Vec<_> = ext.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["one", "three"]);
    }

    #[test]
    fn test_lint_disable_forms() {
        let mut ext = Extensions::new();
        assert!(!ext.disables_lint_rule("naming"));

        ext.set(LINT_DISABLE_EXTENSION, json!(true));
        assert!(ext.disables_lint_rule("naming"));

        ext.set(LINT_DISABLE_EXTENSION, json!("naming"));
        assert!(ext.disables_lint_rule("naming"));
        assert!(!ext.disables_lint_rule("casing"));

        ext.set(LINT_DISABLE_EXTENSION, json!(["casing", "naming"]));
        assert!(ext.disables_lint_rule("casing"));
        assert!(!ext.disables_lint_rule("other"));

        ext.set(LINT_DISABLE_EXTENSION, json!(false));
        assert!(!ext.disables_lint_rule("naming"));
    }
}
