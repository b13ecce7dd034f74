use crate::types::JsonPath;
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, OpenApiError>;

/// Errors raised while reading a document or mutating the model.
///
/// Every error is local to the single read or mutation call that produced it.
#[derive(Debug, Clone)]
pub enum OpenApiError {
    /// A required field is missing or has the wrong JSON type.
    Structural { location: String, message: String },

    /// A `$ref` could not be resolved against the document's components.
    UnresolvedReference { reference: String, location: String },

    /// A model invariant would be broken (duplicate key, enum/default mismatch, ...).
    InvariantViolation(String),

    /// The `openapi` tag names a release line the model does not handle.
    UnsupportedVersion(String),
}

impl OpenApiError {
    pub(crate) fn structural<T>(location: &JsonPath, message: &T) -> Self
    where
        T: ToString + ?Sized,
    {
        OpenApiError::Structural {
            location: location.to_pointer(),
            message: message.to_string(),
        }
    }

    pub(crate) fn missing_field(location: &JsonPath, field: &str) -> Self {
        Self::structural(location, &format!("required field '{}' is missing", field))
    }

    pub(crate) fn type_mismatch(location: &JsonPath, expected: &str, found: &str) -> Self {
        Self::structural(
            location,
            &format!("expected {} but found {}", expected, found),
        )
    }

    pub(crate) fn unresolved<T>(reference: &T, location: &JsonPath) -> Self
    where
        T: ToString + ?Sized,
    {
        OpenApiError::UnresolvedReference {
            reference: reference.to_string(),
            location: location.to_pointer(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        OpenApiError::InvariantViolation(message.into())
    }

    pub(crate) fn duplicate_key(collection: &str, key: &str) -> Self {
        Self::invariant(format!("{} already contains '{}'", collection, key))
    }

    pub(crate) fn unsupported_version<T>(version: &T) -> Self
    where
        T: ToString + ?Sized,
    {
        OpenApiError::UnsupportedVersion(version.to_string())
    }

    /// Attaches a location to invariant violations raised by model setters while reading.
    pub(crate) fn at(self, location: &JsonPath) -> Self {
        match self {
            OpenApiError::InvariantViolation(msg) => {
                OpenApiError::InvariantViolation(format!("{} (at {})", msg, location))
            }
            other => other,
        }
    }
}

impl Display for OpenApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenApiError::Structural { location, message } => {
                write!(f, "Structural error at {}: {}", location, message)
            }
            OpenApiError::UnresolvedReference {
                reference,
                location,
            } => {
                write!(f, "Unresolved reference {} at {}", reference, location)
            }
            OpenApiError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            OpenApiError::UnsupportedVersion(version) => {
                write!(f, "Unsupported version: {}", version)
            }
        }
    }
}

impl PartialEq for OpenApiError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (OpenApiError::Structural { .. }, OpenApiError::Structural { .. })
                | (
                    OpenApiError::UnresolvedReference { .. },
                    OpenApiError::UnresolvedReference { .. }
                )
                | (
                    OpenApiError::InvariantViolation(_),
                    OpenApiError::InvariantViolation(_)
                )
                | (
                    OpenApiError::UnsupportedVersion(_),
                    OpenApiError::UnsupportedVersion(_)
                )
        )
    }
}

impl std::error::Error for OpenApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_renders_pointer() {
        let mut path = JsonPath::new();
        path.add("info");
        let err = OpenApiError::missing_field(&path, "title");
        assert_eq!(
            err.to_string(),
            "Structural error at #/info: required field 'title' is missing"
        );
    }

    #[test]
    fn test_errors_compare_by_kind() {
        let a = OpenApiError::invariant("one");
        let b = OpenApiError::invariant("two");
        assert_eq!(a, b);
        assert_ne!(a, OpenApiError::unsupported_version("2.0"));
    }

    #[test]
    fn test_at_only_decorates_invariants() {
        let mut path = JsonPath::new();
        path.add("paths");
        let located = OpenApiError::invariant("bad").at(&path);
        assert_eq!(located.to_string(), "Invariant violation: bad (at #/paths)");

        let unresolved = OpenApiError::unresolved("#/components/schemas/X", &path).at(&path);
        assert!(matches!(unresolved, OpenApiError::UnresolvedReference { .. }));
    }
}
