use crate::error::OpenApiError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The `openapi` version tag written for documents created from scratch.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";

/// The OpenAPI release lines the model understands. Only 3.0.x is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenApiVersion {
    V30x,
}

impl FromStr for OpenApiVersion {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("3"), Some("0"), Some(patch), None)
                if !patch.is_empty() && patch.chars().all(|c| c.is_ascii_digit()) =>
            {
                Ok(OpenApiVersion::V30x)
            }
            _ => Err(OpenApiError::unsupported_version(s)),
        }
    }
}

impl Display for OpenApiVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenApiVersion::V30x => write!(f, "3.0.x"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_three_zero_patch_versions() {
        assert_eq!(OpenApiVersion::from_str("3.0.0").unwrap(), OpenApiVersion::V30x);
        assert_eq!(OpenApiVersion::from_str("3.0.3").unwrap(), OpenApiVersion::V30x);
    }

    #[test]
    fn test_rejects_other_versions() {
        for version in ["3.1.0", "2.0", "3.0", "3.0.x", "3.0.1.2", ""] {
            let err = OpenApiVersion::from_str(version).unwrap_err();
            assert!(matches!(err, OpenApiError::UnsupportedVersion(_)), "{version}");
        }
    }
}
