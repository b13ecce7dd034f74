use crate::error::OpenApiError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The values the `type` keyword of a 3.0.x Schema Object may take.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum SchemaType {
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Boolean => "boolean",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::String => "string",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

impl Display for SchemaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(SchemaType::Boolean),
            "integer" => Ok(SchemaType::Integer),
            "number" => Ok(SchemaType::Number),
            "string" => Ok(SchemaType::String),
            "array" => Ok(SchemaType::Array),
            "object" => Ok(SchemaType::Object),
            other => Err(OpenApiError::invariant(format!(
                "'{}' is not a valid schema type",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_type_parses_its_own_rendering() {
        for ty in [
            SchemaType::Boolean,
            SchemaType::Integer,
            SchemaType::Number,
            SchemaType::String,
            SchemaType::Array,
            SchemaType::Object,
        ] {
            assert_eq!(SchemaType::from_str(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_schema_type_is_case_sensitive() {
        assert!(SchemaType::from_str("String").is_err());
        assert!(SchemaType::from_str("null").is_err());
    }
}
