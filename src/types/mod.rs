pub mod json_path;
pub mod primitive;
pub mod version;

pub use json_path::JsonPath;
pub use primitive::SchemaType;
pub use version::{DEFAULT_OPENAPI_VERSION, OpenApiVersion};
