//! A structural model, reader and writer for OpenAPI 3.0.x documents.
//!
//! [`parse`] turns a generic JSON value into a [`Document`] graph, resolving every `$ref`
//! into the shared node registered in the components section. [`write`] turns the graph
//! back into a JSON value, emitting a `$ref` wherever a shared node is used and omitting
//! fields that hold their OpenAPI default.
//!
//! ```
//! use serde_json::json;
//!
//! let raw = json!({
//!     "openapi": "3.0.3",
//!     "info": { "title": "Pets", "version": "1.0.0" },
//!     "paths": {}
//! });
//! let document = openapi_model::parse(&raw).unwrap();
//! assert_eq!(document.info.title, "Pets");
//! assert_eq!(openapi_model::write(&document), raw);
//! ```

pub mod error;
pub mod model;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::{OpenApiError, Result};
pub use model::Document;
pub use reader::{OpenApiReader, ReaderOptions};
pub use writer::{OpenApiWriter, WriterOptions};

use serde_json::Value;

const PATH_SEPARATOR: &str = "/";
const TILDE: &str = "~";
const ENCODED_SLASH: &str = "~1";
const ENCODED_TILDE: &str = "~0";
const POINTER_PREFIX: &str = "#/";
const EXTENSION_PREFIX: &str = "x-";

const REF_FIELD: &str = "$ref";
const OPENAPI_FIELD: &str = "openapi";
const INFO_FIELD: &str = "info";
const PATHS_FIELD: &str = "paths";
const COMPONENTS_FIELD: &str = "components";
const SERVERS_FIELD: &str = "servers";
const SECURITY_FIELD: &str = "security";
const TAGS_FIELD: &str = "tags";
const EXTERNAL_DOCS_FIELD: &str = "externalDocs";
const NAME_FIELD: &str = "name";
const IN_FIELD: &str = "in";
const URL_FIELD: &str = "url";
const DESCRIPTION_FIELD: &str = "description";
const SUMMARY_FIELD: &str = "summary";
const REQUIRED_FIELD: &str = "required";
const DEPRECATED_FIELD: &str = "deprecated";
const SCHEMA_FIELD: &str = "schema";
const CONTENT_FIELD: &str = "content";
const EXAMPLE_FIELD: &str = "example";
const EXAMPLES_FIELD: &str = "examples";
const HEADERS_FIELD: &str = "headers";
const STYLE_FIELD: &str = "style";
const EXPLODE_FIELD: &str = "explode";
const PARAMETERS_FIELD: &str = "parameters";
const REQUEST_BODY_FIELD: &str = "requestBody";
const RESPONSES_FIELD: &str = "responses";

/// Reads a document with the default [`ReaderOptions`].
pub fn parse(raw: &Value) -> Result<Document> {
    OpenApiReader::default().read(raw)
}

/// Writes a document with the default [`WriterOptions`].
pub fn write(document: &Document) -> Value {
    OpenApiWriter::default().write(document)
}
