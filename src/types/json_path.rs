use crate::{ENCODED_SLASH, ENCODED_TILDE, PATH_SEPARATOR, POINTER_PREFIX, TILDE};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A JSON pointer into an OpenAPI document, stored as already-escaped segments.
///
/// Segments added through [`JsonPath::add`] are escaped (`~` becomes `~0`, `/` becomes
/// `~1`), so a path built while walking the document can be rendered as a `$ref` string
/// without further processing.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq, Hash)]
pub struct JsonPath(pub Vec<String>);

impl JsonPath {
    pub fn new() -> Self {
        JsonPath(Vec::new())
    }

    pub fn add(&mut self, segment: impl AsRef<str>) -> &mut Self {
        let segment = segment.as_ref();
        if segment.contains(TILDE) || segment.contains(PATH_SEPARATOR) {
            let segment = segment
                .replace(TILDE, ENCODED_TILDE)
                .replace(PATH_SEPARATOR, ENCODED_SLASH);
            self.0.push(segment);
        } else {
            self.0.push(segment.to_owned());
        }

        self
    }

    /// Returns a copy of this path extended by one segment.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let mut path = self.clone();
        path.add(segment);
        path
    }

    pub fn format_path(&self) -> String {
        self.0.join(PATH_SEPARATOR)
    }

    /// Renders the path as a document-local reference, e.g. `#/components/schemas/Pet`.
    pub fn to_pointer(&self) -> String {
        format!("{}{}", POINTER_PREFIX, self.format_path())
    }

    /// Parses a document-local reference (`#/a/b~1c`) back into a path.
    ///
    /// Returns `None` when the reference does not start with `#/`. Segments are kept in
    /// their escaped form; use [`JsonPath::decoded_segments`] to get the raw keys back.
    pub fn from_pointer(pointer: &str) -> Option<Self> {
        if pointer == "#" || pointer == POINTER_PREFIX {
            return Some(JsonPath::new());
        }
        let rest = pointer.strip_prefix(POINTER_PREFIX)?;
        Some(JsonPath(
            rest.split(PATH_SEPARATOR).map(str::to_owned).collect(),
        ))
    }

    /// Decodes every segment: percent-escapes first, then `~1` and `~0`.
    pub fn decoded_segments(&self) -> Vec<String> {
        self.0.iter().map(|s| Self::decode_segment(s)).collect()
    }

    pub fn decode_segment(segment: &str) -> String {
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        decoded
            .replace(ENCODED_SLASH, PATH_SEPARATOR)
            .replace(ENCODED_TILDE, TILDE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pointer())
    }
}
