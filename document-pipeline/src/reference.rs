use std::fmt;

/// Identifier for one source document: a filename relative to the
/// configured document base URL. Immutable once constructed; equality is
/// string equality on the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentReference(String);

impl DocumentReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentReference {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered set of document references, fixed at startup.
pub type DocumentList = Vec<DocumentReference>;
