//! Scene document loading and saving.
//!
//! A scene document is a JSON object whose top-level keys are sections
//! (`materials`, `textures`, `images`, ...). Only the sections the
//! processor touches are interpreted; everything else is carried through
//! unchanged.
//!
//! # Example
//!
//! ```ignore
//! use scenefix_core::document::{load_document, save_document};
//!
//! let loaded = load_document("model.gltf")?;
//! let mut document = loaded.document;
//! // ... mutate ...
//! save_document("model.gltf", &document, &loaded.permissions)?;
//! ```

use std::fs::{self, Permissions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while reading, writing or walking a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected document shape at {context}: expected {expected}")]
    Shape {
        context: String,
        expected: &'static str,
    },

    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// In-memory scene document.
///
/// Wraps the root JSON object. Keys are kept sorted, so serialization is
/// stable across runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from JSON text.
    ///
    /// `origin` is only used for error messages.
    pub fn parse(content: &str, origin: impl Into<PathBuf>) -> DocumentResult<Self> {
        let origin = origin.into();
        let value: Value = serde_json::from_str(content).map_err(|source| DocumentError::Format {
            path: origin.clone(),
            source,
        })?;

        Self::from_value(value, &origin.display().to_string())
    }

    /// Wrap an already decoded JSON value. The root must be an object.
    pub fn from_value(value: Value, context: &str) -> DocumentResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(DocumentError::Shape {
                context: context.to_string(),
                expected: "an object at the document root",
            }),
        }
    }

    /// Borrow the root object.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Get a section by name.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// Check whether a section is present.
    pub fn has_section(&self, name: &str) -> bool {
        self.root.contains_key(name)
    }

    /// Remove a section, returning its previous value.
    pub fn remove_section(&mut self, name: &str) -> Option<Value> {
        self.root.remove(name)
    }

    /// Get an existing object section.
    ///
    /// Returns `Ok(None)` if the section is absent and a shape error if it
    /// exists but is not an object.
    pub fn object_section(&self, name: &str) -> DocumentResult<Option<&Map<String, Value>>> {
        self.root
            .get(name)
            .map(|value| expect_object(value, name))
            .transpose()
    }

    /// Mutable variant of [`Document::object_section`].
    pub fn object_section_mut(
        &mut self,
        name: &str,
    ) -> DocumentResult<Option<&mut Map<String, Value>>> {
        self.root
            .get_mut(name)
            .map(|value| expect_object_mut(value, name))
            .transpose()
    }

    /// Get an object section, inserting an empty one if it is missing.
    pub fn section_or_create(&mut self, name: &str) -> DocumentResult<&mut Map<String, Value>> {
        let value = self
            .root
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        expect_object_mut(value, name)
    }

    /// Serialize with four-space indentation and a trailing newline.
    pub fn to_pretty_string(&self) -> DocumentResult<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.root
            .serialize(&mut serializer)
            .map_err(DocumentError::Encode)?;
        buffer.push(b'\n');

        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// A document together with the permission bits of the file it came from.
#[derive(Debug)]
pub struct LoadedDocument {
    pub document: Document,
    pub permissions: Permissions,
}

/// Read and parse a document, capturing the file's permissions.
pub fn load_document<P: AsRef<Path>>(path: P) -> DocumentResult<LoadedDocument> {
    let path = path.as_ref();
    let read_error = |source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(read_error)?;
    let permissions = fs::metadata(path).map_err(read_error)?.permissions();
    let document = Document::parse(&content, path)?;

    log::debug!("Loaded {} ({} sections)", path.display(), document.root.len());

    Ok(LoadedDocument {
        document,
        permissions,
    })
}

/// Overwrite `path` with the serialized document and restore `permissions`.
///
/// This is a plain overwrite, not a rename-based atomic replace.
pub fn save_document<P: AsRef<Path>>(
    path: P,
    document: &Document,
    permissions: &Permissions,
) -> DocumentResult<()> {
    let path = path.as_ref();
    let write_error = |source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    };

    let content = document.to_pretty_string()?;
    fs::write(path, content).map_err(write_error)?;
    fs::set_permissions(path, permissions.clone()).map_err(write_error)?;

    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Check that `value` is an object.
pub fn expect_object<'a>(value: &'a Value, context: &str) -> DocumentResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| shape_error(context, "an object"))
}

/// Check that `value` is an object, mutably.
pub fn expect_object_mut<'a>(
    value: &'a mut Value,
    context: &str,
) -> DocumentResult<&'a mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| shape_error(context, "an object"))
}

/// Check that `value` is present and a string.
pub fn expect_str<'a>(value: Option<&'a Value>, context: &str) -> DocumentResult<&'a str> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| shape_error(context, "a string"))
}

/// Serialize a registry entry into a JSON value.
pub fn to_entry<T: Serialize>(entry: &T) -> DocumentResult<Value> {
    serde_json::to_value(entry).map_err(DocumentError::Encode)
}

fn shape_error(context: &str, expected: &'static str) -> DocumentError {
    DocumentError::Shape {
        context: context.to_string(),
        expected,
    }
}
