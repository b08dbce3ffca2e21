//! The full scene fix-up pass.
//!
//! [`process_document`] runs the in-memory part (strip legacy sections,
//! bind and register textures); [`process_file`] wraps it with loading and
//! saving. Nothing is written unless the whole pass succeeds.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::{load_document, save_document, Document, DocumentError};
use crate::material::{bind_material_textures, BindingReport, RoleMap};
use crate::sanitize::strip_legacy_sections;
use crate::texture::{HeaderInspector, ImageInspector, TextureError};

/// Errors that can occur while processing a scene.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("Failed to list {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for processing operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Knobs for a processing run.
pub struct ProcessOptions {
    /// Recognized texture roles
    pub roles: RoleMap,

    /// How texture files are classified
    pub inspector: Box<dyn ImageInspector>,
}

impl ProcessOptions {
    /// Replace the image inspector.
    pub fn with_inspector(mut self, inspector: impl ImageInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    /// Replace the role map.
    pub fn with_roles(mut self, roles: RoleMap) -> Self {
        self.roles = roles;
        self
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            roles: RoleMap::default(),
            inspector: Box::new(HeaderInspector),
        }
    }
}

/// Everything a processing run changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub stripped_sections: Vec<&'static str>,
    pub binding: BindingReport,
}

impl ProcessReport {
    /// True if the run did not modify the document.
    pub fn is_unchanged(&self) -> bool {
        self.stripped_sections.is_empty() && self.binding == BindingReport::default()
    }
}

impl fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sections stripped, {} techniques removed, {} bindings, {} textures, {} images added",
            self.stripped_sections.len(),
            self.binding.techniques_removed,
            self.binding.bindings.len(),
            self.binding.textures_added,
            self.binding.images_added,
        )
    }
}

/// Strip legacy sections and bind the textures found in `directory`.
pub fn process_document(
    document: &mut Document,
    directory: &Path,
    options: &ProcessOptions,
) -> ProcessResult<ProcessReport> {
    let stripped_sections = strip_legacy_sections(document);
    let binding =
        bind_material_textures(document, directory, &options.roles, options.inspector.as_ref())?;

    Ok(ProcessReport {
        stripped_sections,
        binding,
    })
}

/// Process the document at `path` in place.
///
/// The path is canonicalized first, so texture files are looked up next to
/// the real document even when `path` is a symlink or contains `..`. The
/// file keeps its permission bits.
pub fn process_file<P: AsRef<Path>>(path: P, options: &ProcessOptions) -> ProcessResult<ProcessReport> {
    let path = path.as_ref();
    let path = fs::canonicalize(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let directory = document_directory(&path);
    log::debug!("Resolved {} (textures in {})", path.display(), directory.display());

    let loaded = load_document(&path)?;
    let mut document = loaded.document;

    let report = process_document(&mut document, directory, options)?;

    save_document(&path, &document, &loaded.permissions)?;
    Ok(report)
}

/// Directory containing `path`; `.` for bare file names.
pub fn document_directory(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
