//! Texture, image and sampler registration.
//!
//! Every bound texture file gets exactly one entry in `textures` and one in
//! `images`, keyed by the file name. All textures share a single default
//! sampler. Registration only ever adds entries.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{to_entry, Document};
use crate::process::ProcessResult;
use crate::texture::{ChannelFormat, ImageInspector, GL_TEXTURE_2D, GL_UNSIGNED_BYTE};

pub const SAMPLERS: &str = "samplers";
pub const TEXTURES: &str = "textures";
pub const IMAGES: &str = "images";

/// Key of the sampler shared by all registered textures.
pub const DEFAULT_SAMPLER: &str = "sampler_0";

/// Key of the `textures` entry for a file.
pub fn texture_key(filename: &str) -> String {
    format!("texture_{filename}")
}

/// Key of the `images` entry for a file.
pub fn image_key(filename: &str) -> String {
    format!("image_{filename}")
}

/// A `textures` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureEntry {
    pub format: u32,
    pub internal_format: u32,
    pub sampler: String,
    pub source: String,
    pub target: u32,
    #[serde(rename = "type")]
    pub component_type: u32,
}

impl TextureEntry {
    /// Entry for `filename` with the given channel layout.
    pub fn new(filename: &str, format: ChannelFormat) -> Self {
        Self {
            format: format.gl_format(),
            internal_format: format.gl_internal_format(),
            sampler: DEFAULT_SAMPLER.to_string(),
            source: image_key(filename),
            target: GL_TEXTURE_2D,
            component_type: GL_UNSIGNED_BYTE,
        }
    }
}

/// An `images` entry. The URI is relative to the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub uri: String,
}

/// What a call to [`register_texture`] added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registration {
    pub texture_added: bool,
    pub image_added: bool,
}

/// Make sure the shared sampler exists.
pub fn ensure_default_sampler(document: &mut Document) -> ProcessResult<()> {
    let samplers = document.section_or_create(SAMPLERS)?;
    if !samplers.contains_key(DEFAULT_SAMPLER) {
        log::debug!("Adding sampler {DEFAULT_SAMPLER}");
        samplers.insert(DEFAULT_SAMPLER.to_string(), Value::Object(Map::new()));
    }
    Ok(())
}

/// Register `filename` (located in `directory`) as a texture and image.
///
/// Existing entries are left alone, so the image is only inspected the
/// first time a file is seen.
pub fn register_texture(
    document: &mut Document,
    directory: &Path,
    filename: &str,
    inspector: &dyn ImageInspector,
) -> ProcessResult<Registration> {
    let mut registration = Registration::default();

    ensure_default_sampler(document)?;

    let key = texture_key(filename);
    let textures = document.section_or_create(TEXTURES)?;
    if !textures.contains_key(&key) {
        let format = inspector.channel_format(&directory.join(filename))?;
        let entry = TextureEntry::new(filename, format);
        log::info!("\tAdding texture {} {}", key, entry.format);

        textures.insert(key, to_entry(&entry)?);
        registration.texture_added = true;
    }

    let key = image_key(filename);
    let images = document.section_or_create(IMAGES)?;
    if !images.contains_key(&key) {
        log::info!("\tAdding image {key}");

        let entry = ImageEntry {
            uri: filename.to_string(),
        };
        images.insert(key, to_entry(&entry)?);
        registration.image_added = true;
    }

    Ok(registration)
}
