//! scenefix core - post-processing for exported glTF 1.0 scene documents.
//!
//! This crate provides:
//!
//! - **Document model**: load, walk and save scene JSON without a fixed schema
//! - **Sanitizing**: removal of legacy shader, program and technique sections
//! - **Texture binding**: matching `<material>_<role>.<ext>` files to materials
//!   and registering them in the `textures`, `images` and `samplers` tables
//!
//! # Example
//!
//! ```ignore
//! use scenefix_core::{process_file, ProcessOptions};
//!
//! let report = process_file("models/wall/wall.gltf", &ProcessOptions::default())?;
//! println!("{report}");
//! ```

pub mod document;
pub mod material;
pub mod process;
pub mod registry;
pub mod sanitize;
pub mod texture;

// Re-export commonly used types
pub use document::{load_document, save_document, Document, DocumentError, LoadedDocument};
pub use material::{bind_material_textures, Binding, BindingReport, Role, RoleMap};
pub use process::{process_document, process_file, ProcessError, ProcessOptions, ProcessReport};
pub use registry::{register_texture, ImageEntry, TextureEntry};
pub use sanitize::strip_legacy_sections;
pub use texture::{
    ChannelFormat, DescriptionInspector, FileCommandInspector, HeaderInspector, ImageInspector,
    TextureError,
};
