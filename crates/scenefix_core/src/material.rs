//! Material texture binding.
//!
//! Texture files sitting next to the document are matched to materials by
//! name: `<material>_<role>.<ext>`, e.g. `wall_diffuse.png` becomes the
//! `baseColor` texture of the material named `wall`.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::document::{expect_object, expect_object_mut, expect_str, Document, DocumentError};
use crate::process::{ProcessError, ProcessResult};
use crate::registry::{register_texture, texture_key};
use crate::texture::ImageInspector;

pub const MATERIALS: &str = "materials";

/// Per-material reference to a legacy technique.
pub const TECHNIQUE: &str = "technique";

/// A texture role: the file name suffix and the material property it fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Role {
    pub suffix: &'static str,
    pub property: &'static str,
}

impl Role {
    pub const fn new(suffix: &'static str, property: &'static str) -> Self {
        Self { suffix, property }
    }
}

/// Roles recognized by default, in matching order.
pub const DEFAULT_ROLES: [Role; 4] = [
    Role::new("diffuse", "baseColor"),
    Role::new("roughness", "roughness"),
    Role::new("metallic", "metallic"),
    Role::new("height", "height"),
];

/// Ordered set of texture roles.
///
/// When a file name could satisfy more than one role, the role declared
/// first wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleMap {
    roles: Vec<Role>,
}

impl RoleMap {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    /// Find the role `filename` fills for the material called `material`.
    pub fn match_file(&self, material: &str, filename: &str) -> Option<&Role> {
        let rest = filename.strip_prefix(material)?.strip_prefix('_')?;
        self.roles.iter().find(|role| {
            rest.strip_prefix(role.suffix)
                .is_some_and(|ext| ext.starts_with('.'))
        })
    }
}

impl Default for RoleMap {
    fn default() -> Self {
        Self::new(DEFAULT_ROLES.to_vec())
    }
}

/// A texture reference added to a material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Key of the material in the `materials` section
    pub material: String,
    /// Property that was set
    pub property: &'static str,
    /// Texture key the property now points to
    pub texture: String,
}

/// Summary of one binding pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingReport {
    pub techniques_removed: usize,
    pub bindings: Vec<Binding>,
    pub textures_added: usize,
    pub images_added: usize,
}

/// List regular file names in `directory`, sorted.
///
/// Names that are not valid UTF-8 can never match a material and are
/// skipped.
pub fn list_texture_files(directory: &Path) -> ProcessResult<Vec<String>> {
    let read_dir_error = |source| ProcessError::ReadDir {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        if entry.file_type().map_err(read_dir_error)?.is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => files.push(name),
            Err(name) => log::debug!("Skipping non UTF-8 file name {name:?}"),
        }
    }

    files.sort();
    Ok(files)
}

/// Bind texture files in `directory` to every material of the document.
///
/// Existing material values are never overwritten. Each matched file is
/// registered as a texture even if the material already referenced
/// something else for that role, so re-running is harmless.
pub fn bind_material_textures(
    document: &mut Document,
    directory: &Path,
    roles: &RoleMap,
    inspector: &dyn ImageInspector,
) -> ProcessResult<BindingReport> {
    let mut report = BindingReport::default();

    let material_keys: Vec<String> = match document.object_section(MATERIALS)? {
        Some(materials) if !materials.is_empty() => materials.keys().cloned().collect(),
        _ => return Ok(report),
    };

    let files = list_texture_files(directory)?;

    for key in material_keys {
        let matched = bind_material(document, &key, &files, roles, &mut report)?;

        for filename in matched {
            let registration = register_texture(document, directory, &filename, inspector)?;
            report.textures_added += usize::from(registration.texture_added);
            report.images_added += usize::from(registration.image_added);
        }
    }

    Ok(report)
}

/// Update a single material and return the files it matched.
fn bind_material(
    document: &mut Document,
    key: &str,
    files: &[String],
    roles: &RoleMap,
    report: &mut BindingReport,
) -> ProcessResult<Vec<String>> {
    let context = format!("{MATERIALS}.{key}");
    let material = document
        .object_section_mut(MATERIALS)?
        .and_then(|materials| materials.get_mut(key))
        .map(|material| expect_object_mut(material, &context))
        .transpose()?;
    let Some(material) = material else {
        return Ok(Vec::new());
    };

    // Reject a malformed material before touching it
    let name = expect_str(material.get("name"), &format!("{context}.name"))?.to_string();
    let values_context = format!("{context}.values");
    let values = material.get("values").ok_or_else(|| missing_values(&context))?;
    expect_object(values, &values_context)?;

    if material.remove(TECHNIQUE).is_some() {
        log::info!("{key}: Removing technique");
        report.techniques_removed += 1;
    }

    let values = material
        .get_mut("values")
        .ok_or_else(|| missing_values(&context))?;
    let values = expect_object_mut(values, &values_context)?;

    let mut matched = Vec::new();
    for filename in files {
        let Some(role) = roles.match_file(&name, filename) else {
            continue;
        };

        if !values.contains_key(role.property) {
            let texture = texture_key(filename);
            log::info!("{key}: Adding texture {}: {filename}", role.property);

            values.insert(role.property.to_string(), Value::String(texture.clone()));
            report.bindings.push(Binding {
                material: key.to_string(),
                property: role.property,
                texture,
            });
        } else {
            log::debug!("{key}: {} already set, keeping it", role.property);
        }

        matched.push(filename.clone());
    }

    Ok(matched)
}

fn missing_values(context: &str) -> ProcessError {
    DocumentError::Shape {
        context: format!("{context}.values"),
        expected: "an object",
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{IMAGES, TEXTURES};
    use crate::texture::{DescriptionInspector, TextureResult};
    use serde_json::json;

    fn rgb_inspector() -> impl ImageInspector {
        DescriptionInspector::new(|_: &Path| -> TextureResult<String> { Ok("RGB,".to_string()) })
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_match_file() {
        let roles = RoleMap::default();

        assert_eq!(
            roles.match_file("wall", "wall_diffuse.png").map(|r| r.property),
            Some("baseColor")
        );
        assert_eq!(
            roles.match_file("wall", "wall_height.tga").map(|r| r.property),
            Some("height")
        );
        // Extension separator is required right after the suffix
        assert_eq!(roles.match_file("wall", "wall_diffuse2.png"), None);
        assert_eq!(roles.match_file("wall", "wall_normal.png"), None);
        assert_eq!(roles.match_file("wall", "wallpaper_diffuse.png"), None);
        assert_eq!(roles.match_file("wall", "wall_diffuse"), None);
    }

    #[test]
    fn test_first_declared_role_wins() {
        let roles = RoleMap::new(vec![
            Role::new("diffuse", "baseColor"),
            Role::new("diffuse.alt", "emissive"),
        ]);

        let role = roles.match_file("wall", "wall_diffuse.alt.png").unwrap();
        assert_eq!(role.property, "baseColor");
    }

    #[test]
    fn test_list_texture_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["b.png", "a.png"]);
        fs::create_dir(dir.path().join("wall_diffuse.png")).unwrap();

        let files = list_texture_files(dir.path()).unwrap();
        assert_eq!(files, vec!["a.png".to_string(), "b.png".to_string()]);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_texture_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ProcessError::ReadDir { .. }));
    }

    #[test]
    fn test_bind_keeps_existing_values() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["wall_diffuse.png", "wall_metallic.png"]);

        let mut doc = Document::parse(
            r#"{"materials": {"m0": {"name": "wall", "values": {"baseColor": "texture_custom.png", "shininess": 12}}}}"#,
            "test",
        )
        .unwrap();

        let report =
            bind_material_textures(&mut doc, dir.path(), &RoleMap::default(), &rgb_inspector()).unwrap();

        let values = &doc.section(MATERIALS).unwrap()["m0"]["values"];
        assert_eq!(
            values,
            &json!({
                "baseColor": "texture_custom.png",
                "metallic": "texture_wall_metallic.png",
                "shininess": 12
            })
        );
        assert_eq!(report.bindings.len(), 1);
        assert_eq!(report.bindings[0].property, "metallic");

        // The matched diffuse file is still registered
        let textures = doc.section(TEXTURES).unwrap();
        assert!(textures.get("texture_wall_diffuse.png").is_some());
        assert!(textures.get("texture_wall_metallic.png").is_some());
    }

    #[test]
    fn test_shared_texture_registered_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["brick_diffuse.png"]);

        let mut doc = Document::parse(
            r#"{"materials": {
                "a": {"name": "brick", "values": {}},
                "b": {"name": "brick", "values": {}}
            }}"#,
            "test",
        )
        .unwrap();

        let report =
            bind_material_textures(&mut doc, dir.path(), &RoleMap::default(), &rgb_inspector()).unwrap();

        assert_eq!(report.bindings.len(), 2);
        assert_eq!(report.textures_added, 1);
        assert_eq!(report.images_added, 1);
        assert_eq!(doc.section(TEXTURES).unwrap().as_object().unwrap().len(), 1);
        assert_eq!(doc.section(IMAGES).unwrap().as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_no_materials_does_not_list_directory() {
        let mut doc = Document::parse(r#"{"meshes": {}}"#, "test").unwrap();

        let report = bind_material_textures(
            &mut doc,
            Path::new("/nonexistent/textures"),
            &RoleMap::default(),
            &rgb_inspector(),
        )
        .unwrap();

        assert_eq!(report, BindingReport::default());
        assert!(!doc.has_section(TEXTURES));
    }

    #[test]
    fn test_material_without_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc =
            Document::parse(r#"{"materials": {"m0": {"values": {}}}}"#, "test").unwrap();

        let err = bind_material_textures(&mut doc, dir.path(), &RoleMap::default(), &rgb_inspector())
            .unwrap_err();
        assert!(matches!(err, ProcessError::Document(_)));
    }

    #[test]
    fn test_malformed_material_keeps_technique() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            r#"{"materials": {"m0": {"technique": "technique_0", "values": {}}}}"#,
            r#"{"materials": {"m0": {"name": "glass", "technique": "technique_0"}}}"#,
            r#"{"materials": {"m0": {"name": "glass", "technique": "technique_0", "values": []}}}"#,
        ];

        for content in cases {
            let mut doc = Document::parse(content, "test").unwrap();

            let err =
                bind_material_textures(&mut doc, dir.path(), &RoleMap::default(), &rgb_inspector())
                    .unwrap_err();

            assert!(matches!(err, ProcessError::Document(_)), "{content}");
            assert_eq!(
                doc.section(MATERIALS).unwrap()["m0"][TECHNIQUE],
                json!("technique_0"),
                "{content}"
            );
        }
    }

    #[test]
    fn test_technique_removed_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::parse(
            r#"{"materials": {"m0": {"name": "glass", "technique": "technique_0", "values": {}}}}"#,
            "test",
        )
        .unwrap();

        let report =
            bind_material_textures(&mut doc, dir.path(), &RoleMap::default(), &rgb_inspector()).unwrap();

        assert_eq!(report.techniques_removed, 1);
        assert_eq!(
            doc.section(MATERIALS),
            Some(&json!({"m0": {"name": "glass", "values": {}}}))
        );
        assert!(!doc.has_section(TEXTURES));
    }
}
