//! Removal of legacy shader sections.
//!
//! Older exports describe rendering through explicit shader programs. The
//! target runtime derives shading from material properties instead, so the
//! shader sources, program linkage and techniques are dropped.

use crate::document::Document;

/// Top-level sections removed by [`strip_legacy_sections`], in order.
pub const LEGACY_SECTIONS: [&str; 3] = ["shaders", "programs", "techniques"];

/// Remove legacy shader sections, returning the names that were present.
pub fn strip_legacy_sections(document: &mut Document) -> Vec<&'static str> {
    LEGACY_SECTIONS
        .into_iter()
        .filter(|section| {
            let removed = document.remove_section(section).is_some();
            if removed {
                log::info!("Stripping {section}");
            }
            removed
        })
        .collect()
}
