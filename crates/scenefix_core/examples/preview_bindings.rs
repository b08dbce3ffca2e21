//! Example: Show what processing would change without touching the file.
//!
//! Run with: cargo run --example preview_bindings -- models/wall/wall.gltf

use std::env;
use std::path::Path;

use scenefix_core::process::document_directory;
use scenefix_core::{load_document, process_document, ProcessOptions};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: preview_bindings <path-to-gltf-file>");
        println!("\nExample:");
        println!("  cargo run --example preview_bindings -- models/wall/wall.gltf");
        return;
    }

    let path = Path::new(&args[1]);
    println!("Previewing: {}", path.display());

    let mut document = match load_document(path) {
        Ok(loaded) => loaded.document,
        Err(e) => {
            eprintln!("Error loading document: {}", e);
            return;
        }
    };

    match process_document(&mut document, document_directory(path), &ProcessOptions::default()) {
        Ok(report) => {
            println!("\n=== {} ===", report);

            if !report.stripped_sections.is_empty() {
                println!("\n--- Stripped ---");
                for section in &report.stripped_sections {
                    println!("  {}", section);
                }
            }

            println!("\n--- Bindings ---");
            for binding in &report.binding.bindings {
                println!(
                    "  {}.{} -> {}",
                    binding.material, binding.property, binding.texture
                );
            }

            if let Some(textures) = document.section("textures").and_then(|t| t.as_object()) {
                println!("\n--- Textures ---");
                for (key, texture) in textures {
                    println!(
                        "  {} format={} internalFormat={}",
                        key, texture["format"], texture["internalFormat"]
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("Error processing document: {}", e);
        }
    }
}
