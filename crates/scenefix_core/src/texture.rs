//! Texture pixel-format detection.
//!
//! Texture registrations need a GL channel format for every image. The
//! format is derived from a short human-readable description of the file
//! (the same vocabulary `file(1)` prints), which keeps the classification
//! rules in one place no matter where the description comes from.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{ColorType, ImageDecoder, ImageReader};
use thiserror::Error;

/// `GL_RED`
pub const GL_RED: u32 = 6403;
/// `GL_RGB`
pub const GL_RGB: u32 = 6407;
/// `GL_RGBA`
pub const GL_RGBA: u32 = 6408;
/// `GL_R8`, sized single-channel storage.
pub const GL_R8: u32 = 33321;
/// `GL_TEXTURE_2D`
pub const GL_TEXTURE_2D: u32 = 3553;
/// `GL_UNSIGNED_BYTE`
pub const GL_UNSIGNED_BYTE: u32 = 5121;

/// Errors that can occur while inspecting a texture file.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read image header of {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed on {} ({status})", .path.display())]
    Inspector {
        command: String,
        path: PathBuf,
        status: std::process::ExitStatus,
    },

    #[error("Unsupported texture format for {}: {description}", .path.display())]
    UnsupportedFormat { path: PathBuf, description: String },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Pixel channel layout of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelFormat {
    /// Single channel (grayscale, 8 bpp)
    Red,
    /// Three channels (24 bpp)
    Rgb,
    /// Four channels (32 bpp)
    Rgba,
}

/// Color layout words found in PNG descriptions, checked in order.
pub const DESCRIPTION_PATTERNS: [(&str, ChannelFormat); 3] = [
    ("RGBA,", ChannelFormat::Rgba),
    ("RGB,", ChannelFormat::Rgb),
    ("grayscale", ChannelFormat::Red),
];

/// Bits per pixel reported by BMP and TGA descriptions
/// (`<width> x <height> x <bpp>`).
pub const BIT_DEPTHS: [(u32, ChannelFormat); 3] = [
    (32, ChannelFormat::Rgba),
    (24, ChannelFormat::Rgb),
    (8, ChannelFormat::Red),
];

impl ChannelFormat {
    /// Classify a file description. Returns `None` if nothing matches.
    pub fn from_description(description: &str) -> Option<Self> {
        DESCRIPTION_PATTERNS
            .iter()
            .find(|(pattern, _)| description.contains(pattern))
            .map(|&(_, format)| format)
            .or_else(|| {
                let bpp = trailing_bit_depth(description)?;
                BIT_DEPTHS
                    .iter()
                    .find(|&&(depth, _)| depth == bpp)
                    .map(|&(_, format)| format)
            })
    }

    /// GL pixel format used for upload.
    pub fn gl_format(self) -> u32 {
        match self {
            ChannelFormat::Red => GL_RED,
            ChannelFormat::Rgb => GL_RGB,
            ChannelFormat::Rgba => GL_RGBA,
        }
    }

    /// GL internal format used for storage.
    ///
    /// Single-channel data (height maps, roughness) is stored as `GL_R8`;
    /// color data keeps its upload format.
    pub fn gl_internal_format(self) -> u32 {
        match self {
            ChannelFormat::Red => GL_R8,
            ChannelFormat::Rgb | ChannelFormat::Rgba => self.gl_format(),
        }
    }
}

/// The last `x <number>` term of a description, i.e. the bit depth of a
/// `<width> x <height> x <bpp>` triple.
fn trailing_bit_depth(description: &str) -> Option<u32> {
    description.rmatch_indices("x ").find_map(|(at, _)| {
        let standalone = description[..at]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        if !standalone {
            return None;
        }

        let rest = &description[at + 2..];
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .map_or(rest, |end| &rest[..end]);
        digits.parse().ok()
    })
}

/// Something that can describe an image file.
///
/// Implementors only need to produce a description; classification into a
/// [`ChannelFormat`] is shared.
pub trait ImageInspector {
    /// Describe the file at `path`.
    fn describe(&self, path: &Path) -> TextureResult<String>;

    /// Determine the channel layout of the file at `path`.
    fn channel_format(&self, path: &Path) -> TextureResult<ChannelFormat> {
        let description = self.describe(path)?;
        ChannelFormat::from_description(&description).ok_or_else(|| {
            TextureError::UnsupportedFormat {
                path: path.to_path_buf(),
                description: description.trim().to_string(),
            }
        })
    }
}

/// Reads the image header in-process with the `image` crate.
///
/// The container is sniffed from the file contents, falling back to the
/// extension for formats without a signature (TGA). Pixel data is never
/// decoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderInspector;

impl ImageInspector for HeaderInspector {
    fn describe(&self, path: &Path) -> TextureResult<String> {
        let io_error = |source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        };
        let image_error = |source| TextureError::Image {
            path: path.to_path_buf(),
            source,
        };

        let reader = ImageReader::open(path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(io_error)?;

        let container = reader
            .format()
            .map(|format| format!("{format:?}"))
            .unwrap_or_else(|| "unknown".to_string());
        let decoder = reader.into_decoder().map_err(image_error)?;

        Ok(format!(
            "{container} image data, {}",
            describe_color(decoder.color_type())
        ))
    }
}

/// Describe a decoded color layout using `file(1)` wording.
fn describe_color(color: ColorType) -> String {
    match color {
        ColorType::L8 | ColorType::L16 => "grayscale".to_string(),
        ColorType::La8 | ColorType::La16 => "gray+alpha".to_string(),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB,".to_string(),
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA,".to_string(),
        other => format!("{other:?}"),
    }
}

/// Runs an external `file`-style command and uses its output.
#[derive(Clone, Debug)]
pub struct FileCommandInspector {
    program: String,
    args: Vec<String>,
}

impl FileCommandInspector {
    /// Use the system `file` command.
    pub fn new() -> Self {
        Self::with_program("file")
    }

    /// Use a different program. The image path is passed as its last
    /// argument.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Pass an extra argument before the image path.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Default for FileCommandInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageInspector for FileCommandInspector {
    fn describe(&self, path: &Path) -> TextureResult<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| TextureError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TextureError::Inspector {
                command: self.program.clone(),
                path: path.to_path_buf(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Adapts a closure into an inspector.
///
/// Handy for tests and for plugging in tooling that already knows the
/// answer.
pub struct DescriptionInspector<F> {
    describe: F,
}

impl<F> DescriptionInspector<F>
where
    F: Fn(&Path) -> TextureResult<String>,
{
    pub fn new(describe: F) -> Self {
        Self { describe }
    }
}

impl<F> ImageInspector for DescriptionInspector<F>
where
    F: Fn(&Path) -> TextureResult<String>,
{
    fn describe(&self, path: &Path) -> TextureResult<String> {
        (self.describe)(path)
    }
}
