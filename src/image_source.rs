//! Image loading: bytes or files in, a 3-channel pixel grid out.
//!
//! Only PNG, JPEG and GIF are accepted. Decoding never converts colour
//! space; see [`ImageData::to_hsv`](crate::color_profiler) for that.

use crate::error::{Result, ScanError};
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat, ImageOutputFormat, Rgb, RgbImage};
use rgb::RGB8;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Extensions accepted from the upload layer.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Png,
    Jpeg,
    Gif,
}

impl SourceFormat {
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RGB8>,
    pub format: SourceFormat,
}

impl ImageData {
    pub fn from_rgb_image(buffer: &RgbImage, format: SourceFormat) -> Self {
        let pixels = buffer
            .pixels()
            .map(|p| RGB8::new(p[0], p[1], p[2]))
            .collect();

        Self {
            width: buffer.width(),
            height: buffer.height(),
            pixels,
            format,
        }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let w = self.width as usize;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let p = self
                .pixels
                .get(y as usize * w + x as usize)
                .copied()
                .unwrap_or_default();
            Rgb([p.r, p.g, p.b])
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Decode guard applied before any pixels are handed to the analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// Upper bound on decoder allocations, in bytes.
    pub max_alloc: u64,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_width: 8192,
            max_height: 8192,
            max_alloc: 512 * 1024 * 1024,
        }
    }
}

impl ImageLimits {
    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if width > self.max_width || height > self.max_height {
            return Err(ScanError::ImageTooLarge {
                message: format!(
                    "{}x{} exceeds {}x{}",
                    width, height, self.max_width, self.max_height
                ),
            });
        }
        Ok(())
    }

    fn decoder_limits(&self) -> image::io::Limits {
        let mut limits = image::io::Limits::default();
        limits.max_image_width = Some(self.max_width);
        limits.max_image_height = Some(self.max_height);
        limits.max_alloc = Some(self.max_alloc);
        limits
    }
}

pub fn load_image(path: &Path, limits: &ImageLimits) -> Result<ImageData> {
    let bytes = std::fs::read(path)?;
    load_image_bytes(&bytes, limits)
}

pub fn load_image_bytes(bytes: &[u8], limits: &ImageLimits) -> Result<ImageData> {
    let guessed = image::guess_format(bytes)?;
    let format = SourceFormat::from_image_format(guessed)
        .ok_or_else(|| ScanError::decode(format!("unsupported image format {:?}", guessed)))?;

    // Header-only pass so oversized inputs are rejected before allocation.
    let (width, height) =
        ImageReader::with_format(Cursor::new(bytes), format.image_format()).into_dimensions()?;
    limits.check_dimensions(width, height)?;

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format.image_format());
    reader.limits(limits.decoder_limits());
    let decoded = reader.decode()?;

    Ok(ImageData::from_rgb_image(&decoded.to_rgb8(), format))
}

pub fn is_allowed_filename(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Serialize an image for the caller to persist. JPEG sources stay JPEG,
/// everything else is written as PNG.
pub fn encode_image(image_data: &ImageData) -> Result<Vec<u8>> {
    let output_format = match image_data.format {
        SourceFormat::Jpeg => ImageOutputFormat::Jpeg(JPEG_QUALITY),
        SourceFormat::Png | SourceFormat::Gif => ImageOutputFormat::Png,
    };

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image_data.to_rgb_image())
        .write_to(&mut Cursor::new(&mut bytes), output_format)
        .map_err(|e| ScanError::Encode {
            message: e.to_string(),
        })?;
    Ok(bytes)
}
