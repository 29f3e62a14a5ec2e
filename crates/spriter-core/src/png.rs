//! Deterministic PNG writer.
//!
//! Uses fixed compression settings so that the same sheet pixels always
//! produce byte-identical output files.

use std::io::Write;
use std::path::Path;

use image::RgbaImage;
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use thiserror::Error;

/// Errors from PNG operations.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),
}

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Compression level. Use a fixed value for determinism.
    pub compression: Compression,
    /// Filter type. Use a fixed value for determinism.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            // No filtering keeps the output independent of encoder heuristics.
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Config optimized for file size (slower, still deterministic).
    pub fn best_compression() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }
}

/// Write an RGBA buffer to a PNG file.
pub fn write_rgba(image: &RgbaImage, path: &Path, config: &PngConfig) -> Result<(), PngError> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    write_rgba_to_writer(image, writer, config)
}

/// Write an RGBA buffer to any writer.
pub fn write_rgba_to_writer<W: Write>(
    image: &RgbaImage,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    let mut encoder = Encoder::new(writer, image.width(), image.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(image.as_raw())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_rgba_output_is_deterministic() {
        let mut image = RgbaImage::new(32, 32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255]);
        }

        let config = PngConfig::default();
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_rgba_to_writer(&image, &mut first, &config).unwrap();
        write_rgba_to_writer(&image, &mut second, &config).unwrap();

        assert_eq!(first, second, "PNG data should be byte-identical");
    }

    #[test]
    fn test_best_compression_is_deterministic_and_lossless() {
        let mut image = RgbaImage::new(32, 32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255]);
        }

        let config = PngConfig::best_compression();
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_rgba_to_writer(&image, &mut first, &config).unwrap();
        write_rgba_to_writer(&image, &mut second, &config).unwrap();
        assert_eq!(first, second, "PNG data should be byte-identical");

        let decoded = image::load_from_memory(&first).unwrap().to_rgba8();
        assert_eq!(decoded, image, "pixels must survive the heavier preset");
    }

    #[test]
    fn test_written_file_decodes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([1, 2, 3, 4]));
        write_rgba(&image, &path, &PngConfig::default()).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([1, 2, 3, 4]));
    }
}
