//! Sheet composition.
//!
//! Copies each sprite's pixels onto a blank RGBA buffer at its packed
//! position. Lossless: no scaling, no blending, no color-space conversion.

use image::{GenericImage, RgbaImage};
use thiserror::Error;

use crate::load::Sprite;

/// Errors from sheet composition.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A sprite's rectangle fell outside the sheet buffer.
    #[error("sprite composition error: {0}")]
    Compose(#[from] image::ImageError),
}

/// Composite the sprites onto a blank sheet of the given size.
///
/// Positions must already be assigned by the packer; the buffer is fully
/// transparent wherever no sprite lands.
pub fn render_sheet(sprites: &[Sprite], width: u32, height: u32) -> Result<RgbaImage, RenderError> {
    let mut sheet = RgbaImage::new(width, height);
    for sprite in sprites {
        sheet.copy_from(&sprite.image.pixels, sprite.x, sprite.y)?;
    }
    Ok(sheet)
}
