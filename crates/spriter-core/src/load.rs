//! Per-group image loading with URL deduplication.
//!
//! Each unique URL in a group is decoded exactly once; every reference
//! sharing the URL fans out to the same cached image. Decodes run on the
//! blocking pool with overlapping I/O, but results are folded back in
//! first-occurrence order so the sprite list is deterministic regardless of
//! completion timing. A failed load excludes that URL's sprite and is
//! reported as a diagnostic; it never aborts the rest of the group.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use crate::collect::Reference;

/// A decoded source image, shared by every sprite reference to its URL.
#[derive(Debug)]
pub struct LoadedImage {
    /// URL as written in the stylesheet.
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

/// One unique source image awaiting placement in a sheet.
#[derive(Debug)]
pub struct Sprite {
    /// Packed position, assigned after loading.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub image: Arc<LoadedImage>,
    /// Every stylesheet reference pointing at this image, in document order.
    pub backgrounds: Vec<Reference>,
}

/// Diagnostic for a source image that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    /// Resolved filesystem path that failed.
    pub path: PathBuf,
    /// Decoder or I/O error text.
    pub error: String,
}

/// Load every unique image referenced by a group.
///
/// Returns sprites in first-occurrence order of their URLs, with each
/// reference attached to its sprite, plus a diagnostic per failed URL.
pub async fn load_group(
    references: &[Reference],
    source_root: &Path,
) -> (Vec<Sprite>, Vec<LoadFailure>) {
    // Dedup by URL before issuing any load, so no URL is decoded twice.
    let mut unique: Vec<&str> = Vec::new();
    for reference in references {
        if !unique.contains(&reference.url.as_str()) {
            unique.push(&reference.url);
        }
    }

    let handles: Vec<_> = unique
        .iter()
        .map(|url| {
            let path = source_root.join(url);
            tokio::task::spawn_blocking(move || {
                let image = image::open(&path).map(|decoded| decoded.to_rgba8());
                (path, image)
            })
        })
        .collect();

    let mut sprites = Vec::new();
    let mut failures = Vec::new();
    // Ordered join: the Nth sprite corresponds to the Nth unique URL, no
    // matter which decode finishes first.
    let mut slots: HashMap<String, Option<usize>> = HashMap::new();
    for (url, handle) in unique.iter().zip(handles) {
        let result = match handle.await {
            Ok((_, Ok(pixels))) => {
                let (width, height) = pixels.dimensions();
                sprites.push(Sprite {
                    x: 0,
                    y: 0,
                    width,
                    height,
                    image: Arc::new(LoadedImage {
                        url: url.to_string(),
                        width,
                        height,
                        pixels,
                    }),
                    backgrounds: Vec::new(),
                });
                Some(sprites.len() - 1)
            }
            Ok((path, Err(error))) => {
                failures.push(LoadFailure {
                    path,
                    error: error.to_string(),
                });
                None
            }
            Err(join_error) => {
                failures.push(LoadFailure {
                    path: source_root.join(url),
                    error: join_error.to_string(),
                });
                None
            }
        };
        slots.insert(url.to_string(), result);
    }

    // Fan references out to their sprites, preserving group order.
    for reference in references {
        if let Some(Some(index)) = slots.get(reference.url.as_str()) {
            sprites[*index].backgrounds.push(reference.clone());
        }
    }

    (sprites, failures)
}
