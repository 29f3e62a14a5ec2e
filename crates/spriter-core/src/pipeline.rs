//! End-to-end sprite generation pipeline.
//!
//! Collect references, partition them into per-sheet groups, then for each
//! group in turn: load, pack, render, persist. Groups run to completion one
//! at a time, which bounds peak memory to a single group's image set. Only
//! once every sheet exists are the stylesheet rules rewritten (and
//! optionally optimized) against the full sheet list.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::collect::find_backgrounds;
use crate::load::{load_group, LoadFailure, Sprite};
use crate::optimize::optimize_rules;
use crate::png::{write_rgba, PngConfig, PngError};
use crate::render::{render_sheet, RenderError};
use crate::rewrite::rewrite_rules;
use crate::stylesheet::Stylesheet;
use crate::{group, packer};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory background URLs resolve against; sheets are written under
    /// it too.
    pub source_root: PathBuf,
    /// Output path whose stem seeds the sheet group name and whose parent
    /// is where generated sheets land (relative to `source_root`).
    pub target: PathBuf,
    /// Restrict processing to URLs containing this substring.
    pub filter: Option<String>,
    /// Run the shorthand optimizer after rewriting.
    pub optimize: bool,
}

/// One composite sheet: output URL, dimensions, and placed sprites.
#[derive(Debug)]
pub struct Sheet {
    pub name: String,
    /// URL written into rewritten declarations, relative to `source_root`.
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub sprites: Vec<Sprite>,
}

/// Summary of one emitted sheet.
#[derive(Debug, Clone)]
pub struct SheetSummary {
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Number of sprites placed in the sheet.
    pub sprites: usize,
}

/// What a pipeline run produced, including contained load failures.
#[derive(Debug)]
pub struct Report {
    pub sheets: Vec<SheetSummary>,
    /// Images that could not be loaded; their references were dropped.
    pub failures: Vec<LoadFailure>,
}

/// Errors that abort a pipeline run.
///
/// Individual image-load failures are not among them; those are contained
/// per reference and reported through [`Report::failures`].
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Target path has no usable file stem to name the sheets after.
    #[error("invalid target path: {0}")]
    InvalidTarget(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Png(#[from] PngError),
}

/// Run the full pipeline over a parsed stylesheet, mutating it in place.
pub async fn generate(
    stylesheet: &mut Stylesheet,
    options: &Options,
) -> Result<Report, GenerateError> {
    let base_name = options
        .target
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| GenerateError::InvalidTarget(options.target.clone()))?;
    let target_dir = options
        .target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let backgrounds = find_backgrounds(stylesheet, options.filter.as_deref());
    let groups = group::group_backgrounds(backgrounds, base_name);

    std::fs::create_dir_all(options.source_root.join(&target_dir))?;

    let mut sheets = Vec::new();
    let mut failures = Vec::new();
    for group in groups {
        // A later group's loads must not begin before this sheet is on disk.
        let (mut sprites, group_failures) =
            load_group(&group.references, &options.source_root).await;
        failures.extend(group_failures);

        let rects: Vec<(u32, u32)> = sprites
            .iter()
            .map(|sprite| (sprite.width, sprite.height))
            .collect();
        let packed = packer::pack(&rects);
        for (sprite, placement) in sprites.iter_mut().zip(&packed.placements) {
            sprite.x = placement.x;
            sprite.y = placement.y;
        }

        let relative = target_dir.join(format!("{}.png", group.name));
        if !sprites.is_empty() {
            let buffer = render_sheet(&sprites, packed.width, packed.height)?;
            write_rgba(
                &buffer,
                &options.source_root.join(&relative),
                &PngConfig::default(),
            )?;
        }
        sheets.push(Sheet {
            name: group.name,
            url: relative.to_string_lossy().into_owned(),
            width: packed.width,
            height: packed.height,
            sprites,
        });
    }

    let rules = rewrite_rules(stylesheet, &sheets);
    if options.optimize {
        optimize_rules(stylesheet, &rules);
    }

    Ok(Report {
        sheets: sheets
            .into_iter()
            .map(|sheet| SheetSummary {
                name: sheet.name,
                url: sheet.url,
                width: sheet.width,
                height: sheet.height,
                sprites: sheet.sprites.len(),
            })
            .collect(),
        failures,
    })
}
