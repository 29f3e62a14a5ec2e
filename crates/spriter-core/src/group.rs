//! Partitioning of references into per-sheet groups.
//!
//! A density marker in the URL (an `@` token before the extension dot, e.g.
//! `logo@2x.png`) routes a reference into a variant group whose name is the
//! base sheet name plus the marker. This is how one stylesheet yields a
//! standard sheet and a matching high-density sheet without bookkeeping.

use std::sync::OnceLock;

use regex::Regex;

use crate::collect::Reference;

/// Matches the `@<label>` density marker immediately before an extension dot.
const DENSITY_PATTERN: &str = r"(@\w+)\.";

static DENSITY_REGEX: OnceLock<Regex> = OnceLock::new();

fn density_regex() -> &'static Regex {
    DENSITY_REGEX.get_or_init(|| Regex::new(DENSITY_PATTERN).expect("invalid regex pattern"))
}

/// An ordered set of references destined for one output sheet.
#[derive(Debug)]
pub struct Group {
    /// Sheet name: the base name, suffixed by the density marker if any.
    pub name: String,
    pub references: Vec<Reference>,
}

/// Partition references by density marker, preserving insertion order both
/// across groups (first-seen group first) and within each group.
pub fn group_backgrounds(backgrounds: Vec<Reference>, sheet_name: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for background in backgrounds {
        let marker = density_regex()
            .captures(&background.url)
            .map(|captures| captures[1].to_string());
        let name = match marker {
            Some(marker) => format!("{sheet_name}{marker}"),
            None => sheet_name.to_string(),
        };
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => group.references.push(background),
            None => groups.push(Group {
                name,
                references: vec![background],
            }),
        }
    }
    groups
}
