//! Background-image reference collection.
//!
//! Walks the stylesheet tree (including nested media blocks) and records
//! every `background` / `background-image` declaration whose value carries a
//! `url(...)`, tagged with its owning rule, declaration, and enclosing media
//! condition. The traversal is read-only; mutation happens later in the
//! rewrite pass.

use std::sync::OnceLock;

use regex::Regex;

use crate::stylesheet::{DeclId, Item, RuleId, Stylesheet};

/// Matches the first `url(...)` in a declaration value. The capture is the
/// URL itself, with the optional `@<label>` density marker as group 2.
const URL_PATTERN: &str = r#"url\(['"]?((?:[^'"@)]+)(@[^.]+)?[^'"]*)['"]?\)"#;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(URL_PATTERN).expect("invalid regex pattern"))
}

/// One stylesheet declaration's pointer to a background image.
#[derive(Debug, Clone)]
pub struct Reference {
    /// URL as written in the declaration value.
    pub url: String,
    /// Owning rule.
    pub rule: RuleId,
    /// The declaration the URL was found in.
    pub declaration: DeclId,
    /// Innermost enclosing media condition, if any.
    pub media: Option<String>,
}

/// Collect every background-image reference in the stylesheet, in document
/// order. `filter` restricts the result to URLs containing the substring.
pub fn find_backgrounds(stylesheet: &Stylesheet, filter: Option<&str>) -> Vec<Reference> {
    let mut backgrounds = Vec::new();
    visit(&stylesheet.items, filter, None, &mut backgrounds);
    backgrounds
}

fn visit(
    items: &[Item],
    filter: Option<&str>,
    media: Option<&str>,
    backgrounds: &mut Vec<Reference>,
) {
    for item in items {
        match item {
            Item::Media(block) => {
                visit(&block.items, filter, Some(&block.condition), backgrounds);
            }
            Item::Rule(rule) => {
                for declaration in &rule.declarations {
                    if declaration.property != "background"
                        && declaration.property != "background-image"
                    {
                        continue;
                    }
                    // Declarations with no url(...) are ignored, not an error.
                    let Some(captures) = url_regex().captures(&declaration.value) else {
                        continue;
                    };
                    let url = captures[1].to_string();
                    if let Some(filter) = filter {
                        if !url.contains(filter) {
                            continue;
                        }
                    }
                    let Some(id) = declaration.id() else {
                        continue;
                    };
                    backgrounds.push(Reference {
                        url,
                        rule: rule.id(),
                        declaration: id,
                        media: media.map(str::to_string),
                    });
                }
            }
            Item::Other(_) => {}
        }
    }
}
