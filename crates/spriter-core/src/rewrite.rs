//! Rewrites collected rules to point at their composite sheet.
//!
//! For every reference the owning declaration's URL is swapped for the sheet
//! URL, a `background-position` declaration is inserted right after it, any
//! pre-existing `background-size` is overwritten with the scaled sheet
//! width, and a trailing `background-size` covering the sprite's far edge is
//! appended. Offsets for high-density rules are halved: the sheet is packed
//! on the 2x pixel grid but displayed at CSS-pixel scale.

use regex::NoExpand;

use crate::collect::{url_regex, Reference};
use crate::pipeline::Sheet;
use crate::stylesheet::{Declaration, RuleId, Stylesheet};

/// Media condition that marks a rule as the high-density variant. Matched
/// literally; this exact string is the contract for opting into 2x handling.
pub const RETINA_QUERY: &str = "(-webkit-min-device-pixel-ratio: 1.5)";

fn is_retina(reference: &Reference) -> bool {
    reference
        .media
        .as_deref()
        .is_some_and(|media| media.contains(RETINA_QUERY))
}

fn offset(value: u32, pixel_ratio: f64) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("{}px", -((f64::from(value) / pixel_ratio).round() as i64))
    }
}

/// Point every reference at its sheet and inject position/size declarations.
///
/// Returns the rewritten rules in first-rewrite order, de-duplicated so a
/// rule holding several sprite references appears once.
pub fn rewrite_rules(stylesheet: &mut Stylesheet, sheets: &[Sheet]) -> Vec<RuleId> {
    let mut rules: Vec<RuleId> = Vec::new();

    for sheet in sheets {
        for sprite in &sheet.sprites {
            for background in &sprite.backgrounds {
                let pixel_ratio = if is_retina(background) { 2.0 } else { 1.0 };
                let Some(rule) = stylesheet.rule_mut(background.rule) else {
                    continue;
                };

                let declarations = std::mem::take(&mut rule.declarations);
                let mut rebuilt = Vec::with_capacity(declarations.len() + 2);
                for mut declaration in declarations {
                    let is_target = declaration.id() == Some(background.declaration);
                    if is_target {
                        declaration.value = url_regex()
                            .replace(
                                &declaration.value,
                                NoExpand(&format!("url({})", sheet.url)),
                            )
                            .into_owned();
                    } else if declaration.property == "background-size" {
                        declaration.value = format!(
                            "{}px auto",
                            (f64::from(sheet.width) / pixel_ratio).round() as i64
                        );
                    }
                    rebuilt.push(declaration);
                    if is_target {
                        rebuilt.push(Declaration::new(
                            "background-position",
                            format!(
                                "{} {}",
                                offset(sprite.x, pixel_ratio),
                                offset(sprite.y, pixel_ratio)
                            ),
                        ));
                    }
                }
                rebuilt.push(Declaration::new(
                    "background-size",
                    format!(
                        "{}px {}px",
                        sprite.x + sprite.width,
                        sprite.y + sprite.height
                    ),
                ));
                rule.declarations = rebuilt;

                if !rules.contains(&background.rule) {
                    rules.push(background.rule);
                }
            }
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::find_backgrounds;
    use crate::load::{LoadedImage, Sprite};
    use image::RgbaImage;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn sprite(x: u32, y: u32, width: u32, height: u32, backgrounds: Vec<Reference>) -> Sprite {
        Sprite {
            x,
            y,
            width,
            height,
            image: Arc::new(LoadedImage {
                url: backgrounds
                    .first()
                    .map(|b| b.url.clone())
                    .unwrap_or_default(),
                width,
                height,
                pixels: RgbaImage::new(width, height),
            }),
            backgrounds,
        }
    }

    #[test]
    fn test_url_swap_and_position_insertion() {
        let mut stylesheet =
            Stylesheet::parse(".a { background: url(a.png) no-repeat; color: red; }").unwrap();
        let refs = find_backgrounds(&stylesheet, None);
        let sheets = vec![Sheet {
            name: "s".into(),
            url: "out/s.png".into(),
            width: 48,
            height: 16,
            sprites: vec![sprite(16, 0, 16, 16, refs)],
        }];

        rewrite_rules(&mut stylesheet, &sheets);

        let css = stylesheet.to_css();
        assert_eq!(
            css,
            "\
.a {
  background: url(out/s.png) no-repeat;
  background-position: -16px 0;
  color: red;
  background-size: 32px 16px;
}
"
        );
    }

    #[test]
    fn test_zero_offsets_are_unitless() {
        let mut stylesheet = Stylesheet::parse(".a { background: url(a.png); }").unwrap();
        let refs = find_backgrounds(&stylesheet, None);
        let sheets = vec![Sheet {
            name: "s".into(),
            url: "s.png".into(),
            width: 16,
            height: 16,
            sprites: vec![sprite(0, 0, 16, 16, refs)],
        }];

        rewrite_rules(&mut stylesheet, &sheets);
        assert!(stylesheet.to_css().contains("background-position: 0 0;"));
    }

    #[test]
    fn test_density_variant_offsets_are_halved_and_rounded() {
        let css = "\
@media (-webkit-min-device-pixel-ratio: 1.5) {
  .a { background: url(a@2x.png); }
}";
        let mut stylesheet = Stylesheet::parse(css).unwrap();
        let refs = find_backgrounds(&stylesheet, None);
        let sheets = vec![Sheet {
            name: "s@2x".into(),
            url: "s@2x.png".into(),
            width: 65,
            height: 64,
            sprites: vec![sprite(33, 32, 32, 32, refs)],
        }];

        rewrite_rules(&mut stylesheet, &sheets);
        let out = stylesheet.to_css();
        // 33 / 2 = 16.5, rounds to 17; 32 / 2 = 16.
        assert!(out.contains("background-position: -17px -16px;"), "{out}");
        // Trailing size stays on the packed pixel grid.
        assert!(out.contains("background-size: 65px 64px;"), "{out}");
    }

    #[test]
    fn test_existing_background_size_is_overwritten() {
        let css = ".a { background: url(a.png); background-size: 10px 10px; }";
        let mut stylesheet = Stylesheet::parse(css).unwrap();
        let refs = find_backgrounds(&stylesheet, None);
        let sheets = vec![Sheet {
            name: "s".into(),
            url: "s.png".into(),
            width: 48,
            height: 16,
            sprites: vec![sprite(0, 0, 16, 16, refs)],
        }];

        rewrite_rules(&mut stylesheet, &sheets);
        let out = stylesheet.to_css();
        assert!(out.contains("background-size: 48px auto;"), "{out}");
        assert!(!out.contains("10px 10px"), "{out}");
    }

    #[test]
    fn test_unrelated_declarations_keep_their_order() {
        let css = ".a { margin: 0; background: url(a.png); padding: 1px; border: none; }";
        let mut stylesheet = Stylesheet::parse(css).unwrap();
        let refs = find_backgrounds(&stylesheet, None);
        let sheets = vec![Sheet {
            name: "s".into(),
            url: "s.png".into(),
            width: 16,
            height: 16,
            sprites: vec![sprite(0, 0, 16, 16, refs)],
        }];

        rewrite_rules(&mut stylesheet, &sheets);
        let out = stylesheet.to_css();
        let margin = out.find("margin").unwrap();
        let background = out.find("background").unwrap();
        let padding = out.find("padding").unwrap();
        let border = out.find("border").unwrap();
        assert!(margin < background && background < padding && padding < border);
    }

    #[test]
    fn test_rule_with_two_references_is_reported_once() {
        let css = ".a { background: url(a.png); background-image: url(b.png); }";
        let mut stylesheet = Stylesheet::parse(css).unwrap();
        let refs = find_backgrounds(&stylesheet, None);
        assert_eq!(refs.len(), 2);
        let sheets = vec![Sheet {
            name: "s".into(),
            url: "s.png".into(),
            width: 32,
            height: 16,
            sprites: vec![
                sprite(0, 0, 16, 16, vec![refs[0].clone()]),
                sprite(16, 0, 16, 16, vec![refs[1].clone()]),
            ],
        }];

        let rules = rewrite_rules(&mut stylesheet, &sheets);
        assert_eq!(rules.len(), 1);
    }
}
