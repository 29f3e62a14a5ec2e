//! Shorthand cleanup for rewritten rules.
//!
//! Collapses the expanded `background-*` declarations a rewrite pass leaves
//! behind into a fixed, canonical ordering. Sprite composites are never
//! tiled, so `repeat` is forced to `no-repeat`, and sub-properties whose
//! value is the zero-offset token are dropped. Rules without enough
//! background information to re-assemble are left untouched.

use std::sync::OnceLock;

use regex::Regex;

use crate::stylesheet::{Declaration, RuleId, Stylesheet};

/// Background sub-property ordering per the CSS shorthand syntax.
const ORDER: [&str; 7] = [
    "color",
    "image",
    "position",
    "size",
    "repeat",
    "attachment",
    "clip",
];

/// Matches `no-repeat` and non-negative position pairs inside a bare
/// `background` value; those are re-emitted as their own sub-properties.
const POSITION_PATTERN: &str = r"\s*(?:no-repeat|(\d+)(?:px)?\s+(\d+)(?:px)?)";

static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();

fn position_regex() -> &'static Regex {
    POSITION_REGEX.get_or_init(|| Regex::new(POSITION_PATTERN).expect("invalid regex pattern"))
}

fn get<'a>(properties: &'a [(String, String)], key: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn set(properties: &mut Vec<(String, String)>, key: &str, value: String) {
    match properties.iter_mut().find(|(k, _)| k == key) {
        // Later declarations overwrite, but the key keeps its position.
        Some(entry) => entry.1 = value,
        None => properties.push((key.to_string(), value)),
    }
}

/// Re-assemble background declarations in each rule into canonical order.
///
/// A rule qualifies when it carries a bare `background` or both the `image`
/// and `position` sub-properties; other rules are excluded from the result
/// and not modified. Returns the ids of the rules actually optimized.
pub fn optimize_rules(stylesheet: &mut Stylesheet, rules: &[RuleId]) -> Vec<RuleId> {
    let mut optimized = Vec::new();

    for &id in rules {
        let Some(rule) = stylesheet.rule_mut(id) else {
            continue;
        };

        let mut properties: Vec<(String, String)> = Vec::new();
        for declaration in &rule.declarations {
            if !declaration.property.starts_with("background") {
                continue;
            }
            let key = if declaration.property == "background" {
                "background"
            } else {
                declaration
                    .property
                    .strip_prefix("background-")
                    .unwrap_or(&declaration.property)
            };
            set(&mut properties, key, declaration.value.clone());
        }

        let applicable = get(&properties, "background").is_some()
            || (get(&properties, "image").is_some() && get(&properties, "position").is_some());
        if !applicable {
            continue;
        }

        set(&mut properties, "repeat", "no-repeat".to_string());

        let mut declarations: Vec<Declaration> = std::mem::take(&mut rule.declarations)
            .into_iter()
            .filter(|declaration| !declaration.property.starts_with("background"))
            .collect();

        // Bare `background` and unknown sub-properties lead, then the fixed
        // shorthand ordering.
        let mut emit: Vec<(&str, &str)> = Vec::new();
        for (key, value) in &properties {
            if key == "background" || !ORDER.contains(&key.as_str()) {
                emit.push((key.as_str(), value.as_str()));
            }
        }
        for target in ORDER {
            if let Some(value) = get(&properties, target) {
                emit.push((target, value));
            }
        }

        for (key, value) in emit {
            if value == "0 0" {
                continue;
            }
            let (property, value) = if key == "background" {
                (
                    "background".to_string(),
                    position_regex().replace_all(value, "").into_owned(),
                )
            } else {
                (format!("background-{key}"), value.to_string())
            };
            declarations.push(Declaration::new(property, value));
        }

        rule.declarations = declarations;
        optimized.push(id);
    }

    optimized
}
