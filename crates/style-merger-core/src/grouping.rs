use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::types::{NamedStyle, StyleGroup};

/// Trailing whitespace followed by digits, e.g. the ` 2` in `Card 2`
static NUMBERED_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[0-9]+$").expect("suffix pattern is valid"));

/// Name with a trailing ` <number>` suffix removed.
///
/// `"Card 2"` becomes `"Card"`, while `"Card2"` is left untouched because the
/// digits are not separated by whitespace.
pub fn base_name(name: &str) -> &str {
    match NUMBERED_SUFFIX.find(name) {
        Some(suffix) => &name[..suffix.start()],
        None => name,
    }
}

/// Groups styles sharing a base name.
///
/// Groups come back in the order their first member was discovered and keep
/// member discovery order. Groups with a single member are dropped.
pub fn group_by_base_name(styles: &[NamedStyle]) -> Vec<StyleGroup> {
    let mut groups: Vec<StyleGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for style in styles {
        let key = base_name(&style.name);
        match index.get(key) {
            Some(&i) => groups[i].styles.push(style.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(StyleGroup {
                    base_name: key.to_string(),
                    styles: vec![style.clone()],
                });
            }
        }
    }

    groups.retain(|group| group.styles.len() > 1);
    groups
}
