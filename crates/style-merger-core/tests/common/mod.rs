#![allow(dead_code)]

use std::sync::Arc;

use style_merger_core::host::{MemoryHost, SiteSnapshot};
use style_merger_core::{Config, ElementId, PropertyMap, PropertyValue, StyleMerger};

/// Property map with a single `color` entry
pub fn color(value: &str) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("color".to_string(), PropertyValue::literal(value));
    props
}

/// Card styles: `Card` and `Card 1` are red, `Card 2` is blue, `Hero` is unrelated
pub fn card_site() -> SiteSnapshot {
    SiteSnapshot::default()
        .with_style("card", "Card", color("red"))
        .with_style("card-1", "Card 1", color("red"))
        .with_style("card-2", "Card 2", color("blue"))
        .with_style("hero", "Hero", color("green"))
}

/// Merger over an in-memory host, without call timeouts
pub fn merger_for(site: SiteSnapshot) -> (Arc<MemoryHost>, StyleMerger) {
    let host = Arc::new(MemoryHost::new(site));
    let config = Config {
        host_timeout_ms: None,
        ..Config::default()
    };
    let merger = StyleMerger::new(host.clone(), config).unwrap();
    (host, merger)
}

/// Names of the styles applied to an element
pub fn element_styles(host: &MemoryHost, element: &str) -> Vec<String> {
    host.snapshot()
        .element(&ElementId::new(element))
        .unwrap()
        .styles
        .iter()
        .map(|s| s.to_string())
        .collect()
}
