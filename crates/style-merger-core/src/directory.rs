use log::{debug, warn};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::types::{NamedStyle, StyleId};

/// Enumerates the site's styles with freshly resolved names.
///
/// Names are never cached: every lookup goes back to the host, since a
/// designer may rename a style between two calls.
#[derive(Debug, Clone)]
pub struct StyleDirectory {
    host: HostHandle,
    placeholder: String,
    search_limit: usize,
}

impl StyleDirectory {
    pub fn new(host: HostHandle, placeholder: impl Into<String>, search_limit: usize) -> Self {
        Self {
            host,
            placeholder: placeholder.into(),
            search_limit,
        }
    }

    /// List every style in the site, in host order, annotated with its name
    pub fn list_all(&self) -> Result<Vec<NamedStyle>> {
        if !self.host.capabilities().styles {
            return Err(Error::HostUnavailable(
                "the Designer API does not expose styles".to_string(),
            ));
        }

        let ids = self.host.list_styles()?;
        debug!("Resolving names for {} styles", ids.len());

        // Unordered fan-out, ordered fan-in: collect keeps the host order
        let styles = ids
            .into_par_iter()
            .map(|id| {
                let name = match self.host.style_name(&id) {
                    Ok(name) => name,
                    Err(e) => {
                        warn!("Failed to resolve name for style {}: {}", id, e);
                        self.placeholder.clone()
                    }
                };
                NamedStyle { id, name }
            })
            .collect();

        Ok(styles)
    }

    /// Styles whose name starts with `query` (case-sensitive), capped at the search limit
    pub fn find_by_prefix(&self, query: &str) -> Result<Vec<NamedStyle>> {
        if query.trim().is_empty() {
            return Err(Error::Validation(
                "Please enter a base class name to search.".to_string(),
            ));
        }

        let matches: Vec<NamedStyle> = self
            .list_all()?
            .into_iter()
            .filter(|style| style.name.starts_with(query))
            .take(self.search_limit)
            .collect();

        debug!("Prefix search {:?} matched {} styles", query, matches.len());
        Ok(matches)
    }

    pub fn find_by_id(&self, id: &StyleId) -> Result<Option<NamedStyle>> {
        Ok(self.list_all()?.into_iter().find(|style| &style.id == id))
    }

    /// First style whose current name equals `name` exactly
    pub fn find_by_name(&self, name: &str) -> Result<Option<NamedStyle>> {
        Ok(self.list_all()?.into_iter().find(|style| style.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Capabilities, Fault, MemoryHost, SiteSnapshot};
    use crate::types::PropertyMap;
    use std::sync::Arc;

    fn directory_for(host: MemoryHost) -> StyleDirectory {
        StyleDirectory::new(HostHandle::new(Arc::new(host), None), "Unnamed Style", 20)
    }

    fn site_with(names: &[&str]) -> SiteSnapshot {
        names
            .iter()
            .enumerate()
            .fold(SiteSnapshot::default(), |site, (i, name)| {
                site.with_style(&format!("s{}", i), name, PropertyMap::new())
            })
    }

    #[test]
    fn test_list_all_keeps_host_order() {
        let directory = directory_for(MemoryHost::new(site_with(&["b", "a", "c"])));
        let names: Vec<_> = directory
            .list_all()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_name_failure_uses_placeholder() {
        let host = MemoryHost::new(site_with(&["Card", "Card 1"]));
        host.inject(Fault::StyleName(StyleId::new("s1")));
        let styles = directory_for(host).list_all().unwrap();

        assert_eq!(styles[0].name, "Card");
        assert_eq!(styles[1].name, "Unnamed Style");
        assert_eq!(styles[1].id, StyleId::new("s1"));
    }

    #[test]
    fn test_list_failure_is_an_error() {
        let host = MemoryHost::new(site_with(&["Card"]));
        host.inject(Fault::ListStyles);
        assert!(matches!(directory_for(host).list_all(), Err(Error::Host(_))));
    }

    #[test]
    fn test_missing_style_capability() {
        let host = MemoryHost::new(site_with(&["Card"])).with_capabilities(Capabilities::default());
        assert!(matches!(
            directory_for(host).list_all(),
            Err(Error::HostUnavailable(_))
        ));
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let directory = directory_for(MemoryHost::new(site_with(&["Card", "card 2", "Card 3"])));
        let names: Vec<_> = directory
            .find_by_prefix("Card")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Card", "Card 3"]);
    }

    #[test]
    fn test_prefix_results_are_capped() {
        let names: Vec<String> = (0..30).map(|i| format!("btn {}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let directory = directory_for(MemoryHost::new(site_with(&refs)));

        assert_eq!(directory.find_by_prefix("btn").unwrap().len(), 20);
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let directory = directory_for(MemoryHost::new(site_with(&["Card"])));
        assert!(matches!(
            directory.find_by_prefix("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_find_by_name_and_id() {
        let directory = directory_for(MemoryHost::new(site_with(&["Card", "Hero"])));
        let hero = directory.find_by_name("Hero").unwrap().unwrap();
        assert_eq!(hero.id, StyleId::new("s1"));
        assert_eq!(
            directory.find_by_id(&StyleId::new("s0")).unwrap().unwrap().name,
            "Card"
        );
        assert!(directory.find_by_name("Nope").unwrap().is_none());
    }
}
