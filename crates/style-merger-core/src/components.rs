use log::warn;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::types::{ComponentId, ElementSummary};

/// Name shown for components whose name could not be resolved
pub const UNNAMED_COMPONENT: &str = "Unnamed Component";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDetails {
    pub id: ComponentId,
    pub name: String,
    pub root_element: Option<ElementSummary>,
}

/// Read-only browser over the site's component definitions
#[derive(Debug, Clone)]
pub struct ComponentExplorer {
    host: HostHandle,
}

impl ComponentExplorer {
    pub fn new(host: HostHandle) -> Self {
        Self { host }
    }

    /// All components with their names
    pub fn list(&self) -> Result<Vec<ComponentInfo>> {
        if !self.host.capabilities().components {
            return Err(Error::HostUnavailable(
                "the Designer API does not expose components".to_string(),
            ));
        }

        let ids = self.host.list_components()?;
        Ok(ids
            .into_par_iter()
            .map(|id| {
                let name = self.name_or_fallback(&id);
                ComponentInfo { id, name }
            })
            .collect())
    }

    /// Name and root element of one component
    pub fn details(&self, id: &ComponentId) -> Result<ComponentDetails> {
        if !self.list()?.iter().any(|c| &c.id == id) {
            return Err(Error::SelectionInvalid(format!(
                "Component {} could not be found.",
                id
            )));
        }

        Ok(ComponentDetails {
            id: id.clone(),
            name: self.name_or_fallback(id),
            root_element: self.host.component_root_element(id)?,
        })
    }

    fn name_or_fallback(&self, id: &ComponentId) -> String {
        self.host.component_name(id).unwrap_or_else(|e| {
            warn!("Error fetching name for component {}: {}", id, e);
            UNNAMED_COMPONENT.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Capabilities, Fault, MemoryHost, SiteSnapshot};
    use std::sync::Arc;

    fn site() -> SiteSnapshot {
        SiteSnapshot::default()
            .with_element("root-1", &[])
            .with_component("c1", Some("Navbar"), Some("root-1"))
            .with_component("c2", None, None)
    }

    fn explorer(host: MemoryHost) -> ComponentExplorer {
        ComponentExplorer::new(HostHandle::new(Arc::new(host), None))
    }

    #[test]
    fn test_list_falls_back_per_component() {
        let components = explorer(MemoryHost::new(site())).list().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name, "Navbar");
        assert_eq!(components[1].name, UNNAMED_COMPONENT);
    }

    #[test]
    fn test_name_fault_uses_fallback() {
        let host = MemoryHost::new(site());
        host.inject(Fault::ComponentName(ComponentId::new("c1")));
        let components = explorer(host).list().unwrap();
        assert_eq!(components[0].name, UNNAMED_COMPONENT);
    }

    #[test]
    fn test_details() {
        let explorer = explorer(MemoryHost::new(site()));
        let details = explorer.details(&ComponentId::new("c1")).unwrap();
        assert_eq!(details.name, "Navbar");
        assert_eq!(details.root_element.unwrap().id.as_str(), "root-1");

        assert!(explorer
            .details(&ComponentId::new("c2"))
            .unwrap()
            .root_element
            .is_none());
        assert!(matches!(
            explorer.details(&ComponentId::new("missing")),
            Err(Error::SelectionInvalid(_))
        ));
    }

    #[test]
    fn test_requires_component_capability() {
        let caps = Capabilities {
            components: false,
            ..Capabilities::all()
        };
        let host = MemoryHost::new(site()).with_capabilities(caps);
        assert!(matches!(
            explorer(host).list(),
            Err(Error::HostUnavailable(_))
        ));
    }
}
