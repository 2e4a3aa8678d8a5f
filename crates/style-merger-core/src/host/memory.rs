use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::{Capabilities, DesignerHost, HostError, HostErrorTag, HostResult, NotifyKind};
use crate::error::Result;
use crate::types::{ComponentId, ElementId, ElementSummary, PropertyMap, StyleId};

/// A style as stored in a site snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub id: StyleId,
    pub name: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// A canvas element and its ordered style list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: ElementId,
    #[serde(rename = "type", default = "default_element_type")]
    pub element_type: String,
    #[serde(default)]
    pub styles: Vec<StyleId>,
}

fn default_element_type() -> String {
    "Block".to_string()
}

/// A component definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: ComponentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub root_element: Option<ElementId>,
}

/// Serializable view of one site's styles, elements and components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    #[serde(default)]
    pub styles: Vec<StyleRecord>,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl SiteSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Save the snapshot as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn with_style(mut self, id: &str, name: &str, properties: PropertyMap) -> Self {
        self.styles.push(StyleRecord {
            id: StyleId::new(id),
            name: name.to_string(),
            properties,
        });
        self
    }

    pub fn with_element(mut self, id: &str, styles: &[&str]) -> Self {
        self.elements.push(ElementRecord {
            id: ElementId::new(id),
            element_type: default_element_type(),
            styles: styles.iter().map(|s| StyleId::new(*s)).collect(),
        });
        self
    }

    pub fn with_component(mut self, id: &str, name: Option<&str>, root: Option<&str>) -> Self {
        self.components.push(ComponentRecord {
            id: ComponentId::new(id),
            name: name.map(str::to_string),
            root_element: root.map(ElementId::new),
        });
        self
    }

    pub fn style(&self, id: &StyleId) -> Option<&StyleRecord> {
        self.styles.iter().find(|s| &s.id == id)
    }

    pub fn element(&self, id: &ElementId) -> Option<&ElementRecord> {
        self.elements.iter().find(|e| &e.id == id)
    }
}

/// Failures the in-memory host can be told to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    ListStyles,
    StyleName(StyleId),
    StyleProperties(StyleId),
    StyleElements(StyleId),
    AddStyle(ElementId),
    RemoveElementStyle(ElementId),
    RemoveStyle(StyleId),
    ComponentName(ComponentId),
    /// Sleep before answering any call
    Delay(Duration),
    /// Sleep before answering calls to one operation, e.g. `"element.removeStyle"`
    DelayOn(&'static str, Duration),
}

/// Designer host backed by an in-memory site snapshot
#[derive(Debug)]
pub struct MemoryHost {
    site: Mutex<SiteSnapshot>,
    faults: Mutex<Vec<Fault>>,
    notifications: Mutex<Vec<(NotifyKind, String)>>,
    capabilities: Capabilities,
}

impl MemoryHost {
    pub fn new(site: SiteSnapshot) -> Self {
        Self {
            site: Mutex::new(site),
            faults: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            capabilities: Capabilities::all(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn inject(&self, fault: Fault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(fault);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    /// Copy of the current site state
    pub fn snapshot(&self) -> SiteSnapshot {
        self.site
            .lock()
            .map(|site| site.clone())
            .unwrap_or_default()
    }

    /// Notifications sent so far, oldest first
    pub fn notifications(&self) -> Vec<(NotifyKind, String)> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    fn site(&self) -> HostResult<MutexGuard<'_, SiteSnapshot>> {
        self.site
            .lock()
            .map_err(|_| HostError::other("site state poisoned"))
    }

    fn check(&self, operation: &str, matches: impl Fn(&Fault) -> bool) -> HostResult<()> {
        let faults = self
            .faults
            .lock()
            .map_err(|_| HostError::other("fault list poisoned"))?
            .clone();

        for fault in &faults {
            match fault {
                Fault::Delay(delay) => thread::sleep(*delay),
                Fault::DelayOn(op, delay) if *op == operation => thread::sleep(*delay),
                _ => {}
            }
        }

        if faults.iter().any(matches) {
            return Err(HostError::other(format!("{} failed (injected)", operation)));
        }
        Ok(())
    }
}

impl DesignerHost for MemoryHost {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn list_styles(&self) -> HostResult<Vec<StyleId>> {
        self.check("listStyles", |f| matches!(f, Fault::ListStyles))?;
        Ok(self.site()?.styles.iter().map(|s| s.id.clone()).collect())
    }

    fn style_name(&self, style: &StyleId) -> HostResult<String> {
        self.check("getName", |f| f == &Fault::StyleName(style.clone()))?;
        self.site()?
            .style(style)
            .map(|s| s.name.clone())
            .ok_or_else(|| HostError::missing(format!("style {}", style)))
    }

    fn style_properties(&self, style: &StyleId) -> HostResult<PropertyMap> {
        self.check("getProperties", |f| {
            f == &Fault::StyleProperties(style.clone())
        })?;
        self.site()?
            .style(style)
            .map(|s| s.properties.clone())
            .ok_or_else(|| HostError::missing(format!("style {}", style)))
    }

    fn style_elements(&self, style: &StyleId) -> HostResult<Vec<ElementId>> {
        self.check("getElements", |f| f == &Fault::StyleElements(style.clone()))?;
        let site = self.site()?;
        if site.style(style).is_none() {
            return Err(HostError::missing(format!("style {}", style)));
        }
        Ok(site
            .elements
            .iter()
            .filter(|e| e.styles.contains(style))
            .map(|e| e.id.clone())
            .collect())
    }

    fn element_styles(&self, element: &ElementId) -> HostResult<Vec<StyleId>> {
        self.check("element.getStyles", |_| false)?;
        self.site()?
            .element(element)
            .map(|e| e.styles.clone())
            .ok_or_else(|| HostError::missing(format!("element {}", element)))
    }

    fn add_element_style(&self, element: &ElementId, style: &StyleId) -> HostResult<()> {
        self.check("element.addStyle", |f| f == &Fault::AddStyle(element.clone()))?;
        let mut site = self.site()?;
        if site.style(style).is_none() {
            return Err(HostError::missing(format!("style {}", style)));
        }
        let record = site
            .elements
            .iter_mut()
            .find(|e| &e.id == element)
            .ok_or_else(|| HostError::missing(format!("element {}", element)))?;
        if !record.styles.contains(style) {
            record.styles.push(style.clone());
        }
        Ok(())
    }

    fn remove_element_style(&self, element: &ElementId, style: &StyleId) -> HostResult<()> {
        self.check("element.removeStyle", |f| {
            f == &Fault::RemoveElementStyle(element.clone())
        })?;
        let mut site = self.site()?;
        let record = site
            .elements
            .iter_mut()
            .find(|e| &e.id == element)
            .ok_or_else(|| HostError::missing(format!("element {}", element)))?;
        record.styles.retain(|s| s != style);
        Ok(())
    }

    fn remove_style(&self, style: &StyleId) -> HostResult<()> {
        self.check("removeStyle", |f| f == &Fault::RemoveStyle(style.clone()))?;
        let mut site = self.site()?;
        let position = site
            .styles
            .iter()
            .position(|s| &s.id == style)
            .ok_or_else(|| HostError::missing(format!("style {}", style)))?;

        let users = site
            .elements
            .iter()
            .filter(|e| e.styles.contains(style))
            .count();
        if users > 0 {
            return Err(HostError::new(
                HostErrorTag::InUse,
                format!("style {} is applied to {} element(s)", style, users),
            ));
        }

        site.styles.remove(position);
        Ok(())
    }

    fn notify(&self, kind: NotifyKind, message: &str) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push((kind, message.to_string()));
        }
    }

    fn list_components(&self) -> HostResult<Vec<ComponentId>> {
        self.check("getAllComponents", |_| false)?;
        Ok(self.site()?.components.iter().map(|c| c.id.clone()).collect())
    }

    fn component_name(&self, component: &ComponentId) -> HostResult<String> {
        self.check("getName", |f| f == &Fault::ComponentName(component.clone()))?;
        let site = self.site()?;
        let record = site
            .components
            .iter()
            .find(|c| &c.id == component)
            .ok_or_else(|| HostError::missing(format!("component {}", component)))?;
        record
            .name
            .clone()
            .ok_or_else(|| HostError::other(format!("component {} has no name", component)))
    }

    fn component_root_element(
        &self,
        component: &ComponentId,
    ) -> HostResult<Option<ElementSummary>> {
        self.check("getRootElement", |_| false)?;
        let site = self.site()?;
        let record = site
            .components
            .iter()
            .find(|c| &c.id == component)
            .ok_or_else(|| HostError::missing(format!("component {}", component)))?;

        Ok(record.root_element.as_ref().and_then(|root| {
            site.element(root).map(|e| ElementSummary {
                id: e.id.clone(),
                element_type: e.element_type.clone(),
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyValue;
    use tempfile::tempdir;

    fn site() -> SiteSnapshot {
        let mut props = PropertyMap::new();
        props.insert("color".into(), PropertyValue::literal("red"));
        SiteSnapshot::default()
            .with_style("s1", "Card", props)
            .with_element("e1", &["s1"])
    }

    #[test]
    fn test_remove_style_in_use_fails() {
        let host = MemoryHost::new(site());
        let err = host.remove_style(&StyleId::new("s1")).unwrap_err();
        assert_eq!(err.tag, HostErrorTag::InUse);
        assert_eq!(host.snapshot().styles.len(), 1);
    }

    #[test]
    fn test_add_style_is_idempotent() {
        let host = MemoryHost::new(site());
        let e1 = ElementId::new("e1");
        host.add_element_style(&e1, &StyleId::new("s1")).unwrap();
        assert_eq!(host.element_styles(&e1).unwrap(), vec![StyleId::new("s1")]);
    }

    #[test]
    fn test_unknown_style_is_missing() {
        let host = MemoryHost::new(site());
        let err = host.style_name(&StyleId::new("nope")).unwrap_err();
        assert_eq!(err.tag, HostErrorTag::ResourceMissing);
    }

    #[test]
    fn test_injected_fault() {
        let host = MemoryHost::new(site());
        host.inject(Fault::StyleName(StyleId::new("s1")));
        assert!(host.style_name(&StyleId::new("s1")).is_err());
        host.clear_faults();
        assert_eq!(host.style_name(&StyleId::new("s1")).unwrap(), "Card");
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("site.json");
        site().save_to_file(&path).unwrap();

        let loaded = SiteSnapshot::from_file(&path).unwrap();
        assert_eq!(loaded, site());
    }
}
