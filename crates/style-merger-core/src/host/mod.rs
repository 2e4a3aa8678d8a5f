//! Capability seam to the Webflow Designer API.
//!
//! The Designer API is injected as a [`DesignerHost`] trait object rather than
//! reached through a global. Everything in the core talks to it through a
//! [`HostHandle`], which adds the configured call timeout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::types::{ComponentId, ElementId, ElementSummary, PropertyMap, StyleId};

mod memory;
mod timeout;

pub use memory::{Fault, MemoryHost, SiteSnapshot, StyleRecord, ElementRecord, ComponentRecord};
pub use timeout::execute_with_timeout;

pub type HostResult<T> = core::result::Result<T, HostError>;

/// Error categories reported by the Designer API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostErrorTag {
    DuplicateValue,
    ResourceMissing,
    InvalidTargetElement,
    Forbidden,
    /// Style is still applied to at least one element
    InUse,
    /// The host does not implement the operation
    Unsupported,
    Other,
}

/// Failure reported by a Designer API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub tag: HostErrorTag,
    pub message: String,
}

impl HostError {
    pub fn new(tag: HostErrorTag, message: impl Into<String>) -> Self {
        Self {
            tag,
            message: message.into(),
        }
    }

    pub fn missing(what: impl fmt::Display) -> Self {
        Self::new(HostErrorTag::ResourceMissing, format!("{} not found", what))
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::new(
            HostErrorTag::Unsupported,
            format!("{} is not supported by this host", operation),
        )
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(HostErrorTag::Other, message)
    }

    /// Message shown to the designer for this failure
    pub fn user_message(&self) -> String {
        match self.tag {
            HostErrorTag::DuplicateValue => "A variable with this name already exists.".to_string(),
            HostErrorTag::ResourceMissing => "The requested item could not be found.".to_string(),
            HostErrorTag::InvalidTargetElement => "Invalid element for this operation.".to_string(),
            HostErrorTag::Forbidden => {
                "Permission denied. Switch to Design Mode on the Main Branch.".to_string()
            }
            _ if self.message.is_empty() => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.tag, self.message)
    }
}

impl std::error::Error for HostError {}

/// What the connected host can do, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Styles can be listed, inspected and removed
    pub styles: bool,

    /// Elements can be queried and restyled
    pub elements: bool,

    /// Component definitions can be listed
    pub components: bool,

    /// The current user is in design mode on the main branch
    pub can_design: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            styles: true,
            elements: true,
            components: true,
            can_design: true,
        }
    }

    /// Whether style merging can run against this host
    pub fn can_merge(&self) -> bool {
        self.styles && self.elements && self.can_design
    }
}

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Operations the core needs from the Designer API
pub trait DesignerHost: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    fn list_styles(&self) -> HostResult<Vec<StyleId>>;

    fn style_name(&self, style: &StyleId) -> HostResult<String>;

    fn style_properties(&self, style: &StyleId) -> HostResult<PropertyMap>;

    /// Elements currently applying the style
    fn style_elements(&self, style: &StyleId) -> HostResult<Vec<ElementId>>;

    /// Ordered styles currently applied to the element
    fn element_styles(&self, element: &ElementId) -> HostResult<Vec<StyleId>>;

    fn add_element_style(&self, element: &ElementId, style: &StyleId) -> HostResult<()>;

    fn remove_element_style(&self, element: &ElementId, style: &StyleId) -> HostResult<()>;

    /// Delete a style from the site. Fails while any element still applies it.
    fn remove_style(&self, style: &StyleId) -> HostResult<()>;

    fn notify(&self, kind: NotifyKind, message: &str);

    fn list_components(&self) -> HostResult<Vec<ComponentId>> {
        Err(HostError::unsupported("listComponents"))
    }

    fn component_name(&self, _component: &ComponentId) -> HostResult<String> {
        Err(HostError::unsupported("getName"))
    }

    fn component_root_element(
        &self,
        _component: &ComponentId,
    ) -> HostResult<Option<ElementSummary>> {
        Err(HostError::unsupported("getRootElement"))
    }
}

/// Shared host reference plus the per-call timeout
#[derive(Clone)]
pub struct HostHandle {
    host: Arc<dyn DesignerHost>,
    timeout: Option<Duration>,
    capabilities: Capabilities,
}

impl HostHandle {
    /// Wrap a host, negotiating its capabilities once
    pub fn new(host: Arc<dyn DesignerHost>, timeout: Option<Duration>) -> Self {
        let capabilities = host.capabilities();
        log::debug!("Designer API capabilities: {:?}", capabilities);
        Self {
            host,
            timeout,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Run a host call, bounded by the configured timeout
    pub fn call<T, F>(&self, operation: &str, task: F) -> Result<T>
    where
        F: FnOnce(&dyn DesignerHost) -> HostResult<T> + Send + 'static,
        T: Send + 'static,
    {
        match self.timeout {
            None => Ok(task(self.host.as_ref())?),
            Some(timeout) => {
                let host = Arc::clone(&self.host);
                let result = execute_with_timeout(operation, timeout, move || task(host.as_ref()))?;
                Ok(result?)
            }
        }
    }

    pub fn notify(&self, kind: NotifyKind, message: &str) {
        self.host.notify(kind, message);
    }

    pub fn list_styles(&self) -> Result<Vec<StyleId>> {
        self.call("listStyles", |h| h.list_styles())
    }

    pub fn style_name(&self, style: &StyleId) -> Result<String> {
        let style = style.clone();
        self.call("getName", move |h| h.style_name(&style))
    }

    pub fn style_properties(&self, style: &StyleId) -> Result<PropertyMap> {
        let style = style.clone();
        self.call("getProperties", move |h| h.style_properties(&style))
    }

    pub fn style_elements(&self, style: &StyleId) -> Result<Vec<ElementId>> {
        let style = style.clone();
        self.call("getElements", move |h| h.style_elements(&style))
    }

    pub fn element_styles(&self, element: &ElementId) -> Result<Vec<StyleId>> {
        let element = element.clone();
        self.call("element.getStyles", move |h| h.element_styles(&element))
    }

    pub fn add_element_style(&self, element: &ElementId, style: &StyleId) -> Result<()> {
        let (element, style) = (element.clone(), style.clone());
        self.call("element.addStyle", move |h| h.add_element_style(&element, &style))
    }

    pub fn remove_element_style(&self, element: &ElementId, style: &StyleId) -> Result<()> {
        let (element, style) = (element.clone(), style.clone());
        self.call("element.removeStyle", move |h| h.remove_element_style(&element, &style))
    }

    pub fn remove_style(&self, style: &StyleId) -> Result<()> {
        let style = style.clone();
        self.call("removeStyle", move |h| h.remove_style(&style))
    }

    pub fn list_components(&self) -> Result<Vec<ComponentId>> {
        self.call("getAllComponents", |h| h.list_components())
    }

    pub fn component_name(&self, component: &ComponentId) -> Result<String> {
        let component = component.clone();
        self.call("getName", move |h| h.component_name(&component))
    }

    pub fn component_root_element(&self, component: &ComponentId) -> Result<Option<ElementSummary>> {
        let component = component.clone();
        self.call("getRootElement", move |h| h.component_root_element(&component))
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("timeout", &self.timeout)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_user_message_for_tags() {
        let forbidden = HostError::new(HostErrorTag::Forbidden, "nope");
        assert_eq!(
            forbidden.user_message(),
            "Permission denied. Switch to Design Mode on the Main Branch."
        );

        let other = HostError::other("");
        assert_eq!(
            other.user_message(),
            "An unexpected error occurred. Please try again."
        );

        let in_use = HostError::new(HostErrorTag::InUse, "style is in use");
        assert_eq!(in_use.user_message(), "style is in use");
    }

    #[test]
    fn test_handle_times_out_slow_call() {
        let host = MemoryHost::new(SiteSnapshot::default());
        host.inject(Fault::Delay(Duration::from_millis(500)));
        let handle = HostHandle::new(Arc::new(host), Some(Duration::from_millis(20)));

        let err = handle.list_styles().unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn test_handle_without_timeout_runs_inline() {
        let host = MemoryHost::new(SiteSnapshot::default());
        let handle = HostHandle::new(Arc::new(host), None);
        assert!(handle.list_styles().unwrap().is_empty());
    }
}
