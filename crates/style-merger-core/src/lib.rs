//! Core functionality for finding and merging duplicate Webflow styles.
//!
//! This library provides the foundational components for style deduplication:
//! - Style discovery and prefix search against the Designer API
//! - Grouping of numbered copies (`Card`, `Card 1`, `Card 2`)
//! - Property-level comparison of styles
//! - Safe merging of duplicates into a base style
//! - Component browsing and custom code management

// -- External Dependencies --
use log::info;
use std::sync::Arc;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod comparator;
pub mod components;
pub mod config;
pub mod custom_code;
pub mod directory;
pub mod executor;
pub mod grouping;
pub mod host;
pub mod logging;
pub mod planner;
pub mod types;
pub mod workflow;

use comparator::StyleComparator;
use components::ComponentExplorer;
use directory::StyleDirectory;
use executor::MergeExecutor;
use host::{Capabilities, DesignerHost, HostHandle};
use planner::{MergePlanner, MergeRequest};
use workflow::WorkflowController;

/// Main entry point for the style merge tool
#[derive(Debug, Clone)]
pub struct StyleMerger {
    config: Config,
    host: HostHandle,
}

impl StyleMerger {
    /// Connect to a Designer host with the provided configuration
    pub fn new(host: Arc<dyn DesignerHost>, config: Config) -> Result<Self> {
        config.validate()?;
        let host = HostHandle::new(host, config.host_timeout());
        info!("Connected to Designer host: {:?}", host.capabilities());
        Ok(Self { config, host })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.host.capabilities()
    }

    pub fn directory(&self) -> StyleDirectory {
        StyleDirectory::new(
            self.host.clone(),
            self.config.unnamed_style_placeholder.clone(),
            self.config.search_limit,
        )
    }

    pub fn comparator(&self) -> StyleComparator {
        StyleComparator::new(self.host.clone())
    }

    pub fn planner(&self) -> MergePlanner {
        MergePlanner::new(self.comparator())
    }

    pub fn executor(&self) -> MergeExecutor {
        MergeExecutor::new(self.host.clone(), self.config.rollback_on_failure)
    }

    pub fn components(&self) -> ComponentExplorer {
        ComponentExplorer::new(self.host.clone())
    }

    /// A fresh controller for the search / compare / merge panel
    pub fn controller(&self) -> WorkflowController {
        WorkflowController::new(
            self.host.clone(),
            self.directory(),
            self.planner(),
            self.executor(),
        )
    }

    /// Discover every group of numbered duplicate styles in the site
    pub fn find_duplicates(&self) -> Result<Vec<StyleGroup>> {
        let styles = self
            .directory()
            .list_all()
            .map_err(|e| Error::Discovery(e.user_message()))?;
        let groups = grouping::group_by_base_name(&styles);
        info!(
            "Found {} duplicate group(s) among {} styles",
            groups.len(),
            styles.len()
        );
        Ok(groups)
    }

    /// Validate and plan a merge by style names, resolving against the live directory
    pub fn plan_by_name(&self, base: &str, targets: &[String]) -> Result<MergeRequest> {
        let available = self.directory().list_all()?;
        let resolve = |name: &str| {
            available
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.id.clone())
                .ok_or_else(|| Error::SelectionInvalid(format!("No style named {:?}", name)))
        };

        let base_id = resolve(base)?;
        let target_ids = targets
            .iter()
            .map(|name| resolve(name.as_str()))
            .collect::<Result<Vec<_>>>()?;

        self.planner().plan(Some(&base_id), &target_ids, &available)
    }
}
