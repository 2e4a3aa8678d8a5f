//! Search, select, compare, confirm and merge, as one state machine.
//!
//! The controller exclusively owns the transient state behind the style merge
//! panel. Every operation reports failures through an [`ActionResult`] and the
//! `error` field; nothing is returned as `Err`.

use log::{debug, info};
use serde::Serialize;

use crate::directory::StyleDirectory;
use crate::error::Error;
use crate::executor::MergeExecutor;
use crate::grouping::group_by_base_name;
use crate::host::{HostHandle, NotifyKind};
use crate::planner::{MergePlanner, MergeRequest, TargetDifferences};
use crate::types::{ActionResult, MergeReport, NamedStyle, StyleGroup, StyleId};

pub const MERGE_SUCCESS_MESSAGE: &str = "Styles merged successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowState {
    Idle,
    Searching,
    Results,
    Comparing,
    ConfirmPending,
    Merging,
    Error,
}

/// Base and target choice. A style is the base XOR a target, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    base: Option<StyleId>,
    targets: Vec<StyleId>,
}

impl Selection {
    pub fn base(&self) -> Option<&StyleId> {
        self.base.as_ref()
    }

    pub fn targets(&self) -> &[StyleId] {
        &self.targets
    }

    pub fn is_target(&self, id: &StyleId) -> bool {
        self.targets.contains(id)
    }

    /// Choose the style to keep, dropping it from the targets
    pub fn select_base(&mut self, id: StyleId) {
        self.targets.retain(|t| t != &id);
        self.base = Some(id);
    }

    /// Flip target membership; a base toggled into the targets stops being the base
    pub fn toggle_target(&mut self, id: StyleId) {
        if let Some(position) = self.targets.iter().position(|t| t == &id) {
            self.targets.remove(position);
            return;
        }
        if self.base.as_ref() == Some(&id) {
            self.base = None;
        }
        self.targets.push(id);
    }

    /// Make every offered style except the base a target, or clear the targets
    pub fn select_all_targets(&mut self, offered: &[NamedStyle], selected: bool) {
        self.targets = if selected {
            offered
                .iter()
                .filter(|s| self.base.as_ref() != Some(&s.id))
                .map(|s| s.id.clone())
                .collect()
        } else {
            Vec::new()
        };
    }

    pub fn clear(&mut self) {
        self.base = None;
        self.targets.clear();
    }
}

/// Drives the style merge panel
#[derive(Debug)]
pub struct WorkflowController {
    host: HostHandle,
    directory: StyleDirectory,
    planner: MergePlanner,
    executor: MergeExecutor,

    state: WorkflowState,
    query: String,
    results: Vec<NamedStyle>,
    selection: Selection,
    pending: Option<MergeRequest>,
    differences: Vec<TargetDifferences>,
    error: Option<String>,
    notice: Option<String>,
    last_report: Option<MergeReport>,
}

impl WorkflowController {
    pub fn new(
        host: HostHandle,
        directory: StyleDirectory,
        planner: MergePlanner,
        executor: MergeExecutor,
    ) -> Self {
        Self {
            host,
            directory,
            planner,
            executor,
            state: WorkflowState::Idle,
            query: String::new(),
            results: Vec::new(),
            selection: Selection::default(),
            pending: None,
            differences: Vec::new(),
            error: None,
            notice: None,
            last_report: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[NamedStyle] {
        &self.results
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pending(&self) -> Option<&MergeRequest> {
        self.pending.as_ref()
    }

    /// Why the pending merge needs confirmation
    pub fn differences(&self) -> &[TargetDifferences] {
        &self.differences
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Empty-state text for a search that found nothing
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn last_report(&self) -> Option<&MergeReport> {
        self.last_report.as_ref()
    }

    /// Whether the merge control should be enabled
    pub fn can_merge(&self) -> bool {
        self.state != WorkflowState::Merging
            && self.selection.base.is_some()
            && !self.selection.targets.is_empty()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    fn transition(&mut self, next: WorkflowState) {
        if self.state != next {
            debug!("Workflow {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn fail(&mut self, next: WorkflowState, message: String) -> ActionResult {
        self.error = Some(message.clone());
        self.transition(next);
        ActionResult::failed(message)
    }

    /// Find styles whose name starts with the current query
    pub fn search(&mut self) -> ActionResult {
        if self.state == WorkflowState::Merging {
            return ActionResult::failed("A merge is already in progress.");
        }
        if self.query.trim().is_empty() {
            let state = self.state;
            return self.fail(
                state,
                "Please enter a base class name to search.".to_string(),
            );
        }

        self.transition(WorkflowState::Searching);
        self.error = None;
        self.notice = None;
        self.results.clear();
        self.selection.clear();
        self.pending = None;
        self.differences.clear();

        match self.directory.find_by_prefix(&self.query) {
            Ok(found) => {
                if found.is_empty() {
                    self.notice = Some(format!("No styles found starting with \"{}\".", self.query));
                }
                self.results = found;
                self.transition(WorkflowState::Results);
                ActionResult::ok()
            }
            Err(e) => self.fail(
                WorkflowState::Error,
                format!("Failed to search for styles: {}", e.user_message()),
            ),
        }
    }

    pub fn select_base(&mut self, id: StyleId) {
        if self.state != WorkflowState::Merging {
            self.selection.select_base(id);
            self.drop_pending();
        }
    }

    pub fn toggle_target(&mut self, id: StyleId) {
        if self.state != WorkflowState::Merging {
            self.selection.toggle_target(id);
            self.drop_pending();
        }
    }

    pub fn select_all_targets(&mut self, selected: bool) {
        if self.state != WorkflowState::Merging {
            self.selection.select_all_targets(&self.results, selected);
            self.drop_pending();
        }
    }

    /// A changed selection invalidates the merge awaiting confirmation
    fn drop_pending(&mut self) {
        if self.state == WorkflowState::ConfirmPending {
            debug!("Selection changed, discarding pending merge");
            self.pending = None;
            self.differences.clear();
            self.transition(WorkflowState::Results);
        }
    }

    /// Validate the selection and merge it, or wait for confirmation if styles differ
    pub fn request_merge(&mut self) -> ActionResult {
        if self.state == WorkflowState::Merging {
            return ActionResult::failed("A merge is already in progress.");
        }

        let request = match self.planner.plan(
            self.selection.base.as_ref(),
            &self.selection.targets,
            &self.results,
        ) {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message());
                return ActionResult::failed(e.user_message());
            }
        };

        self.transition(WorkflowState::Comparing);
        self.error = None;

        if self.planner.needs_confirmation(&request) {
            self.differences = self.planner.differences(&request).unwrap_or_else(|e| {
                debug!("Could not list differences: {}", e);
                Vec::new()
            });
            self.pending = Some(request);
            self.transition(WorkflowState::ConfirmPending);
            return ActionResult::ok();
        }

        // Identical styles merge straight away
        self.perform_merge(request)
    }

    /// Proceed with a merge that was waiting for confirmation
    pub fn confirm_merge(&mut self) -> ActionResult {
        if self.state != WorkflowState::ConfirmPending {
            return ActionResult::failed("There is no merge waiting for confirmation.");
        }
        match self.pending.take() {
            Some(request) => self.perform_merge(request),
            None => {
                self.transition(WorkflowState::Results);
                ActionResult::failed("There is no merge waiting for confirmation.")
            }
        }
    }

    /// Dismiss the confirmation and keep the current results
    pub fn cancel_merge(&mut self) {
        if self.state == WorkflowState::ConfirmPending {
            self.pending = None;
            self.differences.clear();
            self.transition(WorkflowState::Results);
        }
    }

    fn perform_merge(&mut self, request: MergeRequest) -> ActionResult {
        self.transition(WorkflowState::Merging);
        self.differences.clear();
        info!(
            "Merging {} style(s) into {:?}",
            request.targets().len(),
            request.base().name
        );

        let report = self.executor.execute_request(&request);
        let outcome = if report.success {
            self.transition(WorkflowState::Idle);
            self.host.notify(NotifyKind::Success, MERGE_SUCCESS_MESSAGE);
            // Refresh so removed duplicates disappear from the results
            let refresh = self.search();
            if !refresh.success {
                self.error = None;
                self.notice = Some(format!(
                    "Styles were merged but the list could not be refreshed: {}",
                    refresh.error.unwrap_or_default()
                ));
                self.transition(WorkflowState::Idle);
            }
            ActionResult::ok()
        } else {
            let message = report
                .error
                .clone()
                .unwrap_or_else(|| "Failed to merge styles.".to_string());
            // Results and selection stay so the user can retry
            self.fail(WorkflowState::Error, message)
        };

        self.last_report = Some(report);
        outcome
    }

    /// Groups of styles that look like numbered copies of each other.
    ///
    /// On failure the error is recorded and no groups are returned.
    pub fn find_duplicates(&mut self) -> Vec<StyleGroup> {
        match self.directory.list_all() {
            Ok(styles) => {
                self.error = None;
                group_by_base_name(&styles)
            }
            Err(e) => {
                self.error = Some(duplicate_error(&e));
                Vec::new()
            }
        }
    }
}

fn duplicate_error(e: &Error) -> String {
    Error::Discovery(e.user_message()).to_string()
}
