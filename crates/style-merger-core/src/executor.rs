use log::{info, warn};

use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::logging::{log_host_error, log_style_modification};
use crate::planner::MergeRequest;
use crate::types::{ElementId, MergeReport, MergedStyle, StyleId};

/// One element moved from a duplicate to the base
#[derive(Debug)]
struct Repoint {
    element: ElementId,
    had_base: bool,
    /// A change to this element timed out and may still land
    unsettled: bool,
}

impl Repoint {
    fn new(element: &ElementId, had_base: bool) -> Self {
        Self {
            element: element.clone(),
            had_base,
            unsettled: false,
        }
    }
}

/// Flag the newest journal entry when a change timed out
fn track(journal: &mut [Repoint], result: Result<()>) -> Result<()> {
    if let (Err(Error::Timeout { .. }), Some(entry)) = (&result, journal.last_mut()) {
        entry.unsettled = true;
    }
    result
}

/// Repoints elements from duplicate styles to a base style and deletes the duplicates
#[derive(Debug, Clone)]
pub struct MergeExecutor {
    host: HostHandle,
    rollback_on_failure: bool,
}

impl MergeExecutor {
    pub fn new(host: HostHandle, rollback_on_failure: bool) -> Self {
        Self {
            host,
            rollback_on_failure,
        }
    }

    pub fn execute_request(&self, request: &MergeRequest) -> MergeReport {
        self.execute(&request.base().id, &request.target_ids())
    }

    /// Fold every target into `base`, one duplicate at a time.
    ///
    /// The first failing duplicate stops the batch. Duplicates merged before it
    /// stay merged and are listed in the report; element repoints made for the
    /// failing duplicate are undone when rollback is enabled.
    pub fn execute(&self, base: &StyleId, targets: &[StyleId]) -> MergeReport {
        let mut report = MergeReport {
            success: true,
            ..MergeReport::default()
        };

        for target in targets {
            let mut journal = Vec::new();
            match self.merge_one(base, target, &mut journal) {
                Ok(elements_repointed) => report.merged.push(MergedStyle {
                    style: target.clone(),
                    elements_repointed,
                }),
                Err(e) => {
                    let err = Error::MergeExecution {
                        style: target.clone(),
                        message: e.user_message(),
                    };
                    log_host_error("mergeStylesIntoBase", &err);

                    report.unsettled = journal
                        .iter()
                        .filter(|entry| entry.unsettled)
                        .map(|entry| entry.element.clone())
                        .collect();
                    if !report.unsettled.is_empty() {
                        warn!(
                            "{} element(s) have host changes that timed out and were left as is",
                            report.unsettled.len()
                        );
                    }

                    if self.rollback_on_failure && !journal.is_empty() {
                        report.rolled_back = self.roll_back(base, target, &journal);
                    }

                    report.success = false;
                    report.failed = Some(target.clone());
                    report.error = Some(err.to_string());
                    return report;
                }
            }
        }

        info!(
            "Merged {} style(s) into {}",
            report.merged.len(),
            base
        );
        report
    }

    fn merge_one(
        &self,
        base: &StyleId,
        duplicate: &StyleId,
        journal: &mut Vec<Repoint>,
    ) -> Result<usize> {
        if base == duplicate {
            return Err(Error::Validation(
                "cannot merge a style into itself".to_string(),
            ));
        }

        let elements = self.host.style_elements(duplicate)?;

        // Add before remove so an element never ends up without either style
        for element in &elements {
            let had_base = self.host.element_styles(element)?.contains(base);
            journal.push(Repoint::new(element, had_base));
            if !had_base {
                if let Err(e) = track(journal, self.host.add_element_style(element, base)) {
                    // Nothing changed yet unless the add is still in flight
                    if !matches!(e, Error::Timeout { .. }) {
                        journal.pop();
                    }
                    return Err(e);
                }
            }

            track(journal, self.host.remove_element_style(element, duplicate))?;
        }

        let remaining = self.host.style_elements(duplicate)?;
        if !remaining.is_empty() {
            return Err(Error::Validation(format!(
                "style is still referenced by {} element(s)",
                remaining.len()
            )));
        }

        if let Err(e) = self.host.remove_style(duplicate) {
            if matches!(e, Error::Timeout { .. }) {
                // The delete may still land; re-adding the duplicate would race it
                journal.iter_mut().for_each(|entry| entry.unsettled = true);
            }
            return Err(e);
        }
        log_style_modification(
            "merge",
            duplicate,
            Some(&format!("{} element(s) repointed to {}", elements.len(), base)),
        );
        Ok(elements.len())
    }

    /// Undo journaled repoints, newest first. Returns how many were undone.
    ///
    /// Each element is re-read before it is touched. Unsettled elements are
    /// skipped so they keep the base whatever the pending change does, and the
    /// base is only dropped once the duplicate is back on the element.
    fn roll_back(&self, base: &StyleId, duplicate: &StyleId, journal: &[Repoint]) -> usize {
        let mut undone = 0;
        for entry in journal.iter().rev().filter(|entry| !entry.unsettled) {
            let restored = (|| -> Result<()> {
                let current = self.host.element_styles(&entry.element)?;
                if !current.contains(duplicate) {
                    self.host.add_element_style(&entry.element, duplicate)?;
                }
                if !entry.had_base && current.contains(base) {
                    self.host.remove_element_style(&entry.element, base)?;
                }
                Ok(())
            })();

            match restored {
                Ok(()) => undone += 1,
                Err(e) => warn!(
                    "Could not restore {} on element {}: {}",
                    duplicate, entry.element, e
                ),
            }
        }

        log_style_modification(
            "rollback",
            duplicate,
            Some(&format!("{} of {} element(s) restored", undone, journal.len())),
        );
        undone
    }
}
