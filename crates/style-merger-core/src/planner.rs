use log::{debug, info};
use serde::Serialize;

use crate::comparator::StyleComparator;
use crate::error::{Error, Result};
use crate::types::{NamedStyle, PropertyDifference, StyleId};

/// A validated request to fold `targets` into `base`.
///
/// Only [`MergePlanner::plan`] builds one, so a request always has a base that
/// is not among its targets and at least one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRequest {
    base: NamedStyle,
    targets: Vec<NamedStyle>,
}

impl MergeRequest {
    pub fn base(&self) -> &NamedStyle {
        &self.base
    }

    pub fn targets(&self) -> &[NamedStyle] {
        &self.targets
    }

    pub fn target_ids(&self) -> Vec<StyleId> {
        self.targets.iter().map(|t| t.id.clone()).collect()
    }
}

/// Target style whose properties differ from the base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetDifferences {
    pub target: NamedStyle,
    pub differences: Vec<PropertyDifference>,
}

/// Validates merge selections and decides whether they need confirmation
#[derive(Debug, Clone)]
pub struct MergePlanner {
    comparator: StyleComparator,
}

impl MergePlanner {
    pub fn new(comparator: StyleComparator) -> Self {
        Self { comparator }
    }

    /// Validate a selection against the styles currently on offer
    pub fn plan(
        &self,
        base_id: Option<&StyleId>,
        target_ids: &[StyleId],
        available: &[NamedStyle],
    ) -> Result<MergeRequest> {
        let base_id = match base_id {
            Some(id) if !target_ids.is_empty() => id,
            _ => {
                return Err(Error::Validation(
                    "Please select a source style to keep and at least one target style to merge."
                        .to_string(),
                ))
            }
        };

        if target_ids.contains(base_id) {
            return Err(Error::Validation(
                "A style cannot be both the source and a merge target.".to_string(),
            ));
        }

        let resolve = |id: &StyleId| {
            available.iter().find(|s| &s.id == id).cloned().ok_or_else(|| {
                Error::SelectionInvalid(
                    "Could not find the selected styles. Please try searching again.".to_string(),
                )
            })
        };

        let base = resolve(base_id)?;
        let mut targets: Vec<NamedStyle> = Vec::with_capacity(target_ids.len());
        for id in target_ids {
            if targets.iter().any(|t| &t.id == id) {
                continue;
            }
            targets.push(resolve(id)?);
        }

        info!(
            "Planned merge of {} style(s) into {:?}",
            targets.len(),
            base.name
        );
        Ok(MergeRequest { base, targets })
    }

    /// Whether any target differs from the base.
    ///
    /// Targets are compared one at a time and the check stops at the first
    /// mismatch. A comparison that fails counts as a mismatch.
    pub fn needs_confirmation(&self, request: &MergeRequest) -> bool {
        let mismatch = request
            .targets
            .iter()
            .find(|target| !self.comparator.are_equal(&request.base.id, &target.id));

        match mismatch {
            Some(target) => {
                debug!(
                    "{:?} differs from {:?}; confirmation required",
                    target.name, request.base.name
                );
                true
            }
            None => false,
        }
    }

    /// Differences for every target that does not match the base
    pub fn differences(&self, request: &MergeRequest) -> Result<Vec<TargetDifferences>> {
        let mut report = Vec::new();
        for target in &request.targets {
            let differences = self.comparator.differences(&request.base.id, &target.id)?;
            if !differences.is_empty() {
                report.push(TargetDifferences {
                    target: target.clone(),
                    differences,
                });
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Fault, HostHandle, MemoryHost, SiteSnapshot};
    use crate::types::{PropertyMap, PropertyValue};
    use std::sync::Arc;

    fn color(value: &str) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("color".into(), PropertyValue::literal(value));
        props
    }

    fn setup() -> (Arc<MemoryHost>, MergePlanner, Vec<NamedStyle>) {
        let site = SiteSnapshot::default()
            .with_style("base", "Card", color("red"))
            .with_style("same", "Card 1", color("red"))
            .with_style("diff", "Card 2", color("blue"));
        let host = Arc::new(MemoryHost::new(site));
        let planner = MergePlanner::new(StyleComparator::new(HostHandle::new(host.clone(), None)));
        let available = vec![
            NamedStyle::new("base", "Card"),
            NamedStyle::new("same", "Card 1"),
            NamedStyle::new("diff", "Card 2"),
        ];
        (host, planner, available)
    }

    fn ids(ids: &[&str]) -> Vec<StyleId> {
        ids.iter().map(|id| StyleId::new(*id)).collect()
    }

    #[test]
    fn test_missing_base_or_targets() {
        let (_, planner, available) = setup();
        assert!(matches!(
            planner.plan(None, &ids(&["same"]), &available),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            planner.plan(Some(&StyleId::new("base")), &[], &available),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_base_among_targets_is_rejected() {
        let (_, planner, available) = setup();
        let result = planner.plan(
            Some(&StyleId::new("base")),
            &ids(&["same", "base"]),
            &available,
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_unknown_id_is_selection_invalid() {
        let (_, planner, available) = setup();
        let result = planner.plan(Some(&StyleId::new("base")), &ids(&["gone"]), &available);
        assert!(matches!(result, Err(Error::SelectionInvalid(_))));
    }

    #[test]
    fn test_duplicate_targets_collapse() {
        let (_, planner, available) = setup();
        let request = planner
            .plan(
                Some(&StyleId::new("base")),
                &ids(&["diff", "same", "diff"]),
                &available,
            )
            .unwrap();
        assert_eq!(request.target_ids(), ids(&["diff", "same"]));
        assert_eq!(request.base().name, "Card");
    }

    #[test]
    fn test_identical_targets_need_no_confirmation() {
        let (_, planner, available) = setup();
        let request = planner
            .plan(Some(&StyleId::new("base")), &ids(&["same"]), &available)
            .unwrap();
        assert!(!planner.needs_confirmation(&request));
        assert!(planner.differences(&request).unwrap().is_empty());
    }

    #[test]
    fn test_any_difference_needs_confirmation() {
        let (_, planner, available) = setup();
        let request = planner
            .plan(
                Some(&StyleId::new("base")),
                &ids(&["same", "diff"]),
                &available,
            )
            .unwrap();
        assert!(planner.needs_confirmation(&request));

        let report = planner.differences(&request).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].target.name, "Card 2");
    }

    #[test]
    fn test_unreadable_target_needs_confirmation() {
        let (host, planner, available) = setup();
        host.inject(Fault::StyleProperties(StyleId::new("same")));
        let request = planner
            .plan(Some(&StyleId::new("base")), &ids(&["same"]), &available)
            .unwrap();
        assert!(planner.needs_confirmation(&request));
    }
}
