use log::{debug, warn};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::types::{PropertyDifference, PropertyMap, StyleId};

/// Key-wise equality of two property maps, independent of key order
pub fn properties_equal(a: &PropertyMap, b: &PropertyMap) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(property, value)| b.get(property).map_or(false, |other| other == value))
}

/// Every property whose value differs between `base` and `other`, sorted by name
pub fn property_differences(base: &PropertyMap, other: &PropertyMap) -> Vec<PropertyDifference> {
    let keys: BTreeSet<&String> = base.keys().chain(other.keys()).collect();

    keys.into_iter()
        .filter_map(|property| {
            let left = base.get(property);
            let right = other.get(property);
            (left != right).then(|| PropertyDifference {
                property: property.clone(),
                base: left.cloned(),
                other: right.cloned(),
            })
        })
        .collect()
}

/// Decides whether two styles carry identical properties
#[derive(Debug, Clone)]
pub struct StyleComparator {
    host: HostHandle,
}

impl StyleComparator {
    pub fn new(host: HostHandle) -> Self {
        Self { host }
    }

    /// Whether both styles have identical property maps.
    ///
    /// Never fails: if either style cannot be read the styles are reported as
    /// different, so callers fall back to asking for confirmation.
    pub fn are_equal(&self, a: &StyleId, b: &StyleId) -> bool {
        match self.fetch_pair(a, b) {
            Ok((left, right)) => {
                let equal = a == b || properties_equal(&left, &right);
                debug!("Compared {} and {}: equal = {}", a, b, equal);
                equal
            }
            Err(e) => {
                warn!("{}; treating {} and {} as different", e, a, b);
                false
            }
        }
    }

    /// Property-level differences between `base` and `other`
    pub fn differences(&self, base: &StyleId, other: &StyleId) -> Result<Vec<PropertyDifference>> {
        let (left, right) = self.fetch_pair(base, other)?;
        Ok(property_differences(&left, &right))
    }

    fn fetch_pair(&self, a: &StyleId, b: &StyleId) -> Result<(PropertyMap, PropertyMap)> {
        let fetch = |id: &StyleId| {
            self.host
                .style_properties(id)
                .map_err(|e| Error::Comparison(format!("could not read properties of {}: {}", id, e)))
        };
        Ok((fetch(a)?, fetch(b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Fault, MemoryHost, SiteSnapshot};
    use crate::types::PropertyValue;
    use std::sync::Arc;

    fn props(pairs: &[(&str, PropertyValue)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn comparator(host: Arc<MemoryHost>) -> StyleComparator {
        StyleComparator::new(HostHandle::new(host, None))
    }

    fn site() -> SiteSnapshot {
        let red = props(&[
            ("color", PropertyValue::literal("red")),
            ("margin", PropertyValue::literal("4px")),
        ]);
        let blue = props(&[("color", PropertyValue::literal("blue"))]);
        let var = props(&[("color", PropertyValue::variable("brand"))]);
        SiteSnapshot::default()
            .with_style("a", "Card", red.clone())
            .with_style("b", "Card 1", red)
            .with_style("c", "Card 2", blue)
            .with_style("d", "Card 3", var)
            .with_style("e", "Empty", PropertyMap::new())
    }

    #[test]
    fn test_equal_styles() {
        let cmp = comparator(Arc::new(MemoryHost::new(site())));
        assert!(cmp.are_equal(&"a".into(), &"b".into()));
    }

    #[test]
    fn test_reflexive() {
        let cmp = comparator(Arc::new(MemoryHost::new(site())));
        for id in ["a", "c", "d", "e"] {
            assert!(cmp.are_equal(&id.into(), &id.into()));
        }
    }

    #[test]
    fn test_symmetric() {
        let cmp = comparator(Arc::new(MemoryHost::new(site())));
        for (x, y) in [("a", "b"), ("a", "c"), ("c", "d"), ("e", "a")] {
            assert_eq!(
                cmp.are_equal(&x.into(), &y.into()),
                cmp.are_equal(&y.into(), &x.into())
            );
        }
    }

    #[test]
    fn test_literal_and_variable_differ() {
        let cmp = comparator(Arc::new(MemoryHost::new(site())));
        assert!(!cmp.are_equal(&"c".into(), &"d".into()));
    }

    #[test]
    fn test_subset_is_not_equal() {
        let cmp = comparator(Arc::new(MemoryHost::new(site())));
        assert!(!cmp.are_equal(&"a".into(), &"c".into()));
        assert!(!cmp.are_equal(&"e".into(), &"c".into()));
    }

    #[test]
    fn test_fetch_failure_means_different() {
        let host = Arc::new(MemoryHost::new(site()));
        host.inject(Fault::StyleProperties(StyleId::new("b")));
        let cmp = comparator(host);
        assert!(!cmp.are_equal(&"a".into(), &"b".into()));
        assert!(matches!(
            cmp.differences(&"a".into(), &"b".into()),
            Err(Error::Comparison(_))
        ));
    }

    #[test]
    fn test_differences() {
        let cmp = comparator(Arc::new(MemoryHost::new(site())));
        let diffs = cmp.differences(&"a".into(), &"c".into()).unwrap();

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].property, "color");
        assert_eq!(diffs[0].base, Some(PropertyValue::literal("red")));
        assert_eq!(diffs[0].other, Some(PropertyValue::literal("blue")));
        assert_eq!(diffs[1].property, "margin");
        assert_eq!(diffs[1].other, None);

        assert!(cmp.differences(&"a".into(), &"b".into()).unwrap().is_empty());
    }
}
