//! Client for the custom code registration service.
//!
//! The service registers scripts for a site and applies them to the site or
//! to individual pages, in the header or the footer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

mod client;

pub use client::{fold_application_status, CustomCodeClient};

/// Where a script is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLocation {
    Header,
    Footer,
}

/// What a script is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptTargetType {
    Site,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    pub display_name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRegistrationRequest {
    pub site_id: String,
    pub is_hosted: bool,
    pub script_data: ScriptData,
}

/// A registered script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCode {
    #[serde(default)]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub hosted_location: Option<String>,
    #[serde(default)]
    pub source_code: Option<String>,
    pub version: String,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeApplication {
    pub script_id: String,
    pub target_type: ScriptTargetType,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
    pub version: String,
    pub location: ScriptLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPlacement {
    pub location: ScriptLocation,
}

/// Scripts applied to one target, keyed by script id
pub type ScriptStatus = HashMap<String, ScriptPlacement>;

/// Applied scripts keyed by target (site or page) id
pub type StatusMap = HashMap<String, ScriptStatus>;

/// Whether one script is applied to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetApplication {
    pub is_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ScriptLocation>,
}

/// Application state of one script keyed by target id
pub type ApplicationStatus = BTreeMap<String, TargetApplication>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_request_is_camel_case() {
        let request = ScriptRegistrationRequest {
            site_id: "site-1".to_string(),
            is_hosted: false,
            script_data: ScriptData {
                source_code: Some("console.log(1)".to_string()),
                display_name: "Tracker".to_string(),
                version: "1.0.0".to_string(),
                hosted_location: None,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["siteId"], "site-1");
        assert_eq!(json["isHosted"], false);
        assert_eq!(json["scriptData"]["displayName"], "Tracker");
        assert!(json["scriptData"].get("hostedLocation").is_none());
    }

    #[test]
    fn test_code_application_enums_are_lowercase() {
        let application = CodeApplication {
            script_id: "tracker-1.0.0".to_string(),
            target_type: ScriptTargetType::Page,
            target_id: "page-9".to_string(),
            applied_at: None,
            version: "1.0.0".to_string(),
            location: ScriptLocation::Footer,
        };

        let json = serde_json::to_value(&application).unwrap();
        assert_eq!(json["targetType"], "page");
        assert_eq!(json["location"], "footer");
    }
}
