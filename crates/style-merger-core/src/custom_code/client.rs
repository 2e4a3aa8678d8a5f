use log::{debug, error, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{
    ApplicationStatus, CodeApplication, CustomCode, ScriptRegistrationRequest, StatusMap,
    TargetApplication,
};
use crate::config::CustomCodeConfig;
use crate::error::Result;

/// Pause between consecutive page chunks to stay under the service rate limit
const CHUNK_PAUSE: Duration = Duration::from_millis(100);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptsResponse {
    #[serde(default)]
    registered_scripts: Vec<CustomCode>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    result: StatusMap,
}

/// Per-target application state of `script_id` in a status map
pub fn fold_application_status(status: &StatusMap, script_id: &str) -> ApplicationStatus {
    status
        .iter()
        .map(|(target_id, scripts)| {
            let placement = scripts.get(script_id);
            (
                target_id.clone(),
                TargetApplication {
                    is_applied: placement.is_some(),
                    location: placement.map(|p| p.location),
                },
            )
        })
        .collect()
}

/// Blocking client for the custom code service
#[derive(Debug, Clone)]
pub struct CustomCodeClient {
    http: Client,
    base_url: String,
    status_batch_size: usize,
    pages_per_request: usize,
}

impl CustomCodeClient {
    pub fn new(config: &CustomCodeConfig) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            status_batch_size: config.status_batch_size.max(1),
            pages_per_request: config.pages_per_request.max(1),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/custom-code/{}", self.base_url, path)
    }

    /// Register a new script for a site
    pub fn register_script(&self, request: &ScriptRegistrationRequest) -> Result<serde_json::Value> {
        debug!("Registering script {:?}", request.script_data.display_name);
        let response = self
            .http
            .post(self.endpoint("register"))
            .json(request)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// Scripts registered for a site
    pub fn list_scripts(&self, site_id: &str) -> Result<Vec<CustomCode>> {
        let response: ScriptsResponse = self
            .http
            .get(self.endpoint("register"))
            .query(&[("siteId", site_id)])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.registered_scripts)
    }

    /// Apply a script to the site or a page
    pub fn apply_script(&self, application: &CodeApplication) -> Result<serde_json::Value> {
        debug!(
            "Applying script {} to {:?} {}",
            application.script_id, application.target_type, application.target_id
        );
        let response = self
            .http
            .post(self.endpoint("apply"))
            .json(application)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// Scripts applied to the site itself
    pub fn site_status(&self, site_id: &str) -> Result<StatusMap> {
        self.status(&[("targetType", "site"), ("targetId", site_id)])
    }

    /// Scripts applied to each of the given pages
    pub fn pages_status(&self, page_ids: &[String]) -> Result<StatusMap> {
        let joined = page_ids.join(",");
        self.status(&[("targetType", "page"), ("targetIds", joined.as_str())])
    }

    fn status(&self, query: &[(&str, &str)]) -> Result<StatusMap> {
        let response: StatusResponse = self
            .http
            .get(self.endpoint("status"))
            .query(query)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.result)
    }

    /// Site status merged with the status of each page.
    ///
    /// Failures are logged and yield an empty map.
    pub fn batch_status(&self, site_id: &str, page_ids: &[String]) -> StatusMap {
        if site_id.is_empty() || site_id == "page" {
            warn!("Invalid siteId provided to batch status: {:?}", site_id);
            return StatusMap::new();
        }

        match self.try_batch_status(site_id, page_ids) {
            Ok(status) => status,
            Err(e) => {
                error!(
                    "Error in batch status for site {} ({} pages): {}",
                    site_id,
                    page_ids.len(),
                    e
                );
                StatusMap::new()
            }
        }
    }

    fn try_batch_status(&self, site_id: &str, page_ids: &[String]) -> Result<StatusMap> {
        let mut status = self.site_status(site_id)?;
        for batch in page_ids.chunks(self.status_batch_size) {
            status.extend(self.pages_status(batch)?);
        }
        Ok(status)
    }

    /// Where `script_id` is applied across the given pages
    pub fn application_status(
        &self,
        site_id: &str,
        script_id: &str,
        page_ids: &[String],
    ) -> ApplicationStatus {
        let chunks: Vec<&[String]> = page_ids.chunks(self.pages_per_request).collect();
        let mut application = ApplicationStatus::new();

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                std::thread::sleep(CHUNK_PAUSE);
            }
            let status = self.batch_status(site_id, chunk);
            application.extend(fold_application_status(&status, script_id));
        }
        application
    }
}
