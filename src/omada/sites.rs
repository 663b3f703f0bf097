use tracing::debug;

use super::{OmadaClient, Page};
use crate::error::{CallError, PipelineError, Result};
use crate::models::Site;

// ---

/// Sites requested per deployment. Only page 1 is read, so sites beyond
/// this count are not collected.
pub const SITE_PAGE_SIZE: u32 = 80;

impl OmadaClient {
    /// List the sites under `omadac_id` (first page only).
    pub async fn list_sites(&self, omadac_id: &str, access_token: &str) -> Result<Vec<Site>> {
        // ---
        let request = self
            .http
            .get(self.url(&format!("/openapi/v1/{}/sites", omadac_id)))
            .query(&[("pageSize", SITE_PAGE_SIZE), ("page", 1)])
            .header(
                reqwest::header::AUTHORIZATION,
                Self::authorization_header(access_token),
            );

        let sites = Self::send::<Page<Site>>(request)
            .await
            .and_then(|page| page.ok_or(CallError::MissingField("result")))
            .map_err(PipelineError::fetch("sites"))?
            .data;

        if sites.len() as u32 >= SITE_PAGE_SIZE {
            debug!(
                "Site listing filled the page ({} sites); further sites are not fetched",
                sites.len()
            );
        }
        Ok(sites)
    }
}
