use tracing::warn;

use super::{OmadaClient, Page};
use crate::error::{PipelineError, Result};
use crate::models::ConnectionRecord;
use crate::transform::TimeWindow;

// ---

/// Records requested per past-connection page. A shorter page is the last.
pub const PAST_CONNECTION_PAGE_SIZE: usize = 1000;

/// One page of past connections.
#[derive(Debug, Default)]
pub struct ConnectionPage {
    pub records: Vec<ConnectionRecord>,
    /// Items the controller returned, including ones that failed to parse.
    pub item_count: usize,
}

impl ConnectionPage {
    /// An empty or short page ends pagination.
    pub fn is_last(&self) -> bool {
        self.item_count < PAST_CONNECTION_PAGE_SIZE
    }
}

impl OmadaClient {
    /// Fetch one page of past-connection records for `site_id` in `window`.
    ///
    /// A response without `result.data` is an empty page. Items that do not
    /// deserialize as a [`ConnectionRecord`] are skipped with a warning.
    pub async fn fetch_page(
        &self,
        omadac_id: &str,
        site_id: &str,
        access_token: &str,
        window: TimeWindow,
        page: u32,
    ) -> Result<ConnectionPage> {
        // ---
        let request = self
            .http
            .get(self.url(&format!(
                "/openapi/v1/{}/sites/{}/insight/past-connection",
                omadac_id, site_id
            )))
            .query(&[
                ("pageSize", PAST_CONNECTION_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
                ("filters.timeStart", window.start_ms.to_string()),
                ("filters.timeEnd", window.end_ms.to_string()),
            ])
            .header(
                reqwest::header::AUTHORIZATION,
                Self::authorization_header(access_token),
            );

        let items = Self::send::<Page<serde_json::Value>>(request)
            .await
            .map_err(PipelineError::fetch("past connections"))?
            .map(|p| p.data)
            .unwrap_or_default();

        let item_count = items.len();
        let mut records = Vec::with_capacity(item_count);
        for (i, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<ConnectionRecord>(item) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Dropping past connection {} on page {} for site {}: {}",
                        i, page, site_id, e
                    );
                }
            }
        }
        Ok(ConnectionPage {
            records,
            item_count,
        })
    }
}
