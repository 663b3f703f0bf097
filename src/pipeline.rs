//! Orchestration of one collection run.
//!
//! Per deployment: authorize → list sites → for each site paginate past
//! connections → transform → write. Everything runs sequentially. Errors are
//! caught at the deployment boundary so one failing province never stops the
//! others.

use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, Instrument};

use crate::config::Config;
use crate::error::{CallError, PipelineError, Result};
use crate::models::{DeploymentCredentials, Site};
use crate::omada::OmadaClient;
use crate::sink::PointSink;
use crate::transform::{transform, TimeWindow};

// ---

/// Counters for one successfully processed deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentReport {
    pub sites: usize,
    pub pages: usize,
    pub records: usize,
    pub points: usize,
}

/// Outcome of every configured deployment, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, Result<DeploymentReport>)>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn points_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|r| r.points)
            .sum()
    }

    /// Log per-deployment counters. Failures were already logged by [`Collector::run`]
    /// and are only named here.
    pub fn log_summary(&self) {
        // ---
        let mut failed = Vec::new();
        for (name, outcome) in &self.outcomes {
            match outcome {
                Ok(r) => info!(
                    "{}: {} sites, {} pages, {} records, {} points",
                    name, r.sites, r.pages, r.records, r.points
                ),
                Err(_) => failed.push(name.as_str()),
            }
        }
        info!(
            "Run complete: {} deployments ok, {} failed {:?}, {} points written",
            self.succeeded(),
            self.failed(),
            failed,
            self.points_written()
        );
    }
}

/// Drives a collection run over every configured deployment.
pub struct Collector<'a, S> {
    config: &'a Config,
    sink: &'a S,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, S: PointSink> Collector<'a, S> {
    pub fn new(config: &'a Config, sink: &'a S) -> Self {
        Self {
            config,
            sink,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used to compute query windows.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Process every deployment, never stopping on a per-deployment error.
    pub async fn run(&self) -> RunSummary {
        // ---
        let mut summary = RunSummary::default();

        for (name, creds) in &self.config.deployments {
            info!("Fetching for {}", name);

            let span = info_span!("deployment", province = %name);
            let outcome = self.process_deployment(name, creds).instrument(span).await;

            if let Err(e) = &outcome {
                error!("Error fetching data for {}: {}", name, e);
            }
            summary.outcomes.push((name.clone(), outcome));
        }

        summary
    }

    /// Run one deployment through authorize → sites → pages.
    pub async fn process_deployment(
        &self,
        province: &str,
        creds: &DeploymentCredentials,
    ) -> Result<DeploymentReport> {
        // ---
        let client = OmadaClient::new(&creds.base_url, self.config.http_timeout)
            .map_err(|e| PipelineError::fetch("http client")(CallError::Http(e)))?;

        let token = client
            .authorize(
                &self.config.email,
                &self.config.password,
                &creds.client_id,
                &creds.client_secret,
                &creds.omadac_id,
            )
            .await?;

        let sites = client.list_sites(&creds.omadac_id, &token).await?;
        info!("Found {} sites", sites.len());

        let window = TimeWindow::trailing((self.clock)(), self.config.window);

        let mut report = DeploymentReport::default();
        for site in &sites {
            let span = info_span!("site", site = %site.name);
            self.collect_site(&client, creds, &token, site, province, window, &mut report)
                .instrument(span)
                .await?;
            report.sites += 1;
        }

        Ok(report)
    }

    /// Paginate one site's past connections, writing each page as a batch.
    #[allow(clippy::too_many_arguments)]
    async fn collect_site(
        &self,
        client: &OmadaClient,
        creds: &DeploymentCredentials,
        token: &str,
        site: &Site,
        province: &str,
        window: TimeWindow,
        report: &mut DeploymentReport,
    ) -> Result<()> {
        // ---
        info!(
            "Fetching data for Site: {} in Province: {}",
            site.name, province
        );

        let mut page = 1;
        loop {
            let batch = client
                .fetch_page(&creds.omadac_id, &site.site_id, token, window, page)
                .await?;
            report.pages += 1;

            if batch.item_count == 0 {
                break;
            }

            let points = transform(&batch.records, province, &site.name);
            info!(
                "Processing page {}: {} records, {} points",
                page,
                batch.records.len(),
                points.len()
            );
            self.sink.write(&points).await?;

            report.records += batch.records.len();
            report.points += points.len();

            if batch.is_last() {
                break;
            }
            page += 1;
            tokio::time::sleep(self.config.page_delay).await;
        }

        Ok(())
    }
}
