//! Time-series sink for `connection_traffic` points.
//!
//! [`PointSink`] is the seam the orchestrator writes through. [`InfluxSink`]
//! is the production implementation backed by InfluxDB v2.

use std::future::Future;

use futures::stream;
use influxdb2::models::DataPoint;
use tracing::debug;

use crate::config::SinkConfig;
use crate::error::{PipelineError, Result};
use crate::models::{TrafficPoint, TRAFFIC_FIELD};

// ---

/// Destination for transformed points.
///
/// Implementations receive one batch per fetched page and must treat an
/// empty batch as a no-op.
pub trait PointSink {
    /// Write a batch of points in a single call.
    fn write(&self, points: &[TrafficPoint]) -> impl Future<Output = Result<()>>;
}

/// InfluxDB v2 writer bound to one org and bucket.
pub struct InfluxSink {
    client: influxdb2::Client,
    bucket: String,
}

impl InfluxSink {
    /// Build the client and verify the server is reachable.
    ///
    /// Failure here is fatal for the whole run.
    pub async fn connect(cfg: &SinkConfig) -> anyhow::Result<Self> {
        // ---
        let client = influxdb2::Client::new(&cfg.url, &cfg.org, &cfg.token);
        client
            .health()
            .await
            .map_err(|e| anyhow::anyhow!("InfluxDB at '{}' is not reachable: {}", cfg.url, e))?;

        Ok(Self {
            client,
            bucket: cfg.bucket.clone(),
        })
    }
}

/// Convert a point into an InfluxDB data point with nanosecond timestamp.
///
/// Tags with an empty value are left out; line protocol cannot carry them.
pub fn to_data_point(point: &TrafficPoint) -> Result<DataPoint, String> {
    // ---
    let mut builder = DataPoint::builder(point.measurement());
    for (key, value) in point.tags.pairs() {
        if value.is_empty() {
            continue;
        }
        builder = builder.tag(key, value);
    }
    builder
        .field(TRAFFIC_FIELD, point.total_traffic_mb)
        .timestamp(point.timestamp_millis() * 1_000_000)
        .build()
        .map_err(|e| e.to_string())
}

impl PointSink for InfluxSink {
    async fn write(&self, points: &[TrafficPoint]) -> Result<()> {
        // ---
        if points.is_empty() {
            return Ok(());
        }

        let sink_error = |reason: String| PipelineError::Sink {
            count: points.len(),
            reason,
        };

        let data_points = points
            .iter()
            .map(to_data_point)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sink_error)?;

        self.client
            .write(&self.bucket, stream::iter(data_points))
            .await
            .map_err(|e| sink_error(e.to_string()))?;

        debug!("Wrote {} points to bucket '{}'", points.len(), self.bucket);
        Ok(())
    }
}
