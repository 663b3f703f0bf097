//! Collects Omada "past connection" sessions from every configured
//! deployment and writes per-session traffic points to InfluxDB.
//!
//! Module boundaries:
//! - `config`: environment and deployment map loading
//! - `omada`: controller API client (handshake, sites, past connections)
//! - `transform`: records → `connection_traffic` points
//! - `sink`: point writer seam and the InfluxDB implementation
//! - `pipeline`: the per-deployment run loop

pub mod config;
pub mod error;
pub mod models;
pub mod omada;
pub mod pipeline;
pub mod sink;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use config::{Config, SinkConfig};
pub use error::{AuthStep, CallError, PipelineError};
pub use models::{ConnectionRecord, DeploymentCredentials, PointTags, Site, TrafficPoint};
pub use omada::OmadaClient;
pub use pipeline::{Collector, DeploymentReport, RunSummary};
pub use sink::{InfluxSink, PointSink};
pub use transform::{transform, TimeWindow};
