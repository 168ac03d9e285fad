//! VOX Worker
//!
//! Process glue around the configuration resolver: environment config,
//! tracing setup, cache prewarming, per-call session preparation and
//! graceful shutdown.

pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use session::{CallType, JobMetadata, SessionPlan};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
