//! VOX Control Plane - Runtime Config Client
//!
//! Fetches agent configurations from the control-plane backend and probes
//! its health. The client implements [`vox_storage::ConfigFetcher`] so it
//! plugs straight into a [`vox_storage::ConfigResolver`].

pub mod client;
pub mod types;

pub use client::ControlPlaneClient;
pub use types::RuntimeConfigResponse;
