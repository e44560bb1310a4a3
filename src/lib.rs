//! Mounting and placement core of an electrical/telecom cabinet configurator.
//!
//! Cabinets expose mounting surfaces (DIN rails, 19" rack frames, mounting
//! plates). Equipment is placed on them by per-mount-type strategies that
//! track occupancy, so nothing ever overlaps. Validation rules and
//! category-specific calculation plugins analyse a configuration. All
//! lengths inside the core are metres; catalog millimetres are converted
//! once, in [`catalog`].

pub mod api;
pub mod cabinet;
pub mod catalog;
pub mod config;
pub mod equipment;
pub mod error;
pub mod events;
pub mod geometry;
pub mod logic;
pub mod mounting;
pub mod occupancy;
pub mod registry;
pub mod scene;
pub mod types;
pub mod validation;

pub use error::{ConfiguratorError, Result};
pub use registry::{AddEquipment, Configurator};

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` level. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
