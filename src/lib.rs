pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{GeminiResearcher, PageSpeedProbe};
pub use config::AuditConfig;
pub use core::engine::AuditEngine;
pub use domain::model::AuditReport;
pub use utils::error::{AuditError, Result};
