pub mod engine;
pub mod fusion;
pub mod normalize;
pub mod parser;
pub mod progress;

pub use crate::domain::model::AuditReport;
pub use crate::domain::ports::{ConfigProvider, MarketResearch, PerformanceProbe};
pub use crate::utils::error::Result;
