pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use config::{AnalyzerProvider, GlanceConfig};
pub use crate::core::service::GlanceService;
pub use utils::error::{GlanceError, Result};
