pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, settings::AnalysisSettings, toml_config::TomlConfig};
pub use core::{
    gamma::GammaEngine,
    pipeline::ScanComparePipeline,
    runner::{AnalysisRunner, RunOutput},
};
pub use utils::error::{CompareError, Result};
