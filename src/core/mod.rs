pub mod gamma;
pub mod matcher;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod runner;

pub use crate::domain::model::{AnalysisContext, BatchResult, BatchSummary};
pub use crate::domain::ports::{ComparisonEngine, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
