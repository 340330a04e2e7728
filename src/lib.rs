pub mod bio;
pub mod cli;
pub mod core;
pub mod genes;
pub mod phylo;
pub mod pipeline;
pub mod processing;
pub mod tools;
pub mod utils;

pub use crate::genes::{GeneNameResolver, OrganelleType};
pub use crate::phylo::supermatrix::{PartitionMap, Supermatrix, SupermatrixBuilder};
pub use crate::pipeline::orchestrator::PipelineOrchestrator;
pub use crate::processing::runner::StageRunner;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing external tool: {0}")]
    Precondition(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("Stage '{0}' produced no output")]
    EmptyStage(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SplaceError>;
