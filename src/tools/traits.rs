//! Interface for the per-file external tools driven by the stage runner.

use crate::processing::runner::{StageOutcome, StageRunner};
use crate::tools::process::find_executable;
use crate::SplaceError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// An external program that turns one input file into one output file
#[async_trait]
pub trait StageTool: Send + Sync {
    /// Human-readable tool name
    fn name(&self) -> &str;

    /// Executable looked up on `PATH`
    fn binary(&self) -> &str;

    /// Where the output for `input` lands inside `output_dir`
    fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf;

    /// Fail fast when the binary is not installed
    fn locate(&self) -> Result<PathBuf, SplaceError> {
        find_executable(self.binary()).ok_or_else(|| {
            SplaceError::Precondition(format!(
                "{} ({}) is not installed or not found in PATH",
                self.name(),
                self.binary()
            ))
        })
    }

    /// Process one file, returning the output path on success
    async fn run(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, SplaceError>;
}

/// Run `tool` over every input with the runner's concurrency bound.
///
/// The binary is checked once before any item starts, so a missing tool
/// fails the whole stage instead of each item.
pub async fn run_tool_stage(
    tool: Arc<dyn StageTool>,
    inputs: Vec<PathBuf>,
    output_dir: &Path,
    runner: &StageRunner,
) -> Result<StageOutcome<PathBuf, PathBuf>, SplaceError> {
    let binary = tool.locate()?;
    info!(
        "Running {} ({}) on {} files, {} at a time",
        tool.name(),
        binary.display(),
        inputs.len(),
        runner.max_concurrent()
    );
    std::fs::create_dir_all(output_dir)?;

    let outcome = runner
        .run(inputs, |input| {
            let tool = tool.clone();
            let output_dir = output_dir.to_path_buf();
            async move { tool.run(&input, &output_dir).await }
        })
        .await;
    Ok(outcome)
}
