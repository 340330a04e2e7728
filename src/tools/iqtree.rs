use super::process::{find_executable, run_checked};
use crate::core::config::PhylogenyConfig;
use crate::SplaceError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// IQ-TREE maximum-likelihood tree inference on a partitioned supermatrix
pub struct IqTree {
    config: PhylogenyConfig,
}

impl IqTree {
    pub fn new(config: PhylogenyConfig) -> Self {
        Self { config }
    }

    /// First configured candidate binary found on `PATH`
    pub fn locate(&self) -> Result<PathBuf, SplaceError> {
        self.config
            .binaries
            .iter()
            .find_map(find_executable)
            .ok_or_else(|| {
                SplaceError::Precondition(format!(
                    "IQ-TREE not found in PATH (tried {})",
                    self.config.binaries.join(", ")
                ))
            })
    }

    pub fn prefix(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.config.prefix)
    }

    pub fn tree_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.treefile", self.config.prefix))
    }

    pub fn command(&self, binary: &Path, supermatrix: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(binary);
        cmd.arg("-s")
            .arg(supermatrix)
            .arg("-nt")
            .arg(self.config.threads.to_string())
            .arg("-B")
            .arg(self.config.bootstrap.to_string())
            .arg("-m")
            .arg(&self.config.model)
            .arg("-pre")
            .arg(self.prefix(output_dir))
            .arg("-redo");
        cmd
    }

    /// Run the analysis and return the `.treefile` path. Exit status zero
    /// without a tree file is still a failure.
    pub async fn infer(
        &self,
        supermatrix: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, SplaceError> {
        let binary = self.locate()?;
        info!(
            "Starting IQ-TREE analysis with {} threads",
            self.config.threads
        );

        let command = self.command(&binary, supermatrix, output_dir);
        run_checked("IQ-TREE", command, self.config.timeout()).await?;

        let tree = self.tree_path(output_dir);
        if !tree.is_file() {
            return Err(SplaceError::ToolFailed {
                tool: "IQ-TREE".to_string(),
                message: format!("finished but {} was not written", tree.display()),
            });
        }
        info!("IQ-TREE analysis completed: {}", tree.display());
        Ok(tree)
    }
}
