use super::process::run_checked;
use super::traits::StageTool;
use crate::bio::source::file_stem;
use crate::core::config::AlignmentConfig;
use crate::SplaceError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// MAFFT multiple sequence aligner. The alignment is read from stdout.
pub struct Mafft {
    config: AlignmentConfig,
}

impl Mafft {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("--thread").arg(self.config.threads.to_string());
        cmd.args(self.config.params.split_whitespace());
        if self.config.preserve_case {
            cmd.arg("--preservecase");
        }
        cmd.arg(input);
        cmd
    }
}

#[async_trait]
impl StageTool for Mafft {
    fn name(&self) -> &str {
        "MAFFT"
    }

    fn binary(&self) -> &str {
        &self.config.binary
    }

    fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}_aligned.fasta", file_stem(input)))
    }

    async fn run(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, SplaceError> {
        if !input.is_file() {
            return Err(SplaceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input FASTA not found: {}", input.display()),
            )));
        }

        let output =
            run_checked(self.name(), self.command(input), Some(self.config.timeout())).await?;
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(SplaceError::ToolFailed {
                tool: self.name().to_string(),
                message: format!("empty alignment for {}", input.display()),
            });
        }

        let target = self.output_path(input, output_dir);
        tokio::fs::write(&target, &output.stdout).await?;
        info!("Alignment completed for {}", target.display());
        Ok(target)
    }
}
