use super::process::run_command;
use super::traits::StageTool;
use crate::bio::source::file_stem;
use crate::core::config::TrimmingConfig;
use crate::SplaceError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// trimAl alignment trimmer. Writes its own output file.
pub struct TrimAl {
    config: TrimmingConfig,
}

impl TrimAl {
    pub fn new(config: TrimmingConfig) -> Self {
        Self { config }
    }

    pub fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("-in").arg(input).arg("-out").arg(output);
        cmd.args(self.config.params.split_whitespace());
        cmd
    }
}

#[async_trait]
impl StageTool for TrimAl {
    fn name(&self) -> &str {
        "trimAl"
    }

    fn binary(&self) -> &str {
        &self.config.binary
    }

    fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}_trimmed.fasta", file_stem(input)))
    }

    async fn run(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, SplaceError> {
        if !input.is_file() {
            return Err(SplaceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("aligned input not found: {}", input.display()),
            )));
        }

        let target = self.output_path(input, output_dir);
        let output = run_command(
            self.name(),
            self.command(input, &target),
            Some(self.config.timeout()),
        )
        .await?;

        if !output.status.success() {
            // trimAl reports some errors on stdout
            let mut message = output.stderr_tail();
            if message.is_empty() {
                message = super::process::tail(&output.stdout, super::process::STDERR_TAIL_BYTES);
            }
            return Err(SplaceError::ToolFailed {
                tool: self.name().to_string(),
                message: format!("{} ({})", output.status, message),
            });
        }
        if !target.is_file() {
            return Err(SplaceError::ToolFailed {
                tool: self.name().to_string(),
                message: format!("no output written for {}", input.display()),
            });
        }

        info!("Trimming completed for {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_and_output_name() {
        let trimal = TrimAl::new(TrimmingConfig::default());
        let target = trimal.output_path(Path::new("/a/COI_aligned.fasta"), Path::new("/t"));
        assert_eq!(target, PathBuf::from("/t/COI_aligned_trimmed.fasta"));

        let cmd = trimal.command(Path::new("/a/COI_aligned.fasta"), &target);
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-in",
                "/a/COI_aligned.fasta",
                "-out",
                "/t/COI_aligned_trimmed.fasta",
                "-automated1"
            ]
        );
    }
}
