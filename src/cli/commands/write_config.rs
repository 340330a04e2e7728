use crate::cli::output::{success, warning};
use crate::core::config::{default_config, save_config};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct WriteConfigArgs {
    /// Destination file
    #[arg(default_value = "splace.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: WriteConfigArgs) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        warning(&format!("{} already exists, use --force to overwrite", args.path.display()));
        anyhow::bail!("refusing to overwrite {}", args.path.display());
    }
    save_config(&args.path, &default_config())?;
    success(&format!("Default configuration written to {}", args.path.display()));
    Ok(())
}
