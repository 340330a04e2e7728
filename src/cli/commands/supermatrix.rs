use crate::cli::output::{partition_table, success};
use crate::phylo::supermatrix::SupermatrixBuilder;
use crate::SplaceError;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct SupermatrixArgs {
    /// Trimmed per-gene FASTA files, or directories containing them
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Output NEXUS file
    #[arg(short, long, default_value = "supermatrix.nex")]
    pub output: PathBuf,
}

/// Expand directories into the `.fasta` files directly inside them
fn collect_alignments(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, SplaceError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in std::fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "fasta") {
                    files.push(path);
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

pub fn run(args: SupermatrixArgs) -> anyhow::Result<()> {
    let files = collect_alignments(&args.inputs)?;
    let (matrix, partitions) = SupermatrixBuilder::new().build_to_file(&files, &args.output)?;

    println!("{}", partition_table(&partitions));
    success(&format!(
        "Wrote {} ({} taxa, {} sites)",
        args.output.display(),
        matrix.ntax(),
        matrix.nchar()
    ));
    Ok(())
}
