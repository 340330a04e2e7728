pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "splace",
    version,
    about = "Organellar phylogenomics from raw FASTA/GenBank files",
    long_about = "splace extracts mitochondrial or chloroplast marker genes from FASTA and \
                  GenBank files, aligns them with MAFFT, trims them with trimAl, concatenates \
                  them into a partitioned NEXUS supermatrix and infers a tree with IQ-TREE."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML configuration file; command-line flags override its values
    #[arg(long, global = true, value_name = "FILE", env = "SPLACE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline on a directory of sequence files
    Run(commands::run::RunArgs),

    /// Build a NEXUS supermatrix from trimmed per-gene alignments
    Supermatrix(commands::supermatrix::SupermatrixArgs),

    /// List marker genes or test how a label resolves
    Genes(commands::genes::GenesArgs),

    /// Write the default configuration as TOML
    WriteConfig(commands::write_config::WriteConfigArgs),
}
