use crate::cli::output::{print_report, success};
use crate::core::config::Config;
use crate::genes::OrganelleType;
use crate::pipeline::PipelineOrchestrator;
use clap::Args;
use std::path::{Path, PathBuf};

/// IQ-TREE threads when neither `-t` nor a config file sets them
pub const DEFAULT_TREE_THREADS: usize = 8;

#[derive(Args)]
pub struct RunArgs {
    /// Directory with FASTA (.fasta, .fa, .fas) or GenBank (.gb, .gbk) files
    #[arg(short, long, value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Directory to save output files [default: splace_output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Organelle marker set to extract
    #[arg(short = 'd', long, value_enum)]
    pub data_type: Option<OrganelleType>,

    /// Threads for tree inference [default: 8, or the value in --config]
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Stop after marker extraction
    #[arg(long)]
    pub no_align: bool,

    /// Stop after alignment
    #[arg(long)]
    pub no_trim: bool,

    /// Stop after trimming
    #[arg(long)]
    pub no_phylogeny: bool,

    /// Concurrent workers for extraction, alignment and trimming
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Append stage timings to a TSV file
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "benchmark.tsv")]
    pub benchmark: Option<PathBuf>,

    /// Show progress bars
    #[arg(long)]
    pub progress: bool,
}

impl RunArgs {
    /// Layer these flags over `config`
    pub fn apply(&self, mut config: Config) -> Config {
        let pipeline = &mut config.pipeline;
        pipeline.input_dir = Some(self.input_dir.clone());
        if let Some(output_dir) = &self.output_dir {
            pipeline.output_dir = output_dir.clone();
        }
        if let Some(data_type) = self.data_type {
            pipeline.data_type = data_type;
        }
        if self.no_align {
            pipeline.stages.align = false;
            pipeline.stages.trim = false;
            pipeline.stages.phylogeny = false;
        }
        if self.no_trim {
            pipeline.stages.trim = false;
            pipeline.stages.phylogeny = false;
        }
        if self.no_phylogeny {
            pipeline.stages.phylogeny = false;
        }
        if let Some(path) = &self.benchmark {
            pipeline.benchmark = true;
            pipeline.benchmark_file = path.clone();
        }
        pipeline.show_progress |= self.progress;

        if let Some(n) = self.max_concurrent {
            config.extraction.max_concurrent = n;
            config.alignment.max_concurrent = n;
            config.trimming.max_concurrent = n;
        }
        if let Some(threads) = self.threads {
            config.phylogeny.threads = threads;
        }
        config
    }
}

pub fn run(args: RunArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut base = super::base_config(config_path)?;
    if config_path.is_none() {
        base.phylogeny.threads = DEFAULT_TREE_THREADS;
    }
    let config = args.apply(base);
    let orchestrator = PipelineOrchestrator::new(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(orchestrator.run())?;

    print_report(&report);
    success(&format!(
        "Pipeline finished: {} inputs, {} marker genes",
        report.inputs.len(),
        report.marker_files.len()
    ));
    Ok(())
}
