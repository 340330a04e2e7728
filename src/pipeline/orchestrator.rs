//! Linear stage machine: extract -> align -> trim -> build matrix -> infer.
//!
//! A stage runs only when it is enabled and the stage before it produced at
//! least one output. Everything that can be checked up front (flag
//! combinations, leftover output directories, input discovery) is checked
//! before the first external process starts.

use crate::core::config::Config;
use crate::core::paths::StageLayout;
use crate::genes::{GeneNameResolver, SynonymNormalizer};
use crate::phylo::supermatrix::{PartitionMap, SupermatrixBuilder};
use crate::pipeline::inputs::discover_inputs;
use crate::processing::extractor::{touched_files, MarkerExtractor};
use crate::processing::runner::{StageOutcome, StageRunner};
use crate::tools::{run_tool_stage, IqTree, Mafft, StageTool, TrimAl};
use crate::utils::benchmark::Benchmark;
use crate::SplaceError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Align,
    Trim,
    BuildMatrix,
    Infer,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extract => "extraction",
            Stage::Align => "alignment",
            Stage::Trim => "trimming",
            Stage::BuildMatrix => "supermatrix",
            Stage::Infer => "tree inference",
        }
    }

    /// Label used for benchmark rows. Matrix building and tree inference
    /// are timed together.
    pub fn benchmark_label(&self) -> &'static str {
        match self {
            Stage::BuildMatrix | Stage::Infer => "phylogeny",
            other => other.name(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// What a run produced, stage by stage
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub inputs: Vec<PathBuf>,
    pub marker_files: Vec<PathBuf>,
    pub aligned_files: Vec<PathBuf>,
    pub trimmed_files: Vec<PathBuf>,
    pub supermatrix: Option<PathBuf>,
    pub partitions: Option<PartitionMap>,
    pub tree: Option<PathBuf>,
    pub stages: Vec<StageSummary>,
}

impl PipelineReport {
    fn record<I, T>(&mut self, stage: Stage, outcome: &StageOutcome<I, T>, started: Instant) {
        self.stages.push(StageSummary {
            stage,
            attempted: outcome.total,
            succeeded: outcome.succeeded(),
            failed: outcome.failed(),
            duration: started.elapsed(),
        });
    }

    fn record_single(&mut self, stage: Stage, succeeded: bool, started: Instant) {
        self.stages.push(StageSummary {
            stage,
            attempted: 1,
            succeeded: usize::from(succeeded),
            failed: usize::from(!succeeded),
            duration: started.elapsed(),
        });
    }
}

pub struct PipelineOrchestrator {
    config: Config,
    input_dir: PathBuf,
    layout: StageLayout,
    resolver: Arc<GeneNameResolver>,
    aligner: Arc<dyn StageTool>,
    trimmer: Arc<dyn StageTool>,
    tree: IqTree,
    benchmark: Benchmark,
}

impl PipelineOrchestrator {
    /// Validate `config` and wire up the default tools.
    pub fn new(config: Config) -> Result<Self, SplaceError> {
        config.validate()?;
        let input_dir = config
            .pipeline
            .input_dir
            .clone()
            .ok_or_else(|| SplaceError::Config("no input directory given".to_string()))?;

        let normalizer =
            SynonymNormalizer::new().with_synonyms(config.genes.synonyms.clone());
        let resolver = Arc::new(GeneNameResolver::new(
            config.pipeline.data_type,
            Arc::new(normalizer),
        ));

        Ok(Self {
            input_dir,
            layout: StageLayout::new(&config.pipeline.output_dir),
            resolver,
            aligner: Arc::new(Mafft::new(config.alignment.clone())),
            trimmer: Arc::new(TrimAl::new(config.trimming.clone())),
            tree: IqTree::new(config.phylogeny.clone()),
            benchmark: Benchmark::new(&config.pipeline.benchmark_file, config.pipeline.benchmark),
            config,
        })
    }

    /// Swap the aligner and trimmer implementations
    pub fn with_tools(mut self, aligner: Arc<dyn StageTool>, trimmer: Arc<dyn StageTool>) -> Self {
        self.aligner = aligner;
        self.trimmer = trimmer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    pub fn resolver(&self) -> &Arc<GeneNameResolver> {
        &self.resolver
    }

    /// Output directories the enabled stages will create
    pub fn planned_dirs(&self) -> Vec<PathBuf> {
        let stages = &self.config.pipeline.stages;
        [
            (stages.extract, self.layout.markers_dir()),
            (stages.align, self.layout.aligned_dir()),
            (stages.trim, self.layout.trimmed_dir()),
            (stages.phylogeny, self.layout.phylogeny_dir()),
        ]
        .into_iter()
        .filter_map(|(enabled, dir)| enabled.then_some(dir))
        .collect()
    }

    /// Refuse to run over results from an earlier run
    pub fn preflight(&self) -> Result<(), SplaceError> {
        let existing: Vec<String> = self
            .planned_dirs()
            .into_iter()
            .filter(|dir| dir.exists())
            .map(|dir| dir.display().to_string())
            .collect();

        if !existing.is_empty() {
            return Err(SplaceError::Config(format!(
                "output directories already exist: {}. Remove them or choose another output directory",
                existing.join(", ")
            )));
        }
        Ok(())
    }

    fn runner(&self, stage: Stage, max_concurrent: usize) -> StageRunner {
        StageRunner::new(stage.name(), max_concurrent)
            .with_progress(self.config.pipeline.show_progress)
    }

    /// Run every enabled stage. Benchmark rows are saved whether or not the
    /// run succeeds.
    pub async fn run(&self) -> Result<PipelineReport, SplaceError> {
        self.preflight()?;

        let inputs = discover_inputs(&self.input_dir)?;
        if inputs.is_empty() {
            return Err(SplaceError::Config(format!(
                "no FASTA or GenBank files found in {}",
                self.input_dir.display()
            )));
        }
        info!(
            "Processing {} input files ({} markers) into {}",
            inputs.len(),
            self.config.pipeline.data_type,
            self.layout.root().display()
        );

        let mut report = PipelineReport {
            inputs,
            ..Default::default()
        };
        let result = self.run_stages(&mut report).await;

        if let Err(e) = self.benchmark.save(&self.input_dir, report.inputs.len()) {
            warn!("Failed to save benchmark: {}", e);
        }
        result.map(|_| report)
    }

    async fn run_stages(&self, report: &mut PipelineReport) -> Result<(), SplaceError> {
        let stages = self.config.pipeline.stages;

        let markers = self.extract(report).await?;
        report.marker_files = markers;
        if !stages.align {
            return Ok(());
        }

        let markers = report.marker_files.clone();
        let aligned = self
            .tool_stage(Stage::Align, self.aligner.clone(), markers, report)
            .await?;
        report.aligned_files = aligned;
        if !stages.trim {
            return Ok(());
        }

        let aligned = report.aligned_files.clone();
        let trimmed = self
            .tool_stage(Stage::Trim, self.trimmer.clone(), aligned, report)
            .await?;
        report.trimmed_files = trimmed;
        if !stages.phylogeny {
            return Ok(());
        }

        self.phylogeny(report).await
    }

    async fn extract(&self, report: &mut PipelineReport) -> Result<Vec<PathBuf>, SplaceError> {
        let stage = Stage::Extract;
        self.benchmark.start(stage.benchmark_label());
        let started = Instant::now();

        let extractor = MarkerExtractor::new(self.resolver.clone(), self.layout.markers_dir());
        std::fs::create_dir_all(extractor.output_dir())?;
        let runner = self.runner(stage, self.config.extraction.max_concurrent);
        let outcome = extractor.extract_all(report.inputs.clone(), &runner).await;

        self.benchmark.stop(stage.benchmark_label());
        report.record(stage, &outcome, started);

        let markers = touched_files(&outcome.successes);
        info!(
            "Extracted {} marker genes from {}/{} files",
            markers.len(),
            outcome.succeeded(),
            outcome.total
        );
        non_empty(stage, markers, &outcome)
    }

    async fn tool_stage(
        &self,
        stage: Stage,
        tool: Arc<dyn StageTool>,
        inputs: Vec<PathBuf>,
        report: &mut PipelineReport,
    ) -> Result<Vec<PathBuf>, SplaceError> {
        let (output_dir, max_concurrent) = match stage {
            Stage::Align => (self.layout.aligned_dir(), self.config.alignment.max_concurrent),
            _ => (self.layout.trimmed_dir(), self.config.trimming.max_concurrent),
        };

        self.benchmark.start(stage.benchmark_label());
        let started = Instant::now();
        let runner = self.runner(stage, max_concurrent);
        let outcome = run_tool_stage(tool, inputs, &output_dir, &runner).await;
        self.benchmark.stop(stage.benchmark_label());
        let outcome = outcome?;
        report.record(stage, &outcome, started);

        let mut outputs = outcome.successes.clone();
        outputs.sort();
        non_empty(stage, outputs, &outcome)
    }

    async fn phylogeny(&self, report: &mut PipelineReport) -> Result<(), SplaceError> {
        let label = Stage::BuildMatrix.benchmark_label();
        self.benchmark.start(label);
        let result = self.build_and_infer(report).await;
        self.benchmark.stop(label);
        result
    }

    async fn build_and_infer(&self, report: &mut PipelineReport) -> Result<(), SplaceError> {
        let phylogeny_dir = self.layout.phylogeny_dir();
        std::fs::create_dir_all(&phylogeny_dir)?;

        let started = Instant::now();
        let supermatrix_path = self.layout.supermatrix_path();
        let trimmed = report.trimmed_files.clone();
        let target = supermatrix_path.clone();
        let built = tokio::task::spawn_blocking(move || {
            SupermatrixBuilder::new().build_to_file(&trimmed, &target)
        })
        .await
        .map_err(|e| SplaceError::Other(format!("supermatrix task failed: {}", e)))?;
        report.record_single(Stage::BuildMatrix, built.is_ok(), started);
        let (_, partitions) = built?;
        report.supermatrix = Some(supermatrix_path.clone());
        report.partitions = Some(partitions);

        let started = Instant::now();
        let tree = self.tree.infer(&supermatrix_path, &phylogeny_dir).await;
        report.record_single(Stage::Infer, tree.is_ok(), started);
        report.tree = Some(tree?);
        Ok(())
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }
}

/// Gate the next stage on a non-empty output set
fn non_empty<I, T>(
    stage: Stage,
    outputs: Vec<PathBuf>,
    outcome: &StageOutcome<I, T>,
) -> Result<Vec<PathBuf>, SplaceError> {
    if outputs.is_empty() {
        if let Some(last) = outcome.failures.last() {
            error!("{} produced nothing; last error: {}", stage, last.error);
        }
        return Err(SplaceError::EmptyStage(stage.name().to_string()));
    }
    Ok(outputs)
}
