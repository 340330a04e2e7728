use crate::core::paths;
use crate::genes::OrganelleType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub extraction: ExtractionConfig,
    pub alignment: AlignmentConfig,
    pub trimming: TrimmingConfig,
    pub phylogeny: PhylogenyConfig,
    pub genes: GenesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned recursively for FASTA/GenBank inputs
    pub input_dir: Option<PathBuf>,
    /// Root under which the per-stage directories are created
    pub output_dir: PathBuf,
    pub data_type: OrganelleType,
    pub stages: StageFlags,
    pub benchmark: bool,
    pub benchmark_file: PathBuf,
    pub show_progress: bool,
}

/// Which stages run. Extraction always feeds alignment, alignment feeds
/// trimming, trimming feeds the phylogeny step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageFlags {
    pub extract: bool,
    pub align: bool,
    pub trim: bool,
    pub phylogeny: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub binary: String,
    pub params: String,
    pub threads: usize,
    pub preserve_case: bool,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimmingConfig {
    pub binary: String,
    pub params: String,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhylogenyConfig {
    /// Candidate binaries, first one found on PATH wins
    pub binaries: Vec<String>,
    pub threads: usize,
    pub bootstrap: u32,
    pub model: String,
    pub prefix: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenesConfig {
    /// Extra `raw label -> canonical symbol` entries for the normalizer
    pub synonyms: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: paths::default_output_dir(),
            data_type: OrganelleType::Mitochondrial,
            stages: StageFlags::default(),
            benchmark: false,
            benchmark_file: PathBuf::from("benchmark.tsv"),
            show_progress: false,
        }
    }
}

impl Default for StageFlags {
    fn default() -> Self {
        Self {
            extract: true,
            align: true,
            trim: true,
            phylogeny: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_concurrent: 5 }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            binary: "mafft".to_string(),
            params: "--auto".to_string(),
            threads: 4,
            preserve_case: true,
            max_concurrent: 15,
            timeout_secs: 3600,
        }
    }
}

impl Default for TrimmingConfig {
    fn default() -> Self {
        Self {
            binary: "trimal".to_string(),
            params: "-automated1".to_string(),
            max_concurrent: 5,
            timeout_secs: 3600,
        }
    }
}

impl Default for PhylogenyConfig {
    fn default() -> Self {
        Self {
            binaries: vec!["iqtree2".to_string(), "iqtree".to_string()],
            threads: 1,
            bootstrap: 1000,
            model: "MFP".to_string(),
            prefix: "splace_tree".to_string(),
            timeout_secs: None,
        }
    }
}

impl AlignmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TrimmingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PhylogenyConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl StageFlags {
    /// Reject combinations that enable a stage without its prerequisite.
    pub fn validate(&self) -> Result<(), crate::SplaceError> {
        let chain = [
            ("extract", self.extract),
            ("align", self.align),
            ("trim", self.trim),
            ("phylogeny", self.phylogeny),
        ];

        if !chain.iter().any(|(_, enabled)| *enabled) {
            return Err(crate::SplaceError::Config("no pipeline stage is enabled".to_string()));
        }

        for pair in chain.windows(2) {
            let (before, before_enabled) = pair[0];
            let (after, after_enabled) = pair[1];
            if after_enabled && !before_enabled {
                return Err(crate::SplaceError::Config(format!(
                    "stage '{}' requires stage '{}' to be enabled",
                    after, before
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Check everything that can be checked before any stage runs.
    pub fn validate(&self) -> Result<(), crate::SplaceError> {
        self.pipeline.stages.validate()?;

        let limits = [
            ("extraction.max_concurrent", self.extraction.max_concurrent),
            ("alignment.max_concurrent", self.alignment.max_concurrent),
            ("alignment.threads", self.alignment.threads),
            ("trimming.max_concurrent", self.trimming.max_concurrent),
            ("phylogeny.threads", self.phylogeny.threads),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(crate::SplaceError::Config(format!("{} must be at least 1", name)));
            }
        }

        if self.pipeline.stages.phylogeny && self.phylogeny.binaries.is_empty() {
            return Err(crate::SplaceError::Config(
                "phylogeny.binaries must name at least one tree-inference binary".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::SplaceError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::SplaceError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::SplaceError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::SplaceError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
