use crate::bio::fasta::append_record;
use crate::bio::source::open_source;
use crate::genes::GeneNameResolver;
use crate::processing::runner::{StageOutcome, StageRunner};
use crate::SplaceError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// What one input file contributed to the per-gene marker files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExtraction {
    pub source: PathBuf,
    /// Per-gene files this input appended to
    pub touched: BTreeSet<PathBuf>,
    pub written: usize,
    pub unresolved: usize,
    pub malformed: usize,
}

/// Splits input records into `{output_dir}/{gene}.fasta`, one file per
/// canonical marker. Files are opened in append mode so every input adds its
/// taxa to the same per-gene file.
#[derive(Clone)]
pub struct MarkerExtractor {
    resolver: Arc<GeneNameResolver>,
    output_dir: PathBuf,
}

impl MarkerExtractor {
    pub fn new(resolver: Arc<GeneNameResolver>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn resolver(&self) -> &Arc<GeneNameResolver> {
        &self.resolver
    }

    /// Extract one file on the calling thread.
    ///
    /// Only failing to open the file is an error. Malformed records and
    /// records without a resolvable gene are logged and skipped.
    pub fn extract_file(&self, path: &Path) -> Result<FileExtraction, SplaceError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let records = open_source(path)?;

        let mut summary = FileExtraction {
            source: path.to_path_buf(),
            ..Default::default()
        };

        for record in records {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping record in {}: {}", path.display(), e);
                    summary.malformed += 1;
                    continue;
                }
            };

            let Some(gene) = self.resolver.resolve_record(&record) else {
                debug!(
                    "No marker gene for '{}' in {}",
                    record.annotation,
                    path.display()
                );
                summary.unresolved += 1;
                continue;
            };

            let target = self.output_dir.join(format!("{}.fasta", gene));
            append_record(&target, &record.taxon_label, &record.sequence)?;
            summary.written += 1;
            summary.touched.insert(target);
        }

        debug!(
            "{}: {} markers written, {} unresolved, {} malformed",
            path.display(),
            summary.written,
            summary.unresolved,
            summary.malformed
        );
        Ok(summary)
    }

    /// Extract one file on the blocking pool.
    pub async fn extract(&self, path: PathBuf) -> Result<FileExtraction, SplaceError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.extract_file(&path))
            .await
            .map_err(|e| SplaceError::Other(format!("extraction task failed: {}", e)))?
    }

    /// Extract every file through the shared stage runner.
    pub async fn extract_all(
        &self,
        files: Vec<PathBuf>,
        runner: &StageRunner,
    ) -> StageOutcome<PathBuf, FileExtraction> {
        runner
            .run(files, |file| {
                let this = self.clone();
                async move { this.extract(file).await }
            })
            .await
    }
}

/// Union of the per-gene files touched by a batch, sorted
pub fn touched_files(extractions: &[FileExtraction]) -> Vec<PathBuf> {
    extractions
        .iter()
        .flat_map(|e| e.touched.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::fasta::parse_fasta;
    use crate::genes::OrganelleType;
    use tempfile::TempDir;

    fn extractor(out: &Path) -> MarkerExtractor {
        MarkerExtractor::new(
            Arc::new(GeneNameResolver::with_default_normalizer(
                OrganelleType::Mitochondrial,
            )),
            out,
        )
    }

    #[test]
    fn test_extract_file_routes_records_by_gene() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("Homo_sapiens.fasta");
        std::fs::write(
            &input,
            ">r1 [gene=COX1] [protein=cytochrome c oxidase subunit I]\nACGT\nACGT\n\
             >r2 cytb cytochrome b 1:8 forward\nGGGGCCCC\n\
             >r3 [gene=rrnL]\nTTTT\n",
        )
        .unwrap();

        let out = dir.path().join("markers");
        let summary = extractor(&out).extract_file(&input).unwrap();
        assert_eq!(summary.written, 2);
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.touched.len(), 2);

        let coi = parse_fasta(out.join("COI.fasta")).unwrap();
        assert_eq!(coi.len(), 1);
        assert_eq!(coi[0].id, "Homo_sapiens");
        assert_eq!(coi[0].sequence, b"ACGTACGT");
        assert!(out.join("CYTB.fasta").exists());
        assert!(!out.join("rrnL.fasta").exists());
    }

    #[tokio::test]
    async fn test_inputs_interleave_into_shared_gene_files() {
        let dir = TempDir::new().unwrap();
        let mut inputs = Vec::new();
        for taxon in ["Alpha", "Beta", "Gamma"] {
            let path = dir.path().join(format!("{}.fa", taxon));
            std::fs::write(&path, ">x [gene=ND1]\nACGTAC\n").unwrap();
            inputs.push(path);
        }
        inputs.push(dir.path().join("Missing.fasta"));

        let out = dir.path().join("markers");
        let runner = StageRunner::new("extraction", 2);
        let outcome = extractor(&out).extract_all(inputs, &runner).await;

        assert_eq!(outcome.succeeded(), 3);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(touched_files(&outcome.successes), vec![out.join("ND1.fasta")]);

        let mut taxa: Vec<String> = parse_fasta(out.join("ND1.fasta"))
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        taxa.sort();
        assert_eq!(taxa, vec!["Alpha", "Beta", "Gamma"]);
    }
}
