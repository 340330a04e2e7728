//! Concatenation of per-gene alignments into one partitioned NEXUS matrix.

use crate::bio::fasta::FastaReader;
use crate::SplaceError;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const GENE_SUFFIXES: [&str; 3] = ["_aligned_trimmed.fasta", "_trimmed.fasta", ".fasta"];

/// Gene name from a per-gene alignment file name
pub fn gene_name_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    GENE_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .map(str::to_string)
        .unwrap_or_else(|| crate::bio::source::file_stem(path))
}

/// One gene's column range, 1-based inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub gene: String,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Contiguous, non-overlapping gene ranges covering `1..=total_chars`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionMap {
    partitions: Vec<Partition>,
}

impl PartitionMap {
    /// Lay genes out back to back in the given order
    pub fn from_lengths<'a, I>(genes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut partitions = Vec::new();
        let mut start = 1;
        for (gene, length) in genes {
            let end = start + length - 1;
            partitions.push(Partition {
                gene: gene.to_string(),
                start,
                end,
            });
            start = end + 1;
        }
        Self { partitions }
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn total_chars(&self) -> usize {
        self.partitions.last().map(|p| p.end).unwrap_or(0)
    }

    pub fn get(&self, gene: &str) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.gene == gene)
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// NEXUS `SETS` block
    pub fn to_sets_block(&self) -> String {
        let mut out = String::from("BEGIN SETS;\n");
        for p in &self.partitions {
            let _ = writeln!(out, "    CHARSET {} = {}-{};", p.gene, p.start, p.end);
        }
        out.push_str("END;\n");
        out
    }
}

/// Concatenated, gap-filled alignment. Rows are keyed by taxon label and
/// iterate in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supermatrix {
    genes: Vec<(String, usize)>,
    rows: BTreeMap<String, Vec<u8>>,
}

impl Supermatrix {
    pub fn genes(&self) -> &[(String, usize)] {
        &self.genes
    }

    pub fn taxa(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn row(&self, taxon: &str) -> Option<&[u8]> {
        self.rows.get(taxon).map(Vec::as_slice)
    }

    pub fn ntax(&self) -> usize {
        self.rows.len()
    }

    pub fn nchar(&self) -> usize {
        self.genes.iter().map(|(_, len)| len).sum()
    }

    /// Full NEXUS document: `DATA` block followed by the partition `SETS`
    pub fn to_nexus(&self, partitions: &PartitionMap) -> String {
        let labels: Vec<(String, &[u8])> = self
            .rows
            .iter()
            .map(|(taxon, row)| (quote_taxon(taxon), row.as_slice()))
            .collect();
        let width = labels.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        let mut out = String::with_capacity(self.ntax() * (self.nchar() + width + 2) + 256);
        out.push_str("#NEXUS\n");
        out.push_str("BEGIN DATA;\n");
        let _ = writeln!(out, "DIMENSIONS NTAX={} NCHAR={};", self.ntax(), self.nchar());
        out.push_str("FORMAT DATATYPE=DNA GAP=- MISSING=?;\n");
        out.push_str("MATRIX\n");
        for (label, row) in &labels {
            let _ = writeln!(
                out,
                "{:<width$} {}",
                label,
                String::from_utf8_lossy(row),
                width = width
            );
        }
        out.push_str(";\nEND;\n\n");
        out.push_str(&partitions.to_sets_block());
        out
    }

    /// Write the NEXUS document in one go; nothing is written on error
    pub fn write_nexus<P: AsRef<Path>>(
        &self,
        path: P,
        partitions: &PartitionMap,
    ) -> Result<(), SplaceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_nexus(partitions))?;
        info!(
            "Supermatrix created at {} (Taxa: {}, Sites: {})",
            path.display(),
            self.ntax(),
            self.nchar()
        );
        Ok(())
    }
}

/// Single-quoted NEXUS label, embedded quotes doubled
pub fn quote_taxon(taxon: &str) -> String {
    format!("'{}'", taxon.replace('\'', "''"))
}

/// One parsed per-gene alignment
#[derive(Debug)]
struct GeneAlignment {
    name: String,
    length: usize,
    sequences: BTreeMap<String, Vec<u8>>,
}

pub struct SupermatrixBuilder {
    gap: u8,
}

impl Default for SupermatrixBuilder {
    fn default() -> Self {
        Self { gap: b'-' }
    }
}

impl SupermatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one alignment. `None` when it cannot be read or holds no valid
    /// record. Malformed records are skipped one by one.
    fn read_gene(&self, path: &Path) -> Option<GeneAlignment> {
        let name = gene_name_from_path(path);
        let reader = match FastaReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                error!("Error reading {}: {}", path.display(), e);
                return None;
            }
        };

        let records: Vec<_> = reader
            .filter_map(|record| match record {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping record in {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        let Some(length) = records.first().map(|r| r.len()).filter(|len| *len > 0) else {
            warn!("Gene {} is empty or invalid. Skipping.", name);
            return None;
        };

        let mut sequences = BTreeMap::new();
        for record in records {
            let taxon = record.title();
            let mut sequence = record.sequence;
            if sequence.len() != length {
                warn!(
                    "Sequence length mismatch in {}. Expected {}, got {} for {}",
                    name,
                    length,
                    sequence.len(),
                    taxon
                );
                sequence.resize(length, self.gap);
            }
            if sequences.insert(taxon.clone(), sequence).is_some() {
                warn!("Taxon {} appears more than once in {}; keeping the last", taxon, name);
            }
        }

        Some(GeneAlignment {
            name,
            length,
            sequences,
        })
    }

    /// Build the matrix and its partition map from per-gene alignment files.
    ///
    /// Files are processed in sorted path order regardless of the order
    /// given, so the same file set always yields the same output. Fails only
    /// when no file contributes data.
    pub fn build(&self, files: &[PathBuf]) -> Result<(Supermatrix, PartitionMap), SplaceError> {
        let mut files = files.to_vec();
        files.sort();
        files.dedup();
        info!("Preparing supermatrix from {} alignments", files.len());

        let parsed: Vec<Option<GeneAlignment>> =
            files.par_iter().map(|path| self.read_gene(path)).collect();

        let mut seen = HashSet::new();
        let mut genes = Vec::new();
        for gene in parsed.into_iter().flatten() {
            if !seen.insert(gene.name.clone()) {
                warn!("Gene {} provided by more than one file; keeping the first", gene.name);
                continue;
            }
            genes.push(gene);
        }

        if genes.is_empty() {
            error!("No valid data found to create supermatrix");
            return Err(SplaceError::EmptyStage("supermatrix".to_string()));
        }

        let taxa: BTreeSet<&str> = genes
            .iter()
            .flat_map(|g| g.sequences.keys().map(String::as_str))
            .collect();
        let nchar: usize = genes.iter().map(|g| g.length).sum();

        let rows = taxa
            .into_iter()
            .map(|taxon| {
                let mut row = Vec::with_capacity(nchar);
                for gene in &genes {
                    match gene.sequences.get(taxon) {
                        Some(seq) => row.extend_from_slice(seq),
                        None => row.extend(std::iter::repeat(self.gap).take(gene.length)),
                    }
                }
                (taxon.to_string(), row)
            })
            .collect();

        let gene_lengths: Vec<(String, usize)> =
            genes.iter().map(|g| (g.name.clone(), g.length)).collect();
        let partitions = PartitionMap::from_lengths(
            gene_lengths.iter().map(|(name, len)| (name.as_str(), *len)),
        );

        Ok((
            Supermatrix {
                genes: gene_lengths,
                rows,
            },
            partitions,
        ))
    }

    /// Build and write `output` in one step
    pub fn build_to_file<P: AsRef<Path>>(
        &self,
        files: &[PathBuf],
        output: P,
    ) -> Result<(Supermatrix, PartitionMap), SplaceError> {
        let (matrix, partitions) = self.build(files)?;
        matrix.write_nexus(output, &partitions)?;
        Ok((matrix, partitions))
    }
}
