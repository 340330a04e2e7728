use crate::bio::fasta::is_gzip;
use crate::bio::source::SourceRecord;
use crate::SplaceError;
use flate2::read::GzDecoder;
use gb_io::reader::SeqReader;
use gb_io::seq::{Feature, Seq};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Streams CDS features out of a GenBank file, one `SourceRecord` per feature.
pub struct GenBankReader {
    reader: SeqReader<Box<dyn Read>>,
    pending: VecDeque<Result<SourceRecord, SplaceError>>,
    path: PathBuf,
    finished: bool,
}

impl GenBankReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SplaceError> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let input: Box<dyn Read> = if is_gzip(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(Self {
            reader: SeqReader::new(input),
            pending: VecDeque::new(),
            path: path.to_path_buf(),
            finished: false,
        })
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn queue_features(&mut self, seq: &Seq) {
        let taxon_label = taxon_label(seq, &self.file_name());

        for feature in seq.features.iter().filter(|f| is_cds(f)) {
            let product = qualifier(feature, "product");
            let gene = qualifier(feature, "gene");
            let hint = product.clone().or_else(|| gene.clone());

            let record = match seq.extract_location(&feature.location) {
                Ok(bases) if !bases.is_empty() => Ok(SourceRecord {
                    taxon_label: taxon_label.clone(),
                    gene_hint: hint.clone(),
                    protein_hint: None,
                    header: None,
                    annotation: hint.unwrap_or_default(),
                    sequence: bases,
                    source_file: self.path.clone(),
                }),
                Ok(_) => Err(SplaceError::Parse(format!(
                    "empty CDS '{}' in {}",
                    hint.unwrap_or_default(),
                    taxon_label
                ))),
                Err(e) => Err(SplaceError::Parse(format!(
                    "cannot extract CDS '{}' in {}: {}",
                    hint.unwrap_or_default(),
                    taxon_label,
                    e
                ))),
            };
            self.pending.push_back(record);
        }
    }
}

impl Iterator for GenBankReader {
    type Item = Result<SourceRecord, SplaceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(record);
            }
            if self.finished {
                return None;
            }

            match self.reader.next() {
                Some(Ok(seq)) => self.queue_features(&seq),
                Some(Err(e)) => {
                    // the reader cannot resynchronise after a broken entry
                    self.finished = true;
                    return Some(Err(SplaceError::Parse(format!(
                        "malformed GenBank entry in {}: {}",
                        self.file_name(),
                        e
                    ))));
                }
                None => self.finished = true,
            }
        }
    }
}

fn is_cds(feature: &Feature) -> bool {
    feature.kind.to_string().eq_ignore_ascii_case("CDS")
}

fn qualifier(feature: &Feature, key: &str) -> Option<String> {
    feature
        .qualifier_values(key.into())
        .next()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `{organism}_{accession}` with spaces folded to underscores.
fn taxon_label(seq: &Seq, file_name: &str) -> String {
    let organism = seq
        .source
        .as_ref()
        .and_then(|s| s.organism.clone())
        .filter(|o| !o.trim().is_empty())
        .unwrap_or_else(|| format!("Unknown species in {}", file_name));
    let accession = seq
        .accession
        .clone()
        .or_else(|| seq.name.clone())
        .unwrap_or_else(|| "N/A".to_string());
    let accession = accession.split_whitespace().next().unwrap_or("N/A");

    format!("{}_{}", organism.trim().replace(' ', "_"), accession)
}
