use crate::bio::fasta::FastaReader;
use crate::bio::genbank::GenBankReader;
use crate::SplaceError;
use std::path::{Path, PathBuf};

/// Supported input containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Fasta,
    GenBank,
}

impl InputFormat {
    const FASTA_EXTENSIONS: [&'static str; 3] = ["fasta", "fa", "fas"];
    const GENBANK_EXTENSIONS: [&'static str; 3] = ["gb", "gbk", "genbank"];

    /// Detect the format from the file extension, looking through a
    /// trailing `.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = inner_extension(path)?.to_ascii_lowercase();
        if Self::FASTA_EXTENSIONS.contains(&ext.as_str()) {
            Some(InputFormat::Fasta)
        } else if Self::GENBANK_EXTENSIONS.contains(&ext.as_str()) {
            Some(InputFormat::GenBank)
        } else {
            None
        }
    }
}

/// One sequence pulled from an input container, before gene resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub taxon_label: String,
    /// Explicit gene label (`[gene=...]` tag or GenBank product)
    pub gene_hint: Option<String>,
    /// Explicit `[protein=...]` tag
    pub protein_hint: Option<String>,
    /// Raw FASTA header, kept for token-based fallback resolution
    pub header: Option<String>,
    pub annotation: String,
    pub sequence: Vec<u8>,
    pub source_file: PathBuf,
}

pub type SourceRecords = Box<dyn Iterator<Item = Result<SourceRecord, SplaceError>>>;

/// Open an input file and return a lazy stream of its records.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<SourceRecords, SplaceError> {
    let path = path.as_ref();
    match InputFormat::from_path(path) {
        Some(InputFormat::Fasta) => {
            let taxon_label = file_stem(path);
            let source_file = path.to_path_buf();
            let reader = FastaReader::open(path)?;
            Ok(Box::new(reader.map(move |item| {
                item.map(|seq| {
                    let header = seq.title();
                    SourceRecord {
                        taxon_label: taxon_label.clone(),
                        gene_hint: seq.bracket_tag("gene"),
                        protein_hint: seq.bracket_tag("protein"),
                        annotation: header.clone(),
                        header: Some(header),
                        sequence: seq.sequence,
                        source_file: source_file.clone(),
                    }
                })
            })))
        }
        Some(InputFormat::GenBank) => Ok(Box::new(GenBankReader::open(path)?)),
        None => Err(SplaceError::Parse(format!(
            "unsupported input format: {}",
            path.display()
        ))),
    }
}

/// File name without directory, `.gz` and format extension.
pub fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = strip_gz(&name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn strip_gz(name: &str) -> &str {
    let cut = name.len().saturating_sub(3);
    match name.get(cut..) {
        Some(suffix) if cut > 0 && suffix.eq_ignore_ascii_case(".gz") => &name[..cut],
        _ => name,
    }
}

fn inner_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = strip_gz(name);
    name.rsplit_once('.').map(|(_, ext)| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(InputFormat::from_path(Path::new("a/x.fasta")), Some(InputFormat::Fasta));
        assert_eq!(InputFormat::from_path(Path::new("x.FA")), Some(InputFormat::Fasta));
        assert_eq!(InputFormat::from_path(Path::new("x.fas.gz")), Some(InputFormat::Fasta));
        assert_eq!(InputFormat::from_path(Path::new("x.gbk")), Some(InputFormat::GenBank));
        assert_eq!(InputFormat::from_path(Path::new("x.genbank")), Some(InputFormat::GenBank));
        assert_eq!(InputFormat::from_path(Path::new("x.txt")), None);
        assert_eq!(InputFormat::from_path(Path::new("fasta")), None);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/data/ITV1046.fasta")), "ITV1046");
        assert_eq!(file_stem(Path::new("sample.v2.fa.gz")), "sample.v2");
        assert_eq!(file_stem(Path::new("Alius_primus.fasta.GZ")), "Alius_primus");
    }

    #[test]
    fn test_fasta_records_use_file_name_as_taxon() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ITV1046.fasta");
        std::fs::write(
            &path,
            ">cds_1 [gene=COX1] [protein=cytochrome c oxidase subunit I]\nATGC\n>atp8_ITV1046 atp8 ATP synthase F0 subunit 8 7816:7956 forward\nATGA\n",
        )
        .unwrap();

        let records: Vec<_> = open_source(&path)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.taxon_label == "ITV1046"));
        assert_eq!(records[0].gene_hint.as_deref(), Some("COX1"));
        assert_eq!(
            records[0].protein_hint.as_deref(),
            Some("cytochrome c oxidase subunit I")
        );
        assert_eq!(records[1].gene_hint, None);
        assert_eq!(
            records[1].header.as_deref(),
            Some("atp8_ITV1046 atp8 ATP synthase F0 subunit 8 7816:7956 forward")
        );
    }
}
