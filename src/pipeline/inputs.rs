use crate::bio::source::InputFormat;
use crate::SplaceError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Every FASTA/GenBank file under `dir`, recursively, in sorted order.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, SplaceError> {
    if !dir.is_dir() {
        return Err(SplaceError::Config(format!(
            "input directory does not exist: {}",
            dir.display()
        )));
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path under {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && InputFormat::from_path(entry.path()).is_some() {
            inputs.push(entry.into_path());
        }
    }
    inputs.sort();

    debug!("Found {} input files under {}", inputs.len(), dir.display());
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_supported_files_recursively() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("batch2");
        std::fs::create_dir(&nested).unwrap();
        for name in ["b.fasta", "a.GBK", "notes.txt", "c.fa.gz"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::write(nested.join("d.fas"), "").unwrap();

        let found = discover_inputs(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.GBK", "b.fasta", "batch2/d.fas", "c.fa.gz"]);
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let err = discover_inputs(Path::new("/no/such/splace/input")).unwrap_err();
        assert!(matches!(err, SplaceError::Config(_)));
    }
}
