use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static SPLACE_OUTPUT_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const MARKERS_DIR: &str = "01-markers";
pub const ALIGNED_DIR: &str = "02-aligned";
pub const TRIMMED_DIR: &str = "03-trimmed";
pub const PHYLOGENY_DIR: &str = "04-phylogeny";

pub const SUPERMATRIX_FILE: &str = "supermatrix.nex";

/// Default output root.
/// Checks SPLACE_OUTPUT_DIR environment variable, falls back to ./splace_output
pub fn default_output_dir() -> PathBuf {
    SPLACE_OUTPUT_DIR
        .get_or_init(|| {
            std::env::var("SPLACE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("splace_output"))
        })
        .clone()
}

/// Per-stage directories under one output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLayout {
    root: PathBuf,
}

impl StageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn markers_dir(&self) -> PathBuf {
        self.root.join(MARKERS_DIR)
    }

    pub fn aligned_dir(&self) -> PathBuf {
        self.root.join(ALIGNED_DIR)
    }

    pub fn trimmed_dir(&self) -> PathBuf {
        self.root.join(TRIMMED_DIR)
    }

    pub fn phylogeny_dir(&self) -> PathBuf {
        self.root.join(PHYLOGENY_DIR)
    }

    pub fn supermatrix_path(&self) -> PathBuf {
        self.phylogeny_dir().join(SUPERMATRIX_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_dirs_are_ordered_under_root() {
        let layout = StageLayout::new("/tmp/run");
        assert_eq!(layout.markers_dir(), PathBuf::from("/tmp/run/01-markers"));
        assert_eq!(layout.aligned_dir(), PathBuf::from("/tmp/run/02-aligned"));
        assert_eq!(layout.trimmed_dir(), PathBuf::from("/tmp/run/03-trimmed"));
        assert_eq!(
            layout.supermatrix_path(),
            PathBuf::from("/tmp/run/04-phylogeny/supermatrix.nex")
        );
    }
}
