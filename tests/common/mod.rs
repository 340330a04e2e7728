//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary working tree with `input/` and `out/` underneath
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("input")).expect("Failed to create input dir");
        TestEnvironment { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn input_dir(&self) -> PathBuf {
        self.path("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path("out")
    }

    /// Write `contents` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Executable POSIX shell script under `bin/`
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write(&format!("bin/{}", name), &format!("#!/bin/sh\n{}\n", body));
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Stand-in for MAFFT: prints the input file (last argument) unchanged
    #[cfg(unix)]
    pub fn fake_mafft(&self) -> PathBuf {
        self.script("mafft", "for last; do :; done\ncat \"$last\"")
    }

    /// Stand-in for trimAl: copies `-in` to `-out`
    #[cfg(unix)]
    pub fn fake_trimal(&self) -> PathBuf {
        self.script(
            "trimal",
            r#"while [ $# -gt 0 ]; do
  case "$1" in
    -in) in="$2"; shift 2;;
    -out) out="$2"; shift 2;;
    *) shift;;
  esac
done
cp "$in" "$out""#,
        )
    }

    /// Stand-in for IQ-TREE: writes `<prefix>.treefile`
    #[cfg(unix)]
    pub fn fake_iqtree(&self, name: &str) -> PathBuf {
        self.script(
            name,
            r#"while [ $# -gt 0 ]; do
  case "$1" in
    -pre) pre="$2"; shift 2;;
    *) shift;;
  esac
done
echo "(A,B,C);" > "$pre.treefile""#,
        )
    }
}

/// Per-gene trimmed alignment with `(taxon, sequence)` rows
pub fn alignment(rows: &[(&str, &str)]) -> String {
    rows.iter()
        .map(|(taxon, seq)| format!(">{}\n{}\n", taxon, seq))
        .collect()
}

/// Minimal mitochondrial GenBank record with two CDS features
pub const MITO_GENBANK: &str = "\
LOCUS       NC_000001                 24 bp    DNA     circular VRT 01-JAN-2020
DEFINITION  Testus exemplaris mitochondrion, complete genome.
ACCESSION   NC_000001
VERSION     NC_000001.1
SOURCE      mitochondrion Testus exemplaris
  ORGANISM  Testus exemplaris
            Eukaryota; Chordata.
FEATURES             Location/Qualifiers
     source          1..24
                     /organism=\"Testus exemplaris\"
     CDS             1..9
                     /gene=\"COX1\"
                     /product=\"cytochrome c oxidase subunit I\"
     CDS             complement(13..21)
                     /product=\"cytochrome b\"
ORIGIN
        1 atggcaccat aaaaacccgg gttt
//
";
