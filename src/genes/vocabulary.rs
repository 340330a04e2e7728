use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which organelle genome the markers come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum OrganelleType {
    #[serde(rename = "mt")]
    #[value(name = "mt")]
    Mitochondrial,
    #[serde(rename = "cp")]
    #[value(name = "cp")]
    Chloroplast,
}

impl OrganelleType {
    pub fn code(&self) -> &'static str {
        match self {
            OrganelleType::Mitochondrial => "mt",
            OrganelleType::Chloroplast => "cp",
        }
    }
}

impl fmt::Display for OrganelleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrganelleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mt" | "mito" | "mitochondrial" => Ok(OrganelleType::Mitochondrial),
            "cp" | "chloro" | "chloroplast" => Ok(OrganelleType::Chloroplast),
            _ => Err(format!("Unknown organelle type: {} (expected mt or cp)", s)),
        }
    }
}

const MITOCHONDRIAL_GENES: &[&str] = &[
    "COI", "COII", "COIII", "CYTB", "ND1", "ND2", "ND3", "ND4", "ND4L", "ND5", "ND6", "ATP6",
    "ATP8",
];

const CHLOROPLAST_GENES: &[&str] = &[
    "rbcL", "matK", "ndhF", "atpB", "psaA", "psbA", "psbB", "psbC", "psbD", "psbE", "psbF",
    "psbH", "psbI", "psbJ", "psbK", "psbL", "psbM", "psbN", "psbT",
];

/// Fixed set of canonical marker symbols for one organelle type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneVocabulary {
    organelle: OrganelleType,
    genes: &'static [&'static str],
}

impl GeneVocabulary {
    pub fn for_organelle(organelle: OrganelleType) -> Self {
        let genes = match organelle {
            OrganelleType::Mitochondrial => MITOCHONDRIAL_GENES,
            OrganelleType::Chloroplast => CHLOROPLAST_GENES,
        };
        Self { organelle, genes }
    }

    pub fn organelle(&self) -> OrganelleType {
        self.organelle
    }

    pub fn genes(&self) -> &'static [&'static str] {
        self.genes
    }

    /// Exact membership test on a canonical symbol
    pub fn contains(&self, symbol: &str) -> bool {
        self.genes.contains(&symbol)
    }

    /// Case-insensitive match returning the canonical spelling
    pub fn lookup(&self, label: &str) -> Option<&'static str> {
        let label = label.trim();
        self.genes
            .iter()
            .copied()
            .find(|gene| gene.eq_ignore_ascii_case(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive_but_returns_canonical() {
        let cp = GeneVocabulary::for_organelle(OrganelleType::Chloroplast);
        assert_eq!(cp.lookup("RBCL"), Some("rbcL"));
        assert_eq!(cp.lookup(" psba "), Some("psbA"));
        assert_eq!(cp.lookup("COI"), None);

        let mt = GeneVocabulary::for_organelle(OrganelleType::Mitochondrial);
        assert_eq!(mt.lookup("nd4l"), Some("ND4L"));
        assert!(mt.contains("CYTB"));
        assert!(!mt.contains("cytb"));
        assert_eq!(mt.genes().len(), 13);
    }

    #[test]
    fn test_organelle_parsing() {
        assert_eq!("mt".parse::<OrganelleType>().unwrap(), OrganelleType::Mitochondrial);
        assert_eq!("CP".parse::<OrganelleType>().unwrap(), OrganelleType::Chloroplast);
        assert!("nuclear".parse::<OrganelleType>().is_err());
        assert_eq!(OrganelleType::Chloroplast.to_string(), "cp");
    }
}
