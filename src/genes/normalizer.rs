//! Free-text gene/product label normalization.
//!
//! [`GeneNormalizer`] is the seam the resolver calls when a label is not a
//! vocabulary symbol already. [`SynonymNormalizer`] is the built-in
//! implementation: a synonym table plus structured product-name patterns for
//! the mitochondrial and chloroplast marker sets.

use super::vocabulary::OrganelleType;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Maps free text to a canonical gene symbol, or `None` when not found
pub trait GeneNormalizer: Send + Sync {
    fn normalize(&self, text: &str, organelle: OrganelleType) -> Option<String>;
}

enum RuleSymbol {
    Fixed(&'static str),
    Captured(fn(&Captures) -> Option<String>),
}

struct Rule {
    pattern: Regex,
    symbol: RuleSymbol,
}

impl Rule {
    fn fixed(pattern: &str, symbol: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid normalizer pattern"),
            symbol: RuleSymbol::Fixed(symbol),
        }
    }

    fn captured(pattern: &str, build: fn(&Captures) -> Option<String>) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid normalizer pattern"),
            symbol: RuleSymbol::Captured(build),
        }
    }

    fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        match &self.symbol {
            RuleSymbol::Fixed(symbol) => Some(symbol.to_string()),
            RuleSymbol::Captured(build) => build(&caps),
        }
    }
}

fn roman_or_digit(value: &str) -> Option<u8> {
    match value {
        "1" | "i" => Some(1),
        "2" | "ii" => Some(2),
        "3" | "iii" => Some(3),
        _ => None,
    }
}

fn cox_symbol(caps: &Captures) -> Option<String> {
    let n = roman_or_digit(&caps[1])?;
    Some(format!("CO{}", "I".repeat(n as usize)))
}

fn nd_symbol(caps: &Captures) -> Option<String> {
    Some(format!("ND{}", caps[1].to_uppercase()))
}

fn atp_symbol(caps: &Captures) -> Option<String> {
    Some(format!("ATP{}", &caps[1]))
}

fn psb_symbol(caps: &Captures) -> Option<String> {
    Some(format!("psb{}", caps[1].to_uppercase()))
}

fn mitochondrial_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule::captured(
                r"^(?:mt )?(?:cytochrome c oxidase subunit|cytochrome oxidase subunit|cytochrome c oxidase polypeptide|cox|co) ?(iii|ii|i|[123])$",
                cox_symbol,
            ),
            Rule::fixed(r"^(?:mt )?(?:apo)?(?:cytochrome b|cyt b|cytb|cob|cyb)$", "CYTB"),
            Rule::captured(
                r"^(?:mt )?(?:nadh dehydrogenase subunit|nadh ubiquinone oxidoreductase (?:chain|subunit)|nadh|nad|nd) ?(4l|[1-6])$",
                nd_symbol,
            ),
            Rule::captured(
                r"^(?:mt )?(?:atp synthase f0 subunit|atp synthase fo subunit|atp synthase subunit|atpase subunit|atpase|atp) ?([68])$",
                atp_symbol,
            ),
        ]
    })
}

fn chloroplast_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule::fixed(
                r"^(?:rbcl|rubisco large subunit|ribulose (?:1 5 )?bisphosphate carboxylase(?: oxygenase)? large (?:subunit|chain))$",
                "rbcL",
            ),
            Rule::fixed(r"^(?:matk|maturase k|maturase)$", "matK"),
            Rule::fixed(
                r"^(?:ndhf|ndh f|nadh dehydrogenase subunit (?:f|5)|nadh plastoquinone oxidoreductase subunit 5)$",
                "ndhF",
            ),
            Rule::fixed(
                r"^(?:atpb|atp synthase (?:cf1 )?beta (?:subunit|chain)|atp synthase subunit beta)$",
                "atpB",
            ),
            Rule::fixed(
                r"^(?:psaa|photosystem i p700 (?:chlorophyll a )?apoprotein a1)$",
                "psaA",
            ),
            Rule::captured(r"^psb ?([a-fh-nt])$", psb_symbol),
            Rule::fixed(r"^photosystem ii (?:protein d1|reaction center protein d1|q b protein)$", "psbA"),
            Rule::fixed(r"^photosystem ii (?:protein d2|reaction center protein d2)$", "psbD"),
            Rule::fixed(r"^photosystem ii cp47", "psbB"),
            Rule::fixed(r"^photosystem ii cp43", "psbC"),
            Rule::fixed(r"^(?:photosystem ii )?cytochrome b559 alpha", "psbE"),
            Rule::fixed(r"^(?:photosystem ii )?cytochrome b559 beta", "psbF"),
            Rule::fixed(r"^photosystem ii (?:10 kda )?phosphoprotein$", "psbH"),
            Rule::captured(
                r"^photosystem ii (?:reaction center )?protein ([hijklmnt])$",
                psb_symbol,
            ),
        ]
    })
}

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Table-and-pattern normalizer with optional user-supplied synonyms
#[derive(Debug, Clone, Default)]
pub struct SynonymNormalizer {
    extra: HashMap<String, String>,
}

impl SynonymNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add user synonyms (`raw text -> canonical symbol`). Extra entries are
    /// consulted before the built-in rules.
    pub fn with_synonyms<I, K, V>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (raw, symbol) in synonyms {
            self.extra.insert(normalize_text(raw.as_ref()), symbol.into());
        }
        self
    }
}

impl GeneNormalizer for SynonymNormalizer {
    fn normalize(&self, text: &str, organelle: OrganelleType) -> Option<String> {
        let text = normalize_text(text);
        if text.is_empty() {
            return None;
        }
        if let Some(symbol) = self.extra.get(&text) {
            return Some(symbol.clone());
        }

        let rules = match organelle {
            OrganelleType::Mitochondrial => mitochondrial_rules(),
            OrganelleType::Chloroplast => chloroplast_rules(),
        };
        rules.iter().find_map(|rule| rule.apply(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(text: &str) -> Option<String> {
        SynonymNormalizer::new().normalize(text, OrganelleType::Mitochondrial)
    }

    fn cp(text: &str) -> Option<String> {
        SynonymNormalizer::new().normalize(text, OrganelleType::Chloroplast)
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(
            normalize_text("Ribulose-1,5-bisphosphate carboxylase/oxygenase  large subunit"),
            "ribulose 1 5 bisphosphate carboxylase oxygenase large subunit"
        );
        assert_eq!(normalize_text("  MT-CO1 "), "mt co1");
    }

    #[test]
    fn test_mitochondrial_products() {
        assert_eq!(mt("cytochrome c oxidase subunit I").as_deref(), Some("COI"));
        assert_eq!(mt("cytochrome c oxidase subunit 3").as_deref(), Some("COIII"));
        assert_eq!(mt("COX2").as_deref(), Some("COII"));
        assert_eq!(mt("MT-CO1").as_deref(), Some("COI"));
        assert_eq!(mt("cytochrome b").as_deref(), Some("CYTB"));
        assert_eq!(mt("cob").as_deref(), Some("CYTB"));
        assert_eq!(mt("NADH dehydrogenase subunit 4L").as_deref(), Some("ND4L"));
        assert_eq!(mt("nad5").as_deref(), Some("ND5"));
        assert_eq!(mt("ATP synthase F0 subunit 8").as_deref(), Some("ATP8"));
        assert_eq!(mt("ATPase 6").as_deref(), Some("ATP6"));
        assert_eq!(mt("16S ribosomal RNA"), None);
        assert_eq!(mt(""), None);
    }

    #[test]
    fn test_chloroplast_products() {
        assert_eq!(
            cp("ribulose-1,5-bisphosphate carboxylase/oxygenase large subunit").as_deref(),
            Some("rbcL")
        );
        assert_eq!(cp("maturase K").as_deref(), Some("matK"));
        assert_eq!(cp("photosystem II protein D1").as_deref(), Some("psbA"));
        assert_eq!(cp("photosystem II CP47 chlorophyll apoprotein").as_deref(), Some("psbB"));
        assert_eq!(cp("cytochrome b559 alpha subunit").as_deref(), Some("psbE"));
        assert_eq!(cp("photosystem II protein T").as_deref(), Some("psbT"));
        assert_eq!(cp("psbN").as_deref(), Some("psbN"));
        assert_eq!(cp("ATP synthase CF1 beta subunit").as_deref(), Some("atpB"));
        // mitochondrial names are not chloroplast markers
        assert_eq!(cp("cytochrome c oxidase subunit I"), None);
    }

    #[test]
    fn test_user_synonyms_take_precedence() {
        let normalizer = SynonymNormalizer::new().with_synonyms([("COXI-like", "COI")]);
        assert_eq!(
            normalizer
                .normalize("coxi like", OrganelleType::Mitochondrial)
                .as_deref(),
            Some("COI")
        );
    }
}
