use regex::Regex;
use std::sync::OnceLock;

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            sequence,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn to_string(&self) -> String {
        String::from_utf8_lossy(&self.sequence).to_string()
    }

    /// Full header text without the leading '>' (id plus description).
    pub fn title(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {}", self.id, desc),
            None => self.id.clone(),
        }
    }

    /// Value of an embedded `[key=value]` annotation in the header, if any.
    pub fn bracket_tag(&self, key: &str) -> Option<String> {
        let desc = self.description.as_deref()?;
        let pattern = TAG_PATTERN
            .get_or_init(|| Regex::new(r"\[([A-Za-z_]+)=([^\]]+)\]").expect("valid tag pattern"));
        pattern
            .captures_iter(desc)
            .find(|caps| &caps[1] == key)
            .map(|caps| caps[2].trim().to_string())
    }
}
