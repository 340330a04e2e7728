pub mod normalizer;
pub mod resolver;
pub mod vocabulary;

pub use normalizer::{GeneNormalizer, SynonymNormalizer};
pub use resolver::GeneNameResolver;
pub use vocabulary::{GeneVocabulary, OrganelleType};
