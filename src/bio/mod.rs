pub mod fasta;
pub mod genbank;
pub mod sequence;
pub mod source;

pub use sequence::Sequence;
pub use source::{open_source, InputFormat, SourceRecord};
