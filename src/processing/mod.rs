pub mod extractor;
pub mod runner;

pub use extractor::{FileExtraction, MarkerExtractor};
pub use runner::{StageFailure, StageOutcome, StageRunner};
