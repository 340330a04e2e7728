pub mod inputs;
pub mod orchestrator;

pub use inputs::discover_inputs;
pub use orchestrator::{PipelineOrchestrator, PipelineReport, Stage, StageSummary};
