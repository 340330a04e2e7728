/// External programs driven as subprocesses
pub mod iqtree;
pub mod mafft;
pub mod process;
pub mod traits;
pub mod trimal;

pub use iqtree::IqTree;
pub use mafft::Mafft;
pub use process::{find_executable, run_checked, run_command};
pub use traits::{run_tool_stage, StageTool};
pub use trimal::TrimAl;
