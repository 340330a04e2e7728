pub mod benchmark;
pub mod parallel;
pub mod progress;

pub use benchmark::Benchmark;
