pub mod supermatrix;

pub use supermatrix::{Partition, PartitionMap, Supermatrix, SupermatrixBuilder};
