//! Competitor directory implementations

pub mod memory;

pub use memory::MemoryDirectory;
