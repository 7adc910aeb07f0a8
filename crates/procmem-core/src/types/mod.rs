//! # Types
//!
//! Platform-agnostic types used throughout the crate.
//!
//! These types keep the rest of the code free of kernel structures: the
//! iterator and reader speak in [`Address`], [`MemoryBlock`] and [`VmEntry`],
//! and only the platform backend converts to and from the raw records.

pub mod address;
pub mod process;
pub mod region;

// Re-export all public types
pub use address::Address;
pub use process::ProcessId;
pub use region::{MemoryBlock, Protection, RegionInfo, VmEntry};
