//! Common module for library exports

pub use crate::attachment::ProcessAttachment;
pub use crate::config::{ChunkSizeSource, ScanConfig};
pub use crate::error::{ErrorCode, ScanError, ScanResult};
pub use crate::iterator::MemoryRegionIterator;
#[cfg(target_os = "freebsd")]
pub use crate::platform::freebsd::*;
pub use crate::tracer::Tracer;
pub use crate::types::{Address, MemoryBlock, ProcessId, Protection, RegionInfo, VmEntry};
