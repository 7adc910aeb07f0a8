//! # procmem-core
//!
//! Enumerate and read the mapped memory of a live process, for pattern
//! scanners.
//!
//! This crate provides:
//! - Process attachment: trace control plus a confirmed stop, released on
//!   detach or drop
//! - Region iteration: the target's memory map carved into bounded blocks
//! - Block reading: one bulk read per block into a reusable buffer
//!
//! It does not interpret the bytes it reads and never retries a failed
//! kernel call.
//!
//! ## Platform Support
//!
//! - **FreeBSD**: `ptrace(2)` (`PT_ATTACH`, `PT_VM_ENTRY`, `PT_IO`)
//!
//! The iterator and reader are platform independent and work with any
//! [`Tracer`].
//!
//! ## Why unsafe code is needed
//!
//! The FreeBSD backend calls `ptrace(2)` and `waitpid(2)` with raw pointers
//! to kernel records and to our own buffers. Those calls are wrapped in the
//! safe [`Tracer`] interface; nothing else in the crate is `unsafe`.

#![allow(unsafe_code)] // Required for ptrace(2)

pub mod attachment;
pub mod buffer;
pub mod config;
pub mod error;
pub mod iterator;
pub mod platform;
pub mod prelude;
pub mod reader;
pub mod tracer;
pub mod types;

pub use attachment::ProcessAttachment;
pub use buffer::ReusableBuffer;
pub use config::{ChunkSizeSource, ScanConfig};
// Re-export commonly used types
pub use error::{ErrorCode, ScanError, ScanResult};
pub use iterator::MemoryRegionIterator;
pub use reader::MemoryBlockReader;
pub use tracer::Tracer;
pub use types::{Address, MemoryBlock, ProcessId, RegionInfo};
