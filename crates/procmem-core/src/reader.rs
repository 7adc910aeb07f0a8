//! Block reads into the session buffer.

use crate::buffer::ReusableBuffer;
use crate::error::{ScanError, ScanResult};
use crate::tracer::Tracer;
use crate::types::{MemoryBlock, ProcessId};

/// Reads one block at a time into a [`ReusableBuffer`]
///
/// The reader holds no cursor state. A failed read affects only the block
/// being read; the next block can be fetched as if nothing happened.
#[derive(Debug, Default)]
pub struct MemoryBlockReader
{
    buffer: ReusableBuffer,
}

impl MemoryBlockReader
{
    /// A reader with an empty buffer.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// The buffer backing fetched blocks.
    pub fn buffer(&self) -> &ReusableBuffer
    {
        &self.buffer
    }

    /// Read `block` from `pid` with one bulk transfer.
    ///
    /// The returned bytes live in the reader's buffer and are overwritten by
    /// the next call.
    ///
    /// ## Errors
    ///
    /// - `InsufficientMemory`: the buffer could not grow to `block.size`
    /// - `Io`: the tracer failed (page unmapped since enumeration, permission
    ///   revoked, process gone, short transfer)
    pub fn read<T: Tracer + ?Sized>(&mut self, tracer: &mut T, pid: ProcessId, block: &MemoryBlock) -> ScanResult<&[u8]>
    {
        self.buffer.ensure_capacity(block.size)?;

        // ensure_capacity already proved the size fits in usize.
        let len = usize::try_from(block.size).map_err(|_| ScanError::InsufficientMemory { requested: block.size })?;

        tracer.read_memory(pid, block.base, self.buffer.slice_mut(len))?;
        Ok(self.buffer.slice(len))
    }
}
