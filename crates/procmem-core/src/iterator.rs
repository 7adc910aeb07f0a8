//! # Memory Region Iterator
//!
//! Walks the virtual-memory map of an attached process and carves each map
//! entry into blocks no larger than the configured chunk size.
//!
//! ## Algorithm
//!
//! The iterator remembers the last map entry the kernel returned and the last
//! block it emitted. On each step:
//!
//! 1. `begin` is the first address after the last block (0 at the start).
//! 2. If the entry ends at or before `begin`, the kernel is asked for the next
//!    entry and `begin` moves to its start. No entry means the walk is over.
//! 3. The chunk size is read from the configuration source.
//! 4. The block is `begin .. min(entry.end - begin + 1, chunk)`.
//!
//! Map entry ends are inclusive, hence the `+ 1`.
//!
//! ## Example
//!
//! With entries `0x1000..=0x1fff` and `0x5000..=0x5fff` and a chunk size of
//! `0x400`, the blocks are `0x1000`, `0x1400`, `0x1800`, `0x1c00`, `0x5000`,
//! `0x5400`, `0x5800` and `0x5c00`, each `0x400` bytes long.

use std::io;

use crate::attachment::ProcessAttachment;
use crate::config::ChunkSizeSource;
use crate::error::{ErrorCode, ScanError, ScanResult};
use crate::reader::MemoryBlockReader;
use crate::tracer::Tracer;
use crate::types::{Address, MemoryBlock, RegionInfo, VmEntry};

/// Position of the walk: the kernel's map-entry record and the last block.
#[derive(Debug, Default)]
struct RegionCursor
{
    entry: VmEntry,
    last: MemoryBlock,
}

impl RegionCursor
{
    fn rewind(&mut self)
    {
        self.entry = VmEntry::rewound();
        self.last = MemoryBlock::default();
    }

    /// First address not yet handed out.
    fn consumed(&self) -> u64
    {
        self.last.end().value()
    }
}

/// Block-by-block walk over one attached process
///
/// Created by [`ProcessAttachment::regions`]. The iterator mutably borrows
/// the attachment, so the handle cannot be detached (or walked twice) while a
/// walk is in progress.
///
/// Start with [`first`](Self::first), then use the [`Iterator`] impl. The
/// iterator also owns the session buffer used by [`fetch`](Self::fetch).
///
/// ## Errors vs. end of iteration
///
/// `next()` returns `None` both when the map is exhausted and when the kernel
/// call that enumerates it fails; the two are only told apart in the logs.
/// A chunk size that drops to zero mid-walk also ends it, logged at `error`.
/// `first()` is the exception: it rejects a zero chunk size with
/// `InvalidArgument`, and a walk that yields nothing at all is reported as
/// `CouldNotReadProcessMemory`.
pub struct MemoryRegionIterator<'a, T: Tracer, C: ChunkSizeSource>
{
    attachment: &'a mut ProcessAttachment<T>,
    config: C,
    cursor: RegionCursor,
    reader: MemoryBlockReader,
    last_error: ErrorCode,
}

impl<'a, T: Tracer, C: ChunkSizeSource> MemoryRegionIterator<'a, T, C>
{
    /// Create an iterator positioned before the first block.
    pub fn new(attachment: &'a mut ProcessAttachment<T>, config: C) -> Self
    {
        Self {
            attachment,
            config,
            cursor: RegionCursor::default(),
            reader: MemoryBlockReader::new(),
            last_error: ErrorCode::Success,
        }
    }

    /// Restart the walk at the bottom of the address space and return the
    /// first block.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the chunk size source reports zero
    /// - `CouldNotReadProcessMemory`: the map could not be enumerated at all
    pub fn first(&mut self) -> ScanResult<MemoryBlock>
    {
        if self.config.max_chunk_size() == 0 {
            return Err(ScanError::InvalidArgument("maximum chunk size must be non-zero".to_string()));
        }

        self.cursor.rewind();

        match self.next_block() {
            Some(block) => Ok(block),
            None => {
                let pid = self.attachment.pid();
                tracing::debug!(pid = %pid, "first map enumeration returned nothing");
                self.last_error = ErrorCode::CouldNotReadProcessMemory;
                Err(ScanError::CouldNotReadProcessMemory { pid })
            }
        }
    }

    /// Read the bytes of `block`.
    ///
    /// The slice borrows the iterator's buffer and is valid until the next
    /// `fetch`. Returns `None` if the block cannot be read; the walk itself is
    /// unaffected and the caller should simply skip the block. If the failure
    /// was an allocation failure, [`last_error`](Self::last_error) reports
    /// `InsufficientMemory`.
    pub fn fetch(&mut self, block: &MemoryBlock) -> Option<&[u8]>
    {
        let pid = self.attachment.pid();

        match self.reader.read(self.attachment.tracer_mut(), pid, block) {
            Ok(bytes) => Some(bytes),
            Err(err @ ScanError::InsufficientMemory { .. }) => {
                tracing::warn!(pid = %pid, block = %block, error = %err, "cannot allocate block buffer");
                self.last_error = err.code();
                None
            }
            Err(err) => {
                tracing::debug!(pid = %pid, block = %block, error = %err, "block unreadable, skipping");
                None
            }
        }
    }

    /// Status of the last structural event: `Success` after a normal step,
    /// `CouldNotReadProcessMemory` after an empty `first()`,
    /// `InsufficientMemory` after a failed buffer allocation.
    pub fn last_error(&self) -> ErrorCode
    {
        self.last_error
    }

    /// The map entry the most recent block belongs to.
    pub fn current_region(&self) -> Option<RegionInfo>
    {
        (self.cursor.last.size > 0).then(|| RegionInfo::from(&self.cursor.entry))
    }

    /// Current capacity of the session buffer, in bytes.
    pub fn buffer_capacity(&self) -> usize
    {
        self.reader.buffer().capacity()
    }

    fn next_block(&mut self) -> Option<MemoryBlock>
    {
        self.last_error = ErrorCode::Success;

        let pid = self.attachment.pid();
        let mut current_begin = self.cursor.consumed();

        if self.cursor.entry.end <= current_begin {
            if let Err(err) = self.attachment.tracer_mut().next_vm_entry(pid, &mut self.cursor.entry) {
                if err.kind() == io::ErrorKind::NotFound {
                    tracing::debug!(pid = %pid, "memory map exhausted");
                } else {
                    tracing::warn!(pid = %pid, error = %err, "map enumeration failed, ending walk");
                }
                return None;
            }
            current_begin = self.cursor.entry.start;
            tracing::trace!(
                pid = %pid,
                start = %Address::from(self.cursor.entry.start),
                end = %Address::from(self.cursor.entry.end),
                protection = %self.cursor.entry.protection,
                path = ?self.cursor.entry.path,
                "entered map entry"
            );
        }

        let max_chunk = self.config.max_chunk_size();
        if max_chunk == 0 {
            tracing::error!(pid = %pid, "maximum chunk size is zero, ending walk");
            return None;
        }

        let size = self
            .cursor
            .entry
            .end
            .checked_sub(current_begin)
            .map_or(0, |span| span.saturating_add(1).min(max_chunk));

        if size == 0 {
            tracing::error!(
                pid = %pid,
                begin = %Address::from(current_begin),
                end = %Address::from(self.cursor.entry.end),
                max_chunk,
                "map entry ends before the walk position, ending walk"
            );
            return None;
        }

        let block = MemoryBlock::new(Address::from(current_begin), size);
        self.cursor.last = block;
        Some(block)
    }
}

impl<T: Tracer, C: ChunkSizeSource> Iterator for MemoryRegionIterator<'_, T, C>
{
    type Item = MemoryBlock;

    fn next(&mut self) -> Option<MemoryBlock>
    {
        self.next_block()
    }
}
