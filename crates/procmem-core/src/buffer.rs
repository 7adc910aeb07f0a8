//! Reusable block buffer.
//!
//! A scan reads thousands of blocks, most of them the same size (the chunk
//! limit) or smaller. The buffer is therefore grown to the largest block seen
//! so far and then reused; it never shrinks and is not reallocated while it is
//! already large enough.

use std::alloc::{self, Layout};

use crate::error::{ScanError, ScanResult};

/// Fallibly allocate `len` zeroed bytes.
///
/// Goes through `alloc_zeroed`, so large blocks come back as untouched
/// zero pages instead of being written up front. `None` on allocation
/// failure or a size the allocator cannot describe.
fn try_zeroed(len: usize) -> Option<Vec<u8>>
{
    if len == 0 {
        return Some(Vec::new());
    }

    let layout = Layout::array::<u8>(len).ok()?;
    // SAFETY: layout has a non-zero size.
    let ptr = unsafe { alloc::alloc_zeroed(layout) };
    if ptr.is_null() {
        return None;
    }

    // SAFETY: ptr comes from the global allocator with the layout of a
    // `[u8; len]`, and all `len` bytes are initialized (zeroed).
    Some(unsafe { Vec::from_raw_parts(ptr, len, len) })
}

/// Owned byte buffer whose capacity only ever grows
///
/// The one exception is an allocation failure: the old storage has already
/// been released at that point, so the capacity drops to zero and the next
/// request starts from scratch.
#[derive(Debug, Default)]
pub struct ReusableBuffer
{
    data: Vec<u8>,
    reallocations: usize,
}

impl ReusableBuffer
{
    /// An empty buffer. Nothing is allocated until the first request.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Usable size in bytes.
    pub fn capacity(&self) -> usize
    {
        self.data.len()
    }

    /// Number of times storage has been (re)allocated.
    pub fn reallocations(&self) -> usize
    {
        self.reallocations
    }

    /// Make sure at least `size` bytes are available.
    ///
    /// Returns `true` if new storage had to be allocated.
    ///
    /// ## Errors
    ///
    /// - `InsufficientMemory`: `size` does not fit in memory (or in `usize`).
    ///   The buffer is left empty.
    pub fn ensure_capacity(&mut self, size: u64) -> ScanResult<bool>
    {
        let Ok(wanted) = usize::try_from(size) else {
            self.data = Vec::new();
            return Err(ScanError::InsufficientMemory { requested: size });
        };

        if self.data.len() >= wanted {
            return Ok(false);
        }

        // Release the old block first; its contents are never needed again.
        self.data = Vec::new();

        let Some(fresh) = try_zeroed(wanted) else {
            return Err(ScanError::InsufficientMemory { requested: size });
        };

        self.data = fresh;
        self.reallocations += 1;
        Ok(true)
    }

    /// The first `len` bytes, for the tracer to fill.
    ///
    /// `len` must not exceed [`capacity`](Self::capacity).
    pub(crate) fn slice_mut(&mut self, len: usize) -> &mut [u8]
    {
        &mut self.data[..len]
    }

    /// The first `len` bytes, as last written.
    pub(crate) fn slice(&self, len: usize) -> &[u8]
    {
        &self.data[..len]
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_new_buffer_is_empty()
    {
        let buffer = ReusableBuffer::new();
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.reallocations(), 0);
    }

    #[test]
    fn test_grows_once_for_mixed_sizes()
    {
        let mut buffer = ReusableBuffer::new();
        let grew: Vec<bool> = [4096u64, 1024, 4096, 512]
            .iter()
            .map(|&size| buffer.ensure_capacity(size).unwrap())
            .collect();

        assert_eq!(grew, vec![true, false, false, false]);
        assert_eq!(buffer.reallocations(), 1);
        assert_eq!(buffer.capacity(), 4096);
    }

    #[test]
    fn test_capacity_is_monotonic()
    {
        let mut buffer = ReusableBuffer::new();
        let mut previous = 0;
        for size in [16u64, 8, 64, 32, 64, 128, 1] {
            buffer.ensure_capacity(size).unwrap();
            assert!(buffer.capacity() >= previous);
            assert!(buffer.capacity() as u64 >= size);
            previous = buffer.capacity();
        }
        // 16, 64 and 128 each outgrow the buffer.
        assert_eq!(buffer.reallocations(), 3);
    }

    #[test]
    fn test_allocation_failure_resets_capacity()
    {
        let mut buffer = ReusableBuffer::new();
        buffer.ensure_capacity(256).unwrap();

        let err = buffer.ensure_capacity(u64::MAX).unwrap_err();
        assert!(matches!(err, ScanError::InsufficientMemory { requested: u64::MAX }));
        assert_eq!(buffer.capacity(), 0);

        // The next request allocates again.
        assert!(buffer.ensure_capacity(128).unwrap());
        assert_eq!(buffer.capacity(), 128);
    }

    #[test]
    fn test_fresh_storage_is_zeroed()
    {
        let mut buffer = ReusableBuffer::new();
        buffer.ensure_capacity(64).unwrap();
        buffer.slice_mut(64).fill(0xaa);

        assert!(buffer.ensure_capacity(1 << 20).unwrap());
        assert!(buffer.slice(1 << 20).iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_size_beyond_allocator_limit_rejected()
    {
        let mut buffer = ReusableBuffer::new();
        let too_large = isize::MAX as u64 + 1;

        let err = buffer.ensure_capacity(too_large).unwrap_err();
        assert!(matches!(err, ScanError::InsufficientMemory { requested } if requested == too_large));
        assert_eq!(buffer.reallocations(), 0);
    }
}
