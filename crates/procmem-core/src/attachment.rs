//! # Process Attachment
//!
//! Owns the trace relationship with one target process.
//!
//! Attaching is a two-step protocol: ask the kernel for trace control, then
//! wait until it confirms the target has stopped. [`ProcessAttachment::attach`]
//! performs both steps and only returns a handle once the process is known to
//! be stopped, so there is never a half-attached handle to clean up.
//!
//! ## Lifecycle
//!
//! 1. Attach: [`ProcessAttachment::attach`] (the target stops executing)
//! 2. Walk memory: [`ProcessAttachment::regions`]
//! 3. Detach: [`ProcessAttachment::detach`] (the target resumes)
//!
//! If the handle is dropped without an explicit detach (early return, `?`,
//! panic unwinding), `Drop` detaches on a best-effort basis, so trace control
//! is released on every exit path.

use crate::config::ChunkSizeSource;
use crate::error::{ScanError, ScanResult};
use crate::iterator::MemoryRegionIterator;
use crate::tracer::Tracer;
use crate::types::ProcessId;

/// A stopped process under exclusive trace control
///
/// ## Example
///
/// ```rust,ignore
/// use procmem_core::platform::freebsd::FreeBsdTracer;
/// use procmem_core::{ProcessAttachment, ProcessId};
///
/// let mut attachment = ProcessAttachment::attach(FreeBsdTracer::new(), ProcessId::from(1234))?;
/// let mut regions = attachment.regions(0x10000_u64);
/// let mut block = regions.first()?;
/// loop {
///     if let Some(bytes) = regions.fetch(&block) {
///         println!("{block}: {} bytes", bytes.len());
///     }
///     match regions.next() {
///         Some(next) => block = next,
///         None => break,
///     }
/// }
/// drop(regions);
/// attachment.detach()?;
/// # Ok::<(), procmem_core::ScanError>(())
/// ```
#[derive(Debug)]
pub struct ProcessAttachment<T: Tracer>
{
    tracer: T,
    pid: ProcessId,
    attached: bool,
}

impl<T: Tracer> ProcessAttachment<T>
{
    /// Take trace control of `pid` and wait for it to stop.
    ///
    /// ## Errors
    ///
    /// - `CouldNotAttachToProcess`: the kernel refused trace control (no such
    ///   process, insufficient privilege, already traced), or waiting for the
    ///   stop failed. In the latter case trace control is released again before
    ///   returning; a failure of that release is logged and otherwise ignored,
    ///   and the error carries the original cause.
    pub fn attach(mut tracer: T, pid: ProcessId) -> ScanResult<Self>
    {
        if let Err(source) = tracer.attach(pid) {
            tracing::debug!(pid = %pid, error = %source, "trace control refused");
            return Err(ScanError::CouldNotAttachToProcess { pid, source });
        }

        if let Err(source) = tracer.wait_for_stop(pid) {
            tracing::debug!(pid = %pid, error = %source, "process did not stop after attach");
            if let Err(cleanup) = tracer.detach(pid) {
                tracing::warn!(pid = %pid, error = %cleanup, "detach after failed wait also failed");
            }
            return Err(ScanError::CouldNotAttachToProcess { pid, source });
        }

        tracing::debug!(pid = %pid, "attached, process stopped");
        Ok(Self {
            tracer,
            pid,
            attached: true,
        })
    }

    /// The traced process.
    pub fn pid(&self) -> ProcessId
    {
        self.pid
    }

    /// Start a region walk over this process.
    ///
    /// `config` is queried for the maximum block size on every step. Pass a
    /// plain `u64` for a fixed limit or a [`ScanConfig`](crate::ScanConfig)
    /// handle for one that can change mid-scan.
    pub fn regions<C: ChunkSizeSource>(&mut self, config: C) -> MemoryRegionIterator<'_, T, C>
    {
        MemoryRegionIterator::new(self, config)
    }

    /// Release trace control and let the process continue.
    ///
    /// Consumes the handle: once detached, the process may run, exit or be
    /// attached by someone else, so nothing may touch it through this handle
    /// again. Taking `self` by value makes a second detach, or any use after
    /// detach, a compile error rather than a runtime hazard.
    ///
    /// ## Errors
    ///
    /// - `Io`: the kernel refused to detach (for example, the process exited
    ///   while stopped)
    pub fn detach(mut self) -> ScanResult<()>
    {
        self.attached = false;
        self.tracer.detach(self.pid)?;
        tracing::debug!(pid = %self.pid, "detached");
        Ok(())
    }

    pub(crate) fn tracer_mut(&mut self) -> &mut T
    {
        &mut self.tracer
    }
}

impl<T: Tracer> Drop for ProcessAttachment<T>
{
    fn drop(&mut self)
    {
        if self.attached {
            // Best effort detach - errors have nowhere to go
            if let Err(err) = self.tracer.detach(self.pid) {
                tracing::warn!(pid = %self.pid, error = %err, "detach on drop failed");
            } else {
                tracing::debug!(pid = %self.pid, "detached on drop");
            }
        }
    }
}
