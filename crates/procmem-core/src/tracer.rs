//! # Tracer Trait
//!
//! The kernel tracing primitives the core is built on.
//!
//! Every call is single-shot and blocking: there is no retry, no partial
//! result and no asynchronous variant. Failures are reported as
//! `std::io::Error`, normally built from `errno`.
//!
//! ## Why use a trait?
//!
//! - The FreeBSD backend only compiles on FreeBSD, but the iteration and
//!   buffering logic is platform independent and deserves tests everywhere
//! - Tests can inject failures (unmapped pages, refused attach) on demand
//!
//! ## Implementations
//!
//! - **FreeBSD**: [`FreeBsdTracer`](crate::platform::freebsd::FreeBsdTracer),
//!   using `ptrace(2)` with `PT_ATTACH`, `PT_DETACH`, `PT_VM_ENTRY` and `PT_IO`

use std::io;

use crate::types::{Address, ProcessId, VmEntry};

/// Kernel tracing interface for one or more target processes
///
/// ## Thread Safety
///
/// Implementations are driven from a single thread per target. Nothing in the
/// core calls a tracer concurrently.
pub trait Tracer
{
    /// Request exclusive trace control of `pid`.
    ///
    /// On success the kernel has been asked to stop the process; the stop is
    /// not yet confirmed.
    fn attach(&mut self, pid: ProcessId) -> io::Result<()>;

    /// Block until the kernel reports that `pid` has stopped.
    ///
    /// Must fail if the wait itself fails or if the process changed state in
    /// any way other than stopping (for example, it exited).
    fn wait_for_stop(&mut self, pid: ProcessId) -> io::Result<()>;

    /// Release trace control of `pid`, letting it continue where it stopped.
    fn detach(&mut self, pid: ProcessId) -> io::Result<()>;

    /// Advance `entry` to the next map entry of `pid`.
    ///
    /// The kernel resumes after the entry identified by `entry.entry`; a
    /// rewound record (`entry.entry == 0`) yields the lowest mapped entry.
    /// Running off the end of the map is reported as an error (`ENOENT` on
    /// FreeBSD), exactly like a genuine failure.
    fn next_vm_entry(&mut self, pid: ProcessId, entry: &mut VmEntry) -> io::Result<()>;

    /// Copy exactly `buf.len()` bytes of `pid`'s memory at `address` into `buf`.
    ///
    /// A transfer shorter than requested is an error.
    fn read_memory(&mut self, pid: ProcessId, address: Address, buf: &mut [u8]) -> io::Result<()>;
}

impl<T: Tracer + ?Sized> Tracer for &mut T
{
    fn attach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        (**self).attach(pid)
    }

    fn wait_for_stop(&mut self, pid: ProcessId) -> io::Result<()>
    {
        (**self).wait_for_stop(pid)
    }

    fn detach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        (**self).detach(pid)
    }

    fn next_vm_entry(&mut self, pid: ProcessId, entry: &mut VmEntry) -> io::Result<()>
    {
        (**self).next_vm_entry(pid, entry)
    }

    fn read_memory(&mut self, pid: ProcessId, address: Address, buf: &mut [u8]) -> io::Result<()>
    {
        (**self).read_memory(pid, address, buf)
    }
}

impl<T: Tracer + ?Sized> Tracer for Box<T>
{
    fn attach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        (**self).attach(pid)
    }

    fn wait_for_stop(&mut self, pid: ProcessId) -> io::Result<()>
    {
        (**self).wait_for_stop(pid)
    }

    fn detach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        (**self).detach(pid)
    }

    fn next_vm_entry(&mut self, pid: ProcessId, entry: &mut VmEntry) -> io::Result<()>
    {
        (**self).next_vm_entry(pid, entry)
    }

    fn read_memory(&mut self, pid: ProcessId, address: Address, buf: &mut [u8]) -> io::Result<()>
    {
        (**self).read_memory(pid, address, buf)
    }
}
