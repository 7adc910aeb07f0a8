//! # FreeBSD Implementation
//!
//! Process memory access through FreeBSD's `ptrace(2)`.
//!
//! Unlike Linux, FreeBSD exposes the memory map of a traced process directly
//! through `PT_VM_ENTRY`, so no procfs parsing is involved: the map is walked
//! entry by entry with the same kernel record passed back on each call.
//!
//! ## Permissions
//!
//! Attaching needs the usual debugging rights: same user and
//! `security.bsd.unprivileged_proc_debug=1`, or root. Processes in other jails
//! and `P_SUGID` processes are refused with `EPERM`.

pub mod tracer;

pub use tracer::FreeBsdTracer;

use crate::attachment::ProcessAttachment;
use crate::error::ScanResult;
use crate::types::ProcessId;

/// Attach to `pid` with a fresh [`FreeBsdTracer`].
///
/// ## Errors
///
/// - `CouldNotAttachToProcess`: see [`ProcessAttachment::attach`]
pub fn attach(pid: ProcessId) -> ScanResult<ProcessAttachment<FreeBsdTracer>>
{
    ProcessAttachment::attach(FreeBsdTracer::new(), pid)
}
