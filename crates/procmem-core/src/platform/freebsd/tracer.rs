//! # FreeBSD `ptrace(2)` Tracer
//!
//! [`Tracer`] implementation on top of FreeBSD's `ptrace(2)`.
//!
//! ## Requests Used
//!
//! - `PT_ATTACH`: take trace control; the kernel sends the target `SIGSTOP`
//! - `PT_DETACH`: release trace control; `addr == 1` resumes where it stopped
//! - `PT_VM_ENTRY`: iterate the target's `vm_map`, one entry per call
//! - `PT_IO` with `PIOD_READ_D`: bulk copy from the target's address space
//!
//! The stop after `PT_ATTACH` is collected with `waitpid(2)`.
//!
//! ## References
//!
//! - [ptrace(2) man page](https://man.freebsd.org/cgi/man.cgi?query=ptrace&sektion=2)
//! - [waitpid(2) man page](https://man.freebsd.org/cgi/man.cgi?query=waitpid&sektion=2)

use std::ffi::{CStr, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use libc::{c_char, c_int, c_void, pid_t};

use crate::tracer::Tracer;
use crate::types::{Address, Protection, ProcessId, VmEntry};

/// Size of the scratch buffer the kernel writes backing-file paths into.
const PATH_SCRATCH_LEN: usize = 4096;

/// `addr` value for `PT_DETACH` meaning "continue from where it stopped".
const RESUME_IN_PLACE: usize = 1;

/// `ptrace(2)` backed tracer
///
/// Holds the path scratch buffer `PT_VM_ENTRY` writes into, so enumerating
/// the map does not allocate per call beyond the returned `PathBuf`.
#[derive(Debug)]
pub struct FreeBsdTracer
{
    path_scratch: Box<[u8; PATH_SCRATCH_LEN]>,
}

impl Default for FreeBsdTracer
{
    fn default() -> Self
    {
        Self {
            path_scratch: Box::new([0; PATH_SCRATCH_LEN]),
        }
    }
}

impl FreeBsdTracer
{
    /// Create a tracer.
    pub fn new() -> Self
    {
        Self::default()
    }
}

fn raw_pid(pid: ProcessId) -> io::Result<pid_t>
{
    pid_t::try_from(pid.0).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("PID {pid} out of range")))
}

/// Issue a `ptrace` request, mapping `-1` to the current `errno`.
///
/// ## Safety
///
/// `addr` must be valid for whatever `request` does with it.
unsafe fn ptrace(request: c_int, pid: pid_t, addr: *mut c_char, data: c_int) -> io::Result<()>
{
    if libc::ptrace(request, pid, addr, data) == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Tracer for FreeBsdTracer
{
    fn attach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        let pid = raw_pid(pid)?;
        // SAFETY: PT_ATTACH ignores addr and data.
        unsafe { ptrace(libc::PT_ATTACH, pid, std::ptr::null_mut(), 0) }
    }

    fn wait_for_stop(&mut self, pid: ProcessId) -> io::Result<()>
    {
        let pid = raw_pid(pid)?;
        let mut status: c_int = 0;

        // SAFETY: status is a valid, writable c_int.
        if unsafe { libc::waitpid(pid, &mut status, 0) } == -1 {
            return Err(io::Error::last_os_error());
        }

        if !libc::WIFSTOPPED(status) {
            return Err(io::Error::other(format!(
                "process {pid} changed state without stopping (status 0x{status:x})"
            )));
        }
        Ok(())
    }

    fn detach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        let pid = raw_pid(pid)?;
        // SAFETY: for PT_DETACH addr is a resume address, not dereferenced by
        // us; 1 means "where it stopped".
        unsafe { ptrace(libc::PT_DETACH, pid, RESUME_IN_PLACE as *mut c_char, 0) }
    }

    fn next_vm_entry(&mut self, pid: ProcessId, entry: &mut VmEntry) -> io::Result<()>
    {
        let pid = raw_pid(pid)?;

        // SAFETY: ptrace_vm_entry is plain old data; all-zero is valid.
        let mut raw: libc::ptrace_vm_entry = unsafe { std::mem::zeroed() };
        raw.pve_entry = entry.entry;
        raw.pve_timestamp = entry.timestamp;
        raw.pve_path = self.path_scratch[..].as_mut_ptr().cast::<c_char>();
        raw.pve_pathlen = PATH_SCRATCH_LEN as libc::c_uint;

        // SAFETY: raw is a valid ptrace_vm_entry whose pve_path points at
        // PATH_SCRATCH_LEN writable bytes, as advertised in pve_pathlen.
        unsafe { ptrace(libc::PT_VM_ENTRY, pid, (&mut raw as *mut libc::ptrace_vm_entry).cast::<c_char>(), 0)? };

        let path = if raw.pve_pathlen > 0 {
            CStr::from_bytes_until_nul(&self.path_scratch[..])
                .ok()
                .filter(|path| !path.is_empty())
                .map(|path| PathBuf::from(OsStr::from_bytes(path.to_bytes())))
        } else {
            None
        };

        *entry = VmEntry {
            entry: raw.pve_entry,
            timestamp: raw.pve_timestamp,
            start: raw.pve_start as u64,
            end: raw.pve_end as u64,
            offset: raw.pve_offset as u64,
            protection: Protection(raw.pve_prot as u32),
            path,
        };
        Ok(())
    }

    fn read_memory(&mut self, pid: ProcessId, address: Address, buf: &mut [u8]) -> io::Result<()>
    {
        let pid = raw_pid(pid)?;
        let requested = buf.len();

        let mut io_desc = libc::ptrace_io_desc {
            piod_op: libc::PIOD_READ_D,
            piod_offs: address.value() as usize as *mut c_void,
            piod_addr: buf.as_mut_ptr().cast::<c_void>(),
            piod_len: requested,
        };

        // SAFETY: piod_addr points at `requested` writable bytes owned by buf,
        // which outlives the call. piod_offs is an address in the target and
        // is only interpreted by the kernel.
        unsafe { ptrace(libc::PT_IO, pid, (&mut io_desc as *mut libc::ptrace_io_desc).cast::<c_char>(), 0)? };

        if io_desc.piod_len != requested {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short read at {address}: {} of {requested} bytes", io_desc.piod_len),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_pid_out_of_range_rejected()
    {
        let err = raw_pid(ProcessId::from(u32::MAX)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_attach_nonexistent_pid_fails()
    {
        let mut tracer = FreeBsdTracer::new();
        // pid_t max is never a live process on a stock kernel (PID_MAX is 99999).
        assert!(tracer.attach(ProcessId::from(i32::MAX as u32)).is_err());
    }
}
