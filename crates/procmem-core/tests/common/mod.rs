//! In-memory tracer used by the integration tests.

#![allow(dead_code)]

use std::io;
use std::path::PathBuf;

use procmem_core::types::{Address, Protection, ProcessId, VmEntry};
use procmem_core::Tracer;

/// Kernel calls observed by [`FakeTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call
{
    Attach(ProcessId),
    Wait(ProcessId),
    Detach(ProcessId),
    VmEntry(i32),
    Read(u64, usize),
}

/// One mapped region of the fake address space. `end` is inclusive.
#[derive(Debug, Clone)]
pub struct FakeRegion
{
    pub start: u64,
    pub end: u64,
    pub protection: Protection,
    pub path: Option<PathBuf>,
}

impl FakeRegion
{
    pub fn anonymous(start: u64, end: u64) -> Self
    {
        Self {
            start,
            end,
            protection: Protection(Protection::READ.0 | Protection::WRITE.0),
            path: None,
        }
    }

    pub fn file(start: u64, end: u64, path: &str) -> Self
    {
        Self {
            start,
            end,
            protection: Protection(Protection::READ.0 | Protection::EXECUTE.0),
            path: Some(PathBuf::from(path)),
        }
    }
}

/// The byte the fake process holds at `address`.
pub fn byte_at(address: u64) -> u8
{
    (address % 251) as u8
}

/// Tracer over a scripted process
///
/// `VmEntry::entry` is used as "number of entries already returned", so a
/// rewound record restarts at the first region.
#[derive(Debug, Default)]
pub struct FakeTracer
{
    pub pid: u32,
    pub regions: Vec<FakeRegion>,
    /// Block bases whose reads fail as if unmapped after enumeration.
    pub unmapped: Vec<u64>,
    pub fail_wait: bool,
    pub fail_detach: bool,
    /// Enumeration calls beyond this many fail with a non-ENOENT error.
    pub enumeration_budget: Option<usize>,
    pub calls: Vec<Call>,
}

impl FakeTracer
{
    pub fn new(pid: u32, regions: Vec<FakeRegion>) -> Self
    {
        Self {
            pid,
            regions,
            ..Self::default()
        }
    }

    pub fn detach_count(&self) -> usize
    {
        self.calls.iter().filter(|call| matches!(call, Call::Detach(_))).count()
    }

    pub fn enumeration_count(&self) -> usize
    {
        self.calls.iter().filter(|call| matches!(call, Call::VmEntry(_))).count()
    }

    fn check_pid(&self, pid: ProcessId) -> io::Result<()>
    {
        if pid.0 == self.pid {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "No such process"))
        }
    }

    fn region_containing(&self, start: u64, len: usize) -> Option<&FakeRegion>
    {
        let last = start.checked_add(len.checked_sub(1)? as u64)?;
        self.regions.iter().find(|region| region.start <= start && last <= region.end)
    }
}

impl Tracer for FakeTracer
{
    fn attach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        self.calls.push(Call::Attach(pid));
        self.check_pid(pid)
    }

    fn wait_for_stop(&mut self, pid: ProcessId) -> io::Result<()>
    {
        self.calls.push(Call::Wait(pid));
        if self.fail_wait {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "wait interrupted"));
        }
        Ok(())
    }

    fn detach(&mut self, pid: ProcessId) -> io::Result<()>
    {
        self.calls.push(Call::Detach(pid));
        if self.fail_detach {
            return Err(io::Error::other("detach refused"));
        }
        self.check_pid(pid)
    }

    fn next_vm_entry(&mut self, pid: ProcessId, entry: &mut VmEntry) -> io::Result<()>
    {
        self.calls.push(Call::VmEntry(entry.entry));
        self.check_pid(pid)?;

        if let Some(budget) = self.enumeration_budget {
            if self.enumeration_count() > budget {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "map locked"));
            }
        }

        let index = usize::try_from(entry.entry).unwrap_or(usize::MAX);
        let Some(region) = self.regions.get(index) else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no more entries"));
        };

        *entry = VmEntry {
            entry: entry.entry + 1,
            timestamp: 1,
            start: region.start,
            end: region.end,
            offset: 0,
            protection: region.protection,
            path: region.path.clone(),
        };
        Ok(())
    }

    fn read_memory(&mut self, pid: ProcessId, address: Address, buf: &mut [u8]) -> io::Result<()>
    {
        self.calls.push(Call::Read(address.value(), buf.len()));
        self.check_pid(pid)?;

        if self.unmapped.contains(&address.value()) || self.region_containing(address.value(), buf.len()).is_none() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "Bad address"));
        }

        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = byte_at(address.value() + offset as u64);
        }
        Ok(())
    }
}
