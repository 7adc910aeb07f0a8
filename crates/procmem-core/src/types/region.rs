//! Virtual-memory-map entries and the blocks carved out of them.

use std::fmt;
use std::path::PathBuf;

use super::Address;

/// Protection bits of a map entry
///
/// The values match the kernel's `VM_PROT_*` constants, so the raw
/// `pve_prot` field can be wrapped without translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Protection(pub u32);

impl Protection
{
    /// `VM_PROT_READ`
    pub const READ: Self = Protection(0x01);
    /// `VM_PROT_WRITE`
    pub const WRITE: Self = Protection(0x02);
    /// `VM_PROT_EXECUTE`
    pub const EXECUTE: Self = Protection(0x04);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool
    {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for Protection
{
    /// Formats as the familiar `rwx` triple, with `-` for missing bits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let flag = |bit: Protection, c: char| if self.contains(bit) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Protection::READ, 'r'),
            flag(Protection::WRITE, 'w'),
            flag(Protection::EXECUTE, 'x')
        )
    }
}

/// One entry of the target's virtual-memory map
///
/// This is the Rust-side image of the kernel's `struct ptrace_vm_entry`. The
/// kernel walks the map statefully: the caller hands back the record it got
/// from the previous call and `entry` tells the kernel where to resume. A
/// record with `entry == 0` restarts the walk at the lowest mapped address.
///
/// `end` is **inclusive**: it is the last mapped byte of the entry, not one
/// past it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmEntry
{
    /// Kernel cursor key (`pve_entry`). Zero before the first enumeration.
    pub entry: i32,
    /// Map generation stamp (`pve_timestamp`). Opaque; handed back to the
    /// kernel unchanged.
    pub timestamp: i32,
    /// First mapped address of the entry.
    pub start: u64,
    /// Last mapped address of the entry (inclusive).
    pub end: u64,
    /// Offset into the backing object.
    pub offset: u64,
    /// Protection bits.
    pub protection: Protection,
    /// Path of the backing file, if the entry is file-backed and the kernel
    /// could resolve it.
    pub path: Option<PathBuf>,
}

impl VmEntry
{
    /// A record positioned before the first map entry.
    pub fn rewound() -> Self
    {
        Self::default()
    }
}

/// Immutable description of the map entry a block was carved from
///
/// Handed out by [`MemoryRegionIterator::current_region`](crate::MemoryRegionIterator::current_region)
/// so callers can label matches without ever seeing the kernel record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo
{
    /// First mapped address.
    pub start: Address,
    /// Last mapped address (inclusive).
    pub end: Address,
    /// Protection bits.
    pub protection: Protection,
    /// Backing file, if any.
    pub path: Option<PathBuf>,
}

impl From<&VmEntry> for RegionInfo
{
    fn from(entry: &VmEntry) -> Self
    {
        Self {
            start: Address::from(entry.start),
            end: Address::from(entry.end),
            protection: entry.protection,
            path: entry.path.clone(),
        }
    }
}

/// A bounded slice of one map entry, ready to be fetched
///
/// Blocks never span two map entries and are never empty: every block the
/// iterator hands out has `size > 0`.
///
/// ## Example
///
/// ```rust
/// use procmem_core::types::{Address, MemoryBlock};
///
/// let block = MemoryBlock::new(Address::from(0x1000), 0x400);
/// assert_eq!(block.end(), Address::from(0x1400));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemoryBlock
{
    /// Address of the first byte.
    pub base: Address,
    /// Length in bytes.
    pub size: u64,
}

impl MemoryBlock
{
    /// Create a block descriptor.
    pub const fn new(base: Address, size: u64) -> Self
    {
        Self { base, size }
    }

    /// First address past the block, saturating at the top of the address
    /// space.
    pub fn end(&self) -> Address
    {
        self.base.saturating_add(self.size)
    }
}

impl fmt::Display for MemoryBlock
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}+0x{:x}", self.base, self.size)
    }
}
