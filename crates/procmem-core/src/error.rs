//! # Error Types
//!
//! Error handling for attachment, region iteration and block reads.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Errors come in two tiers:
//!
//! 1. **Structural**: the scan of this process cannot continue. These surface
//!    as a [`ScanError`] (attach failure, unreadable address space, buffer
//!    allocation failure).
//! 2. **Transient**: one block could not be read, usually because the target
//!    unmapped it after enumeration. These never become a `ScanError`;
//!    [`fetch`](crate::MemoryRegionIterator::fetch) returns `None` and
//!    iteration carries on.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::types::ProcessId;

/// Status codes reported to the scanning engine
///
/// Every [`ScanError`] maps onto one of these through [`ScanError::code`].
/// The iterator additionally records the code of the last structural event
/// (see [`MemoryRegionIterator::last_error`](crate::MemoryRegionIterator::last_error)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode
{
    /// Nothing went wrong.
    #[default]
    Success,
    /// A buffer large enough for the requested block could not be allocated.
    InsufficientMemory,
    /// Trace control of the target could not be established.
    CouldNotAttachToProcess,
    /// The target's address space could not be enumerated at all.
    CouldNotReadProcessMemory,
}

impl fmt::Display for ErrorCode
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            ErrorCode::Success => "success",
            ErrorCode::InsufficientMemory => "insufficient memory",
            ErrorCode::CouldNotAttachToProcess => "could not attach to process",
            ErrorCode::CouldNotReadProcessMemory => "could not read process memory",
        };
        f.write_str(name)
    }
}

/// Main error type for process memory scanning
///
/// ## Error Categories
///
/// 1. **Attachment errors**: CouldNotAttachToProcess
/// 2. **Enumeration errors**: CouldNotReadProcessMemory
/// 3. **Resource errors**: InsufficientMemory
/// 4. **Usage errors**: InvalidArgument
/// 5. **I/O errors**: Io (tracer failures outside attach)
#[derive(Error, Debug)]
pub enum ScanError
{
    /// Trace control of the process could not be established
    ///
    /// This happens when:
    /// - The PID does not exist (or exited before we got to it)
    /// - We lack the privilege to trace it (`security.bsd.unprivileged_proc_debug`,
    ///   jails, securelevel)
    /// - It is already being traced by someone else
    /// - Waiting for the stop notification failed, or the process did
    ///   something other than stop (for example it exited)
    ///
    /// `source` is always the *first* failure. If cleanup after a failed wait
    /// also fails, that second error is discarded.
    #[error("Could not attach to process {pid}: {source}")]
    CouldNotAttachToProcess
    {
        /// Target process
        pid: ProcessId,
        /// The tracer's error
        #[source]
        source: io::Error,
    },

    /// The address space of a freshly attached process could not be walked
    ///
    /// Raised when the very first map enumeration produces nothing. An empty
    /// or unreadable map on a stopped, live process is abnormal, unlike running
    /// off the end of the map later on.
    #[error("Could not read memory of process {pid}")]
    CouldNotReadProcessMemory
    {
        /// Target process
        pid: ProcessId,
    },

    /// A block buffer of the requested size could not be allocated
    #[error("Insufficient memory for a {requested}-byte block buffer")]
    InsufficientMemory
    {
        /// Requested buffer size in bytes
        requested: u64,
    },

    /// Invalid argument passed to a scanning function
    ///
    /// Examples:
    /// - A zero maximum chunk size
    /// - A malformed `PROCMEM_MAX_CHUNK_SIZE` value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Tracer error outside the attach path (detach, for example)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ScanError
{
    /// The status code this error reports to the engine.
    ///
    /// `InvalidArgument` and `Io` have no dedicated code; they abort the scan
    /// the same way a failed read of the address space does.
    pub fn code(&self) -> ErrorCode
    {
        match self {
            ScanError::CouldNotAttachToProcess { .. } => ErrorCode::CouldNotAttachToProcess,
            ScanError::InsufficientMemory { .. } => ErrorCode::InsufficientMemory,
            ScanError::CouldNotReadProcessMemory { .. } | ScanError::InvalidArgument(_) | ScanError::Io(_) => {
                ErrorCode::CouldNotReadProcessMemory
            }
        }
    }
}

/// Convenience type alias for `Result<T, ScanError>`
///
/// ```rust
/// use procmem_core::error::ScanResult;
/// fn foo() -> ScanResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_code_mapping()
    {
        let pid = ProcessId::from(7);
        let attach = ScanError::CouldNotAttachToProcess {
            pid,
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(attach.code(), ErrorCode::CouldNotAttachToProcess);
        assert_eq!(
            ScanError::CouldNotReadProcessMemory { pid }.code(),
            ErrorCode::CouldNotReadProcessMemory
        );
        assert_eq!(
            ScanError::InsufficientMemory { requested: 1 }.code(),
            ErrorCode::InsufficientMemory
        );
    }

    #[test]
    fn test_default_code_is_success()
    {
        assert_eq!(ErrorCode::default(), ErrorCode::Success);
    }
}
