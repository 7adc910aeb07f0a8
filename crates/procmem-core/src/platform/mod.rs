//! # Platform-Specific Implementations
//!
//! Kernel tracing backends. Each platform submodule provides a
//! [`Tracer`](crate::Tracer) built on that platform's native API:
//!
//! - **FreeBSD**: `ptrace(2)` with `PT_VM_ENTRY` and `PT_IO`
//!   - See: [ptrace(2) man page](https://man.freebsd.org/cgi/man.cgi?query=ptrace&sektion=2)
//!
//! On other targets only the platform independent core is built; it can still
//! be driven by any `Tracer` implementation.

#[cfg(target_os = "freebsd")]
pub mod freebsd;
