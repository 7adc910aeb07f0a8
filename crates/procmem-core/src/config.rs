//! # Scan Configuration
//!
//! The only tunable of the core is the maximum size of a single memory block.
//! Large map entries are split into blocks no bigger than this, trading fewer
//! and larger reads against the size of the reusable buffer.
//!
//! The iterator asks its [`ChunkSizeSource`] for the limit on **every** step,
//! so an engine holding a [`ScanConfig`] handle can change it mid-scan and
//! the next block honours the new value.
//!
//! ## Environment Variables
//!
//! - `PROCMEM_MAX_CHUNK_SIZE`: initial value for [`ScanConfig::from_env`] and
//!   [`ScanConfig::global`]. Decimal or `0x`-prefixed hex.
//!
//! ## Example
//!
//! ```rust
//! use procmem_core::config::{ChunkSizeSource, ScanConfig};
//!
//! let config = ScanConfig::with_max_chunk_size(0x10000)?;
//! assert_eq!(config.max_chunk_size(), 0x10000);
//!
//! // Handles are shared: a clone observes later updates.
//! let engine_view = config.clone();
//! config.set_max_chunk_size(0x400)?;
//! assert_eq!(engine_view.max_chunk_size(), 0x400);
//! # Ok::<(), procmem_core::error::ScanError>(())
//! ```

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{ScanError, ScanResult};

/// Default upper bound on a block: 1 GiB.
pub const DEFAULT_MAX_PROCESS_MEMORY_CHUNK: u64 = 1 << 30;

/// Environment variable read by [`ScanConfig::from_env`].
pub const MAX_CHUNK_SIZE_ENV: &str = "PROCMEM_MAX_CHUNK_SIZE";

static GLOBAL_CONFIG: Lazy<ScanConfig> = Lazy::new(ScanConfig::from_env);

/// Anything that can tell the iterator how large a block may be
///
/// Implemented for plain `u64` (a fixed limit, handy in tests), for
/// [`ScanConfig`] and for references to either.
pub trait ChunkSizeSource
{
    /// Current maximum block size in bytes.
    fn max_chunk_size(&self) -> u64;
}

impl ChunkSizeSource for u64
{
    fn max_chunk_size(&self) -> u64
    {
        *self
    }
}

impl<C: ChunkSizeSource + ?Sized> ChunkSizeSource for &C
{
    fn max_chunk_size(&self) -> u64
    {
        (**self).max_chunk_size()
    }
}

/// Shared, updatable scan configuration
///
/// Cloning is cheap and every clone points at the same value. Updates use
/// relaxed atomics: there is nothing else to order against, and concurrent
/// scans of different processes may read the same handle.
#[derive(Debug, Clone)]
pub struct ScanConfig
{
    max_chunk_size: Arc<AtomicU64>,
}

impl Default for ScanConfig
{
    fn default() -> Self
    {
        Self {
            max_chunk_size: Arc::new(AtomicU64::new(DEFAULT_MAX_PROCESS_MEMORY_CHUNK)),
        }
    }
}

impl ScanConfig
{
    /// Configuration with the default chunk size.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Configuration with an explicit chunk size.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: `size` is zero
    pub fn with_max_chunk_size(size: u64) -> ScanResult<Self>
    {
        let config = Self::default();
        config.set_max_chunk_size(size)?;
        Ok(config)
    }

    /// Configuration seeded from `PROCMEM_MAX_CHUNK_SIZE`.
    ///
    /// Missing, malformed or zero values fall back to
    /// [`DEFAULT_MAX_PROCESS_MEMORY_CHUNK`]; malformed ones are logged.
    pub fn from_env() -> Self
    {
        let config = Self::default();
        if let Ok(raw) = env::var(MAX_CHUNK_SIZE_ENV) {
            match parse_chunk_size(&raw) {
                Ok(size) => {
                    // Cannot fail: parse_chunk_size rejects zero.
                    let _ = config.set_max_chunk_size(size);
                }
                Err(err) => {
                    tracing::warn!(
                        variable = MAX_CHUNK_SIZE_ENV,
                        value = %raw,
                        error = %err,
                        "ignoring invalid chunk size, using default"
                    );
                }
            }
        }
        config
    }

    /// Process-wide configuration handle, initialised from the environment on
    /// first use.
    ///
    /// Prefer passing an explicit [`ScanConfig`] (or a plain `u64`) to the
    /// iterator; this exists for engines that want a single shared knob.
    pub fn global() -> &'static ScanConfig
    {
        &GLOBAL_CONFIG
    }

    /// Change the maximum chunk size. Takes effect on the next iteration step.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: `size` is zero (it would produce empty blocks)
    pub fn set_max_chunk_size(&self, size: u64) -> ScanResult<()>
    {
        if size == 0 {
            return Err(ScanError::InvalidArgument("maximum chunk size must be non-zero".to_string()));
        }
        self.max_chunk_size.store(size, Ordering::Relaxed);
        Ok(())
    }
}

impl ChunkSizeSource for ScanConfig
{
    fn max_chunk_size(&self) -> u64
    {
        self.max_chunk_size.load(Ordering::Relaxed)
    }
}

/// Parse a chunk size given in decimal or `0x`-prefixed hexadecimal.
///
/// ## Errors
///
/// - `InvalidArgument`: not a number, or zero
pub fn parse_chunk_size(raw: &str) -> ScanResult<u64>
{
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };

    match parsed {
        Ok(0) => Err(ScanError::InvalidArgument("maximum chunk size must be non-zero".to_string())),
        Ok(size) => Ok(size),
        Err(err) => Err(ScanError::InvalidArgument(format!("invalid chunk size {trimmed:?}: {err}"))),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_chunk_size()
    {
        assert_eq!(ScanConfig::new().max_chunk_size(), DEFAULT_MAX_PROCESS_MEMORY_CHUNK);
    }

    #[test]
    fn test_zero_chunk_size_rejected()
    {
        let config = ScanConfig::with_max_chunk_size(0x400).unwrap();
        assert!(matches!(config.set_max_chunk_size(0), Err(ScanError::InvalidArgument(_))));
        assert_eq!(config.max_chunk_size(), 0x400);
        assert!(ScanConfig::with_max_chunk_size(0).is_err());
    }

    #[test]
    fn test_clones_share_value()
    {
        let config = ScanConfig::new();
        let other = config.clone();
        config.set_max_chunk_size(4096).unwrap();
        assert_eq!(other.max_chunk_size(), 4096);
    }

    #[test]
    fn test_parse_chunk_size()
    {
        assert_eq!(parse_chunk_size("4096").unwrap(), 4096);
        assert_eq!(parse_chunk_size("0x400").unwrap(), 0x400);
        assert_eq!(parse_chunk_size(" 0X10 ").unwrap(), 16);
        assert!(parse_chunk_size("0").is_err());
        assert!(parse_chunk_size("0x0").is_err());
        assert!(parse_chunk_size("lots").is_err());
        assert!(parse_chunk_size("").is_err());
    }

    #[test]
    fn test_plain_u64_and_reference_sources()
    {
        let fixed: u64 = 0x800;
        assert_eq!(fixed.max_chunk_size(), 0x800);
        assert_eq!((&fixed).max_chunk_size(), 0x800);
    }
}
