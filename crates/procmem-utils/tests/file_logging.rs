//! File-only logging setup
//!
//! Lives in its own test binary because a global subscriber can only be
//! installed once per process.

use procmem_utils::{LogLevel, LoggingError, init_logging_to_file, init_logging_with_level, LogFormat};

#[test]
fn test_file_logging_installs_once()
{
    let dir = tempfile::tempdir().expect("temp dir");
    let nested = dir.path().join("logs");

    let path = init_logging_to_file(&nested, Some(LogLevel::Debug)).expect("first init succeeds");
    assert!(path.starts_with(&nested));
    assert!(path.file_name().unwrap().to_string_lossy().ends_with("-procmem.log"));
    assert!(nested.is_dir());

    tracing::info!("file logging test");

    // A second subscriber is refused rather than panicking.
    let err = init_logging_with_level(LogLevel::Info, LogFormat::Pretty).unwrap_err();
    assert!(matches!(err, LoggingError::InitializationFailed(_)));
}
