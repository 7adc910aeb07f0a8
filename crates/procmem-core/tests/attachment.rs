//! Tests for the attach / detach lifecycle

mod common;

use common::{Call, FakeRegion, FakeTracer};
use procmem_core::types::{Address, MemoryBlock, ProcessId};
use procmem_core::{ErrorCode, ProcessAttachment, ScanError, Tracer};

const PID: u32 = 777;

fn tracer() -> FakeTracer
{
    FakeTracer::new(PID, vec![FakeRegion::anonymous(0x1000, 0x1fff)])
}

#[test]
fn test_attach_stops_process()
{
    let mut tracer = tracer();
    let attachment = ProcessAttachment::attach(&mut tracer, ProcessId::from(PID)).unwrap();
    assert_eq!(attachment.pid(), ProcessId::from(PID));
    attachment.detach().unwrap();

    let pid = ProcessId::from(PID);
    assert_eq!(tracer.calls, vec![Call::Attach(pid), Call::Wait(pid), Call::Detach(pid)]);
}

#[test]
fn test_attach_nonexistent_pid()
{
    let mut tracer = tracer();
    let missing = ProcessId::from(PID + 1);

    let err = ProcessAttachment::attach(&mut tracer, missing).unwrap_err();
    assert!(matches!(err, ScanError::CouldNotAttachToProcess { pid, .. } if pid == missing));
    assert_eq!(err.code(), ErrorCode::CouldNotAttachToProcess);

    // Refused trace control leaves nothing to release.
    assert_eq!(tracer.calls, vec![Call::Attach(missing)]);
}

#[test]
fn test_failed_wait_releases_trace_control()
{
    let mut tracer = tracer();
    tracer.fail_wait = true;
    let pid = ProcessId::from(PID);

    let err = ProcessAttachment::attach(&mut tracer, pid).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CouldNotAttachToProcess);
    assert_eq!(tracer.calls, vec![Call::Attach(pid), Call::Wait(pid), Call::Detach(pid)]);
}

#[test]
fn test_cleanup_failure_keeps_original_error()
{
    let mut tracer = tracer();
    tracer.fail_wait = true;
    tracer.fail_detach = true;

    let err = ProcessAttachment::attach(&mut tracer, ProcessId::from(PID)).unwrap_err();
    match err {
        ScanError::CouldNotAttachToProcess { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::Interrupted);
            assert!(source.to_string().contains("wait interrupted"));
        }
        other => panic!("Expected CouldNotAttachToProcess, got {other:?}"),
    }
    assert_eq!(tracer.detach_count(), 1);
}

#[test]
fn test_explicit_detach_happens_once()
{
    let mut tracer = tracer();
    {
        let attachment = ProcessAttachment::attach(&mut tracer, ProcessId::from(PID)).unwrap();
        attachment.detach().unwrap();
    }
    assert_eq!(tracer.detach_count(), 1);
}

#[test]
fn test_drop_detaches()
{
    let mut tracer = tracer();
    {
        let mut attachment = ProcessAttachment::attach(&mut tracer, ProcessId::from(PID)).unwrap();
        let mut regions = attachment.regions(0x400_u64);
        regions.first().unwrap();
        // Early exit without detach.
    }
    assert_eq!(tracer.detach_count(), 1);
    assert_eq!(tracer.calls.last(), Some(&Call::Detach(ProcessId::from(PID))));
}

#[test]
fn test_detach_failure_surfaces_as_io()
{
    let mut tracer = tracer();
    tracer.fail_detach = true;
    // Attach itself does not detach on success.
    let attachment = ProcessAttachment::attach(&mut tracer, ProcessId::from(PID)).unwrap();

    let err = attachment.detach().unwrap_err();
    assert!(matches!(err, ScanError::Io(_)));
    assert_eq!(tracer.detach_count(), 1);
}

#[test]
fn test_boxed_tracer_selected_at_runtime()
{
    let tracer: Box<dyn Tracer> = Box::new(tracer());
    let mut attachment = ProcessAttachment::attach(tracer, ProcessId::from(PID)).unwrap();

    {
        let mut regions = attachment.regions(0x800_u64);
        assert_eq!(regions.first().unwrap(), MemoryBlock::new(Address::from(0x1000), 0x800));
        let second = regions.next().unwrap();
        assert_eq!(second, MemoryBlock::new(Address::from(0x1800), 0x800));
        assert_eq!(regions.fetch(&second).map(<[u8]>::len), Some(0x800));
        assert_eq!(regions.next(), None);
    }

    attachment.detach().unwrap();
}
