//! Build script for procmem-core
//!
//! This script checks system requirements before compilation:
//! - Minimum Rust version
//! - Target platform (only FreeBSD gets a kernel backend)
//! - FreeBSD release, when building natively (`PT_VM_ENTRY` needs 9.0+)

use std::env;

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    // io::Error::other is the newest std API in use.
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 74, 0);

        if rustc_version < min_rust_version {
            panic!(
                "procmem-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // cfg!(target_os) in a build script describes the host, not the target.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "freebsd" {
        println!(
            "cargo:warning=procmem-core: no ptrace backend for target_os={target_os}; \
             building the platform independent core only"
        );
        return;
    }

    let host = env::var("HOST").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();
    if host == target {
        check_freebsd_release();
    }
}

fn check_freebsd_release()
{
    let min_major = 9;

    match freebsd_major_release() {
        Some(major) if major < min_major => {
            panic!("procmem-core requires FreeBSD {min_major}.0 or newer (PT_VM_ENTRY), found {major}.x");
        }
        Some(_) => {}
        None => println!("cargo:warning=could not detect FreeBSD release"),
    }
}

fn freebsd_major_release() -> Option<u32>
{
    // Best effort: `uname -r` prints e.g. "14.1-RELEASE-p5".
    use std::process::Command;

    let output = Command::new("uname").arg("-r").output().ok()?;
    let release = String::from_utf8(output.stdout).ok()?;
    release.trim().split(['.', '-']).next()?.parse::<u32>().ok()
}
