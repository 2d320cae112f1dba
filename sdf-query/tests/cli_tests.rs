//! Integration tests for the sdf-query CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;
#[cfg(feature = "native")]
use tempfile::TempDir;

/// Get the sdf-query command.
fn sdf_query() -> Command {
    Command::cargo_bin("sdf-query").unwrap()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    sdf_query()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("full-waveform"))
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--library-version"))
        .stdout(predicate::str::contains("EXAMPLES"));
}

#[test]
fn test_version() {
    sdf_query()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sdf-query"));
}

#[test]
fn test_missing_input() {
    sdf_query()
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_invalid_mode() {
    let input = NamedTempFile::new().unwrap();

    sdf_query()
        .arg(input.path())
        .arg("--mode")
        .arg("everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_quiet_and_verbose() {
    let input = NamedTempFile::new().unwrap();

    sdf_query()
        .arg(input.path())
        .arg("-q")
        .arg("-v")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot use both"));
}

#[test]
fn test_limit_without_dump() {
    let input = NamedTempFile::new().unwrap();

    sdf_query()
        .arg(input.path())
        .arg("--limit")
        .arg("5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--limit"));
}

// ============================================================================
// Builds without the vendor library
// ============================================================================

#[cfg(not(feature = "native"))]
#[test]
fn test_existing_input_needs_native() {
    let input = NamedTempFile::new().unwrap();

    sdf_query()
        .arg(input.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--features native"));
}

#[cfg(not(feature = "native"))]
#[test]
fn test_nonexistent_input_needs_native() {
    sdf_query()
        .arg("/nonexistent/file.sdf")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--features native"));
}

#[cfg(not(feature = "native"))]
#[test]
fn test_library_version_needs_native() {
    sdf_query()
        .arg("--library-version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("libsdfifc"));
}

// ============================================================================
// Native Tests
// ============================================================================

#[cfg(feature = "native")]
#[test]
#[ignore = "Requires libsdfifc"]
fn test_library_version() {
    sdf_query()
        .arg("--library-version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sdfifc api version"));
}

#[cfg(feature = "native")]
#[test]
#[ignore = "Requires libsdfifc"]
fn test_nonexistent_input() {
    sdf_query()
        .arg("/nonexistent/file.sdf")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("not-found"));
}

#[cfg(feature = "native")]
#[test]
#[ignore = "Requires libsdfifc"]
fn test_directory_input() {
    let temp = TempDir::new().unwrap();

    sdf_query()
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid-path"));
}

#[cfg(feature = "native")]
#[test]
#[ignore = "Requires libsdfifc"]
fn test_garbage_file_is_rejected() {
    let input = NamedTempFile::new().unwrap();
    std::fs::write(input.path(), b"not an sdf file").unwrap();

    sdf_query()
        .arg(input.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("kind"));
}
