//! Behaviour-driven tests for folder scanning.

use std::fs;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use crate::error::{LoadError, PluginFailure};
use crate::result::LoadResult;
use crate::scanner::{FolderScanner, ScanDepth};

use super::{Greeter, GreeterCapability, write_quiet_archive, write_unloadable_archive};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    folder: TempDir,
    removed: bool,
    outcome: Option<Result<LoadResult<Box<dyn Greeter>>, LoadError>>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld {
        folder: TempDir::new().expect("temp dir"),
        removed: false,
        outcome: None,
    }
}

fn scanned(world: &TestWorld) -> &LoadResult<Box<dyn Greeter>> {
    world
        .outcome
        .as_ref()
        .expect("no scan performed")
        .as_ref()
        .expect("expected the scan to succeed")
}

fn scan_error(world: &TestWorld) -> &LoadError {
    world
        .outcome
        .as_ref()
        .expect("no scan performed")
        .as_ref()
        .err()
        .expect("expected the scan to fail")
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("an empty plugin folder")]
fn given_empty_folder(world: &mut TestWorld) {
    assert!(world.folder.path().is_dir());
}

#[given("a quiet archive {name}")]
fn given_quiet_archive(world: &mut TestWorld, name: String) {
    write_quiet_archive(world.folder.path(), name.trim_matches('"'));
}

#[given("an unreadable archive {name}")]
fn given_unreadable_archive(world: &mut TestWorld, name: String) {
    let path = world.folder.path().join(name.trim_matches('"'));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, "not a zip container").expect("write archive");
}

#[given("an archive {name} whose library cannot be mapped")]
fn given_unmappable_archive(world: &mut TestWorld, name: String) {
    write_unloadable_archive(world.folder.path(), name.trim_matches('"'), "ENGLISH");
}

#[given("the plugin folder has been removed")]
fn given_removed_folder(world: &mut TestWorld) {
    fs::remove_dir_all(world.folder.path()).expect("remove folder");
    world.removed = true;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the folder is scanned to depth {depth}")]
fn when_scanned(world: &mut TestWorld, depth: i64) {
    let outcome = ScanDepth::new(depth).and_then(|checked| {
        FolderScanner::default().scan::<GreeterCapability>(world.folder.path(), checked)
    });
    world.outcome = Some(outcome);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the scan reports {instances} instances and {failures} failures")]
fn then_counts(world: &mut TestWorld, instances: usize, failures: usize) {
    let result = scanned(world);
    assert_eq!(result.success_count(), instances, "instances");
    assert_eq!(result.failure_count(), failures, "failures");
}

#[then("no boundary was opened")]
fn then_no_boundary(world: &mut TestWorld) {
    assert!(scanned(world).boundaries().is_empty());
}

#[then("a malformed source failure names {name}")]
fn then_failure_names(world: &mut TestWorld, name: String) {
    let expected = name.trim_matches('"');
    let named = scanned(world).failures().any(|failure| {
        matches!(failure, PluginFailure::MalformedSource { .. })
            && failure
                .path()
                .and_then(|path| path.file_name())
                .is_some_and(|file| file == expected)
    });
    assert!(named, "expected a malformed source failure for '{expected}'");
}

#[then("the scan fails with a precondition error")]
fn then_precondition(world: &mut TestWorld) {
    let error = scan_error(world);
    assert!(
        matches!(error, LoadError::Precondition { .. }),
        "expected a precondition error, got: {error}"
    );
}

#[then("the scan fails with an I/O error")]
fn then_io(world: &mut TestWorld) {
    assert!(world.removed);
    let error = scan_error(world);
    assert!(
        matches!(error, LoadError::Io { .. }),
        "expected an I/O error, got: {error}"
    );
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Empty folder yields an empty result"
)]
fn empty_folder(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Archives declaring nothing are skipped without failures"
)]
fn quiet_archives(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Depth one ignores nested archives"
)]
fn depth_one(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Depth two reaches nested archives"
)]
fn depth_two(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/folder_scan.feature", name = "Zero depth is rejected")]
fn zero_depth(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Negative depth is rejected"
)]
fn negative_depth(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Unmappable libraries are recorded against their archive"
)]
fn unmappable_library(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/folder_scan.feature",
    name = "Missing folder aborts the scan"
)]
fn missing_folder(world: TestWorld) {
    let _ = world;
}
