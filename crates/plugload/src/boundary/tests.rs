//! Unit tests for loading boundaries.

use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::scope::StaticScope;
use crate::tests::{declarations_scope, write_unloadable_archive};

#[fixture]
fn scope() -> Arc<dyn CodeScope> {
    Arc::new(declarations_scope("boundary"))
}

#[rstest]
fn boundaries_get_distinct_ids(scope: Arc<dyn CodeScope>) {
    let first = Boundary::delegating(Arc::clone(&scope));
    let second = Boundary::delegating(scope);
    assert_ne!(first.id(), second.id());
    assert!(second.id() > first.id());
}

#[rstest]
fn lookup_attaches_the_scope(scope: Arc<dyn CodeScope>) {
    let boundary = Boundary::isolated(Arc::clone(&scope));
    let found = boundary.lookup("ENGLISH").expect("declared");
    assert!(found.keepalive().is_some());
    assert_eq!(Arc::strong_count(&scope), 3);
}

#[rstest]
fn release_is_idempotent_and_blocks_lookups(scope: Arc<dyn CodeScope>) {
    let mut boundary = Boundary::isolated(scope);
    let lease = boundary.lease();
    assert!(lease.is_live());

    boundary.release();
    boundary.release();

    assert!(boundary.is_released());
    assert!(!lease.is_live());
    assert_eq!(
        boundary.lookup("ENGLISH").expect_err("released"),
        LookupError::Released {
            boundary: boundary.id()
        }
    );
}

#[rstest]
fn dropping_a_boundary_releases_it(scope: Arc<dyn CodeScope>) {
    let boundary = Boundary::isolated(Arc::clone(&scope));
    let lease = boundary.lease();
    drop(boundary);
    assert!(!lease.is_live());
    assert_eq!(Arc::strong_count(&scope), 1);
}

#[test]
fn native_opener_delegates_to_scopes() {
    let source = Source::scope(StaticScope::new(crate::tests::memory_url("opened")));
    let boundary = NativeBoundaryOpener::new().open(&source).expect("scope opens");
    assert!(!boundary.is_isolated());
    assert_eq!(boundary.origin().as_str(), "memory:///opened/");
}

#[test]
fn native_opener_rejects_unloadable_archives() {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_unloadable_archive(dir.path(), "bad.plugin", "ENGLISH");
    let error = NativeBoundaryOpener::new()
        .open(&Source::archive(path))
        .expect_err("garbage library");
    assert!(matches!(error, LoadError::MalformedSource { .. }), "got {error:?}");
}

#[test]
fn opener_honours_configured_library_attribute() {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_unloadable_archive(dir.path(), "bad.plugin", "ENGLISH");
    let settings = LoaderSettings::default();
    let error = NativeBoundaryOpener::from_settings(&settings)
        .with_library_attribute("Missing-Attribute")
        .open(&Source::archive(path))
        .expect_err("no suffix match and attribute ignored");
    assert!(error.to_string().contains(std::env::consts::DLL_SUFFIX), "got {error}");
}
