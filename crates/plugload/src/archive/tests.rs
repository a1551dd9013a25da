//! Unit tests for plugin archive access.

use std::env::consts::DLL_SUFFIX;
use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::tests::{manifest_with, write_archive};

#[fixture]
fn dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn library_name(stem: &str) -> String {
    format!("lib/{stem}{DLL_SUFFIX}")
}

#[rstest]
fn missing_entry_reads_as_none(dir: TempDir) {
    let path = write_archive(dir.path(), "empty.plugin", &[("readme.txt", "hi")]);
    let mut archive = PluginArchive::open(&path).expect("open archive");
    assert_eq!(archive.entry("absent").expect("lookup"), None);
    assert_eq!(
        archive.entry("readme.txt").expect("lookup"),
        Some(b"hi".to_vec())
    );
    assert!(archive.manifest().expect("manifest lookup").is_none());
}

#[rstest]
fn corrupt_file_is_malformed(dir: TempDir) {
    let path = dir.path().join("broken.plugin");
    fs::write(&path, b"definitely not a zip").expect("write file");
    let error = PluginArchive::open(&path).expect_err("corrupt archive");
    assert!(matches!(error, LoadError::MalformedSource { .. }), "got {error:?}");
}

#[rstest]
fn missing_file_is_malformed(dir: TempDir) {
    let error = PluginArchive::open(&dir.path().join("absent.plugin")).expect_err("missing");
    assert!(matches!(error, LoadError::MalformedSource { .. }), "got {error:?}");
}

#[rstest]
fn manifest_attribute_names_the_library(dir: TempDir) {
    let manifest = manifest_with(&[("Plugin-Library", "native/custom.bin")]);
    let first = library_name("one");
    let second = library_name("two");
    let path = write_archive(
        dir.path(),
        "named.plugin",
        &[
            (MANIFEST_PATH, manifest.as_str()),
            (first.as_str(), "x"),
            (second.as_str(), "y"),
        ],
    );
    let mut archive = PluginArchive::open(&path).expect("open archive");
    assert_eq!(
        archive.library_entry("Plugin-Library").expect("entry"),
        "native/custom.bin"
    );
}

#[rstest]
fn single_library_entry_is_found_by_suffix(dir: TempDir) {
    let library = library_name("greeters");
    let path = write_archive(dir.path(), "one.plugin", &[(library.as_str(), "x")]);
    let mut archive = PluginArchive::open(&path).expect("open archive");
    assert_eq!(archive.library_entry("Plugin-Library").expect("entry"), library);
}

#[rstest]
#[case::none(&[])]
#[case::several(&["a", "b"])]
fn ambiguous_library_entries_are_malformed(dir: TempDir, #[case] stems: &[&str]) {
    let names: Vec<String> = stems.iter().map(|stem| library_name(stem)).collect();
    let entries: Vec<(&str, &str)> = names.iter().map(|name| (name.as_str(), "x")).collect();
    let path = write_archive(dir.path(), "ambiguous.plugin", &entries);
    let mut archive = PluginArchive::open(&path).expect("open archive");
    let error = archive
        .library_entry("Plugin-Library")
        .expect_err("no unique library");
    assert!(matches!(error, LoadError::MalformedSource { .. }), "got {error:?}");
}

#[rstest]
fn extraction_keeps_only_the_file_name(dir: TempDir) {
    let library = library_name("greeters");
    let path = write_archive(dir.path(), "one.plugin", &[(library.as_str(), "payload")]);
    let target_dir = TempDir::new().expect("create target dir");
    let mut archive = PluginArchive::open(&path).expect("open archive");

    let written = archive
        .extract(&library, target_dir.path())
        .expect("extract library");

    assert_eq!(written.parent(), Some(target_dir.path()));
    assert_eq!(fs::read(&written).expect("read extracted"), b"payload");
}

#[rstest]
fn extracting_a_missing_entry_is_malformed(dir: TempDir) {
    let path = write_archive(dir.path(), "one.plugin", &[("readme.txt", "x")]);
    let mut archive = PluginArchive::open(&path).expect("open archive");
    let error = archive
        .extract("lib/absent.so", dir.path())
        .expect_err("missing entry");
    assert!(matches!(error, LoadError::MalformedSource { .. }), "got {error:?}");
}

#[rstest]
fn unwritable_extraction_target_is_malformed(dir: TempDir) {
    let library = library_name("greeters");
    let path = write_archive(dir.path(), "one.plugin", &[(library.as_str(), "payload")]);
    let mut archive = PluginArchive::open(&path).expect("open archive");
    let error = archive
        .extract(&library, &dir.path().join("no-such-directory"))
        .expect_err("target directory is missing");
    assert!(
        matches!(
            error,
            LoadError::MalformedSource { path: ref source, .. } if source.ends_with("one.plugin")
        ),
        "got {error:?}"
    );
}

#[rstest]
fn relative_paths_become_absolute_file_urls(dir: TempDir) {
    let url = file_url(&dir.path().join("a.plugin")).expect("file url");
    assert_eq!(url.scheme(), "file");
    assert!(url.path().ends_with("/a.plugin"));
    let relative = file_url(Path::new("relative.plugin")).expect("relative url");
    assert_eq!(relative.scheme(), "file");
}
