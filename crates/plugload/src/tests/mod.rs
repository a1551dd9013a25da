//! Shared fixtures, crate-level integration tests, and BDD scenarios.

use std::any::Any;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use url::Url;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::declaration::{Capability, Constructed, PluginDeclaration};
use crate::scope::StaticScope;

mod behaviour;
mod pipeline;

// ---------------------------------------------------------------------------
// Capability under test
// ---------------------------------------------------------------------------

pub(crate) trait Greeter: Send + fmt::Debug {
    fn greet(&self) -> String;
}

pub(crate) struct GreeterCapability;

impl Capability for GreeterCapability {
    const NAME: &'static str = "greeter";
    type Instance = Box<dyn Greeter>;
}

#[derive(Debug)]
struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_owned()
    }
}

#[derive(Debug)]
struct Named(String);

impl Greeter for Named {
    fn greet(&self) -> String {
        format!("hello {}", self.0)
    }
}

fn greeter(value: impl Greeter + 'static) -> Constructed {
    Ok(Box::new(Box::new(value) as Box<dyn Greeter>))
}

fn build_english() -> Constructed {
    greeter(English)
}

fn build_named(arguments: &dyn Any) -> Constructed {
    arguments
        .downcast_ref::<String>()
        .ok_or_else(|| "expected a String argument".to_owned())
        .and_then(|name| greeter(Named(name.clone())))
}

fn build_failing() -> Constructed {
    Err("dictionary unavailable".to_owned())
}

fn build_panicking() -> Constructed {
    panic!("constructor exploded")
}

fn build_wrong_type() -> Constructed {
    Ok(Box::new(42_u32))
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

pub(crate) static ENGLISH: PluginDeclaration =
    PluginDeclaration::new("ENGLISH", &["greeter"]).with_constructor(build_english);

pub(crate) static NAMED: PluginDeclaration =
    PluginDeclaration::new("NAMED", &["greeter"]).with_argument_constructor(build_named);

pub(crate) static SORTER: PluginDeclaration =
    PluginDeclaration::new("SORTER", &["sorter"]).with_constructor(build_english);

pub(crate) static FAILING: PluginDeclaration =
    PluginDeclaration::new("FAILING", &["greeter"]).with_constructor(build_failing);

pub(crate) static PANICKING: PluginDeclaration =
    PluginDeclaration::new("PANICKING", &["greeter"]).with_constructor(build_panicking);

pub(crate) static WRONG_TYPE: PluginDeclaration =
    PluginDeclaration::new("WRONG_TYPE", &["greeter"]).with_constructor(build_wrong_type);

pub(crate) static ABSTRACT: PluginDeclaration = PluginDeclaration::new("ABSTRACT", &["greeter"]);

// ---------------------------------------------------------------------------
// Scope and archive builders
// ---------------------------------------------------------------------------

pub(crate) fn memory_url(label: &str) -> Url {
    Url::parse(&format!("memory:///{label}/")).expect("valid memory URL")
}

/// A scope exporting every test declaration, without descriptors.
pub(crate) fn declarations_scope(label: &str) -> StaticScope {
    [&ENGLISH, &NAMED, &SORTER, &FAILING, &PANICKING, &WRONG_TYPE, &ABSTRACT]
        .into_iter()
        .fold(StaticScope::new(memory_url(label)), StaticScope::with_declaration)
}

/// A scope exporting every test declaration and a greeter descriptor
/// listing `names`.
pub(crate) fn greeter_scope(names: &[&str]) -> StaticScope {
    declarations_scope("greeters").with_resource(
        "META-INF/services/greeter",
        format!("# greeters\n{}\n", names.join("\n")),
    )
}

pub(crate) fn manifest_with(attributes: &[(&str, &str)]) -> String {
    let mut text = "Manifest-Version: 1.0\n".to_owned();
    for (name, value) in attributes {
        text.push_str(&format!("{name}: {value}\n"));
    }
    text
}

pub(crate) fn write_archive(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create archive parent");
    }
    let file = File::create(&path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    for (entry, content) in entries {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file(*entry, options).expect("start entry");
        writer.write_all(content.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish archive");
    path
}

/// Writes an archive whose manifest lists `classes` and whose library entry
/// is not a loadable library.
pub(crate) fn write_unloadable_archive(dir: &Path, name: &str, classes: &str) -> PathBuf {
    let manifest = manifest_with(&[
        ("Plugin-Class", classes),
        ("Plugin-Library", "lib/plugin.bin"),
    ]);
    write_archive(
        dir,
        name,
        &[
            ("META-INF/MANIFEST.MF", manifest.as_str()),
            ("lib/plugin.bin", "not a shared object"),
        ],
    )
}

/// Writes an archive whose manifest declares no plugins.
pub(crate) fn write_quiet_archive(dir: &Path, name: &str) -> PathBuf {
    let manifest = manifest_with(&[("Created-By", "plugload tests")]);
    write_archive(dir, name, &[("META-INF/MANIFEST.MF", manifest.as_str())])
}
