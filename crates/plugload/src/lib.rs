//! Discovery, loading, and instantiation of capability plugins.
//!
//! Plugins are native libraries packaged in zip archives. Each archive
//! carries a manifest and, optionally, service descriptors naming the
//! plugin declarations its library exports. A host describes the interface
//! it wants through a [`Capability`] and asks a [`PluginLoader`] (or a
//! [`FolderScanner`] for a whole directory) for every matching instance.
//!
//! # Pipeline
//!
//! Loading a [`Source`] runs three pluggable steps:
//!
//! 1. a [`NameResolver`] lists candidate names without mapping any code;
//! 2. a [`BoundaryOpener`] maps the source into a [`Boundary`], but only
//!    when there is at least one candidate;
//! 3. an [`InstantiationStrategy`] builds a value for each candidate whose
//!    declaration implements the capability.
//!
//! Failures of individual candidates are recorded in the [`LoadResult`]
//! rather than aborting the load. The result owns the boundaries it used;
//! releasing them turns every instance created through them stale.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use plugload::{Capability, FolderScanner, ScanDepth};
//!
//! trait Greeter: Send {
//!     fn greet(&self) -> String;
//! }
//!
//! struct Greeters;
//!
//! impl Capability for Greeters {
//!     const NAME: &'static str = "greeter";
//!     type Instance = Box<dyn Greeter>;
//! }
//!
//! let scanner = FolderScanner::default();
//! let mut result = scanner
//!     .scan::<Greeters>(Path::new("plugins"), ScanDepth::ONE)
//!     .expect("plugin folder is readable");
//! for plugin in result.instances() {
//!     let greeter = plugin.get().expect("boundary still open");
//!     let _ = greeter.greet();
//! }
//! result.release();
//! ```

pub mod archive;
pub mod boundary;
pub mod declaration;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod scanner;
pub mod scope;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use self::boundary::{Boundary, BoundaryId, BoundaryOpener, NativeBoundaryOpener};
pub use self::declaration::{
    ABI_VERSION, ArgumentConstructor, Capability, Constructed, Constructor, DECLARATION_MAGIC,
    PluginDeclaration, PluginType,
};
pub use self::error::{
    FailureKind, InstantiationError, LoadError, LookupError, PluginFailure, StaleHandle,
};
pub use self::loader::PluginLoader;
pub use self::manifest::Manifest;
pub use self::plugin::Plugin;
pub use self::registry::PluginRegistry;
pub use self::resolver::{
    ManifestAttributeResolver, NameResolver, OriginFilter, ServiceDescriptorResolver,
};
pub use self::result::{LoadResult, PluginRecord};
pub use self::scanner::{FolderScanner, ScanDepth, find_files};
pub use self::scope::{
    CodeScope, MergedScope, NativeArchiveScope, ProcessScope, ScopeResource, Source, StaticScope,
};
pub use self::strategy::{DefaultConstructor, InstantiationStrategy, WithArguments};
