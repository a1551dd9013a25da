//! Folder scanning.
//!
//! [`FolderScanner::scan`] loads every archive under a directory, up to a
//! [`ScanDepth`], and merges the per-archive results. An archive that cannot
//! be read is recorded as a [`PluginFailure::MalformedSource`] and the scan
//! carries on; only a missing or unreadable root aborts it.

use std::fs;
use std::io::{self, ErrorKind};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use plugload_config::LoaderSettings;
use plugload_config::defaults::{DEFAULT_ARCHIVE_EXTENSION, DEFAULT_SCAN_DEPTH};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::declaration::Capability;
use crate::error::{LoadError, PluginFailure};
use crate::loader::PluginLoader;
use crate::result::LoadResult;
use crate::scope::Source;

const SCANNER_TARGET: &str = "plugload::scanner";

/// How many directory levels a scan descends. `1` lists direct children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanDepth(NonZeroUsize);

impl ScanDepth {
    /// Direct children only.
    pub const ONE: Self = Self(NonZeroUsize::MIN);

    /// No depth limit.
    pub const UNBOUNDED: Self = Self(NonZeroUsize::MAX);

    /// Validates a signed depth.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Precondition`] when `depth` is zero or negative.
    pub fn new(depth: i64) -> Result<Self, LoadError> {
        if depth <= 0 {
            return Err(LoadError::precondition(format!(
                "scan depth must be at least 1, got {depth}"
            )));
        }
        Ok(usize::try_from(depth)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Self::UNBOUNDED, Self))
    }

    /// Depth as a level count.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ScanDepth {
    fn default() -> Self {
        NonZeroUsize::new(DEFAULT_SCAN_DEPTH).map_or(Self::ONE, Self)
    }
}

impl TryFrom<usize> for ScanDepth {
    type Error = LoadError;

    fn try_from(depth: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(depth)
            .map(Self)
            .ok_or_else(|| LoadError::precondition("scan depth must be at least 1, got 0"))
    }
}

/// Lists regular files under `root` accepted by `predicate`, sorted by path.
///
/// Files directly inside `root` are at depth 1. Symbolic links are
/// followed. Unreadable subdirectories are logged and skipped.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when `root` is missing, unreadable, or not a
/// directory.
pub fn find_files<P>(root: &Path, depth: ScanDepth, predicate: P) -> Result<Vec<PathBuf>, LoadError>
where
    P: Fn(&Path) -> bool,
{
    let metadata = fs::metadata(root).map_err(|error| LoadError::io(root, error))?;
    if !metadata.is_dir() {
        return Err(LoadError::io(
            root,
            io::Error::new(ErrorKind::NotADirectory, "scan root is not a directory"),
        ));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth.get())
        .follow_links(true)
        .sort_by_file_name();
    for walked in walker {
        match walked {
            Ok(entry) if entry.file_type().is_file() && predicate(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(error) => {
                warn!(
                    target: SCANNER_TARGET,
                    root = %root.display(),
                    error = %error,
                    "skipping unreadable entry"
                );
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every archive found under a directory.
#[derive(Debug)]
pub struct FolderScanner {
    loader: PluginLoader,
    extension: String,
    depth: ScanDepth,
}

impl Default for FolderScanner {
    fn default() -> Self {
        Self::new(PluginLoader::for_archives())
    }
}

impl FolderScanner {
    /// Creates a scanner loading archives with `loader`.
    #[must_use]
    pub fn new(loader: PluginLoader) -> Self {
        Self {
            loader,
            extension: DEFAULT_ARCHIVE_EXTENSION.to_owned(),
            depth: ScanDepth::default(),
        }
    }

    /// Creates a scanner and its loader from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Precondition`] when the configured depth is zero.
    pub fn from_settings(settings: &LoaderSettings) -> Result<Self, LoadError> {
        Ok(Self::new(PluginLoader::from_settings(settings))
            .with_extension(settings.archive_extension())
            .with_depth(ScanDepth::try_from(settings.scan_depth())?))
    }

    /// Overrides the archive file-name suffix.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Overrides the depth used by [`scan_default`](Self::scan_default).
    #[must_use]
    pub const fn with_depth(mut self, depth: ScanDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Depth used by [`scan_default`](Self::scan_default).
    #[must_use]
    pub const fn depth(&self) -> ScanDepth {
        self.depth
    }

    /// Archive file-name suffix.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Loader applied to each archive.
    #[must_use]
    pub const fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Lists the archives a scan of `root` would load.
    ///
    /// # Errors
    ///
    /// See [`find_files`].
    pub fn archives(&self, root: &Path, depth: ScanDepth) -> Result<Vec<PathBuf>, LoadError> {
        find_files(root, depth, |path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(self.extension.as_str()))
        })
    }

    /// Loads every `C` plugin from the archives under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when `root` cannot be listed and
    /// propagates precondition failures raised by the loader. Per-archive
    /// read failures are recorded in the result.
    pub fn scan<C: Capability>(
        &self,
        root: &Path,
        depth: ScanDepth,
    ) -> Result<LoadResult<C::Instance>, LoadError> {
        let archives = self.archives(root, depth)?;
        debug!(
            target: SCANNER_TARGET,
            root = %root.display(),
            depth = depth.get(),
            archives = archives.len(),
            "scanning plugin folder"
        );
        let mut merged = LoadResult::empty();
        for path in archives {
            match self.loader.load::<C>(&Source::archive(path.as_path())) {
                Ok(result) => merged.merge(result),
                Err(error) if error.is_per_source() => {
                    warn!(
                        target: SCANNER_TARGET,
                        path = %path.display(),
                        error = %error,
                        "skipping unreadable archive"
                    );
                    merged.push_failure(PluginFailure::MalformedSource { path, cause: error });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(merged)
    }

    /// Loads every `C` plugin under `root` down to the configured depth.
    ///
    /// # Errors
    ///
    /// See [`scan`](Self::scan).
    pub fn scan_default<C: Capability>(
        &self,
        root: &Path,
    ) -> Result<LoadResult<C::Instance>, LoadError> {
        self.scan::<C>(root, self.depth)
    }
}
