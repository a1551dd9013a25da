//! Read access to plugin archives.
//!
//! A plugin archive is a zip file carrying a manifest at
//! [`MANIFEST_PATH`], optional service descriptors, and exactly one native
//! library. Every failure to read the container surfaces as
//! [`LoadError::MalformedSource`] naming the archive.

use std::env::consts::DLL_SUFFIX;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use plugload_config::defaults::MANIFEST_PATH;
use tracing::debug;
use url::Url;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::LoadError;
use crate::manifest::Manifest;

const ARCHIVE_TARGET: &str = "plugload::archive";

/// An opened plugin archive.
#[derive(Debug)]
pub struct PluginArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl PluginArchive {
    /// Opens the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when the file cannot be opened
    /// or is not a zip container.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|error| LoadError::malformed_by(path, error))?;
        let zip = ZipArchive::new(file).map_err(|error| LoadError::malformed_by(path, error))?;
        debug!(
            target: ARCHIVE_TARGET,
            path = %path.display(),
            entries = zip.len(),
            "opened plugin archive"
        );
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    /// Path the archive was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entry named `name`, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when the entry exists but
    /// cannot be decompressed.
    pub fn entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let mut file = match self.zip.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(error) => return Err(LoadError::malformed_by(&self.path, error)),
        };
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|error| LoadError::malformed_by(&self.path, error))?;
        Ok(Some(content))
    }

    /// Parses the archive manifest, or `None` when there is none.
    ///
    /// # Errors
    ///
    /// Propagates entry read failures.
    pub fn manifest(&mut self) -> Result<Option<Manifest>, LoadError> {
        Ok(self
            .entry(MANIFEST_PATH)?
            .map(|bytes| Manifest::parse(&String::from_utf8_lossy(&bytes))))
    }

    /// Names the native library entry.
    ///
    /// The manifest attribute `library_attribute` takes precedence;
    /// otherwise the archive must hold exactly one entry ending in the
    /// platform's dynamic-library suffix.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when no unique library entry
    /// can be identified.
    pub fn library_entry(&mut self, library_attribute: &str) -> Result<String, LoadError> {
        let declared = self
            .manifest()?
            .and_then(|manifest| manifest.attribute(library_attribute).map(str::to_owned));
        if let Some(name) = declared {
            return Ok(name);
        }
        let mut candidates = self
            .zip
            .file_names()
            .filter(|name| name.ends_with(DLL_SUFFIX));
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Ok(only.to_owned()),
            (None, _) => Err(LoadError::malformed(
                &self.path,
                format!("archive holds no '{DLL_SUFFIX}' library"),
            )),
            (Some(_), Some(_)) => Err(LoadError::malformed(
                &self.path,
                format!(
                    "archive holds several '{DLL_SUFFIX}' libraries; set '{library_attribute}'"
                ),
            )),
        }
    }

    /// Writes the entry `name` into `directory`, returning the written path.
    ///
    /// Only the entry's file name is kept, so entries cannot escape the
    /// target directory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when the entry is missing,
    /// unreadable, or cannot be written to `directory`.
    pub fn extract(&mut self, name: &str, directory: &Path) -> Result<PathBuf, LoadError> {
        let file_name = Path::new(name).file_name().ok_or_else(|| {
            LoadError::malformed(&self.path, format!("invalid entry name '{name}'"))
        })?;
        let content = self.entry(name)?.ok_or_else(|| {
            LoadError::malformed(&self.path, format!("library entry '{name}' is missing"))
        })?;
        let target = directory.join(file_name);
        fs::write(&target, content).map_err(|error| LoadError::malformed_by(&self.path, error))?;
        Ok(target)
    }
}

/// Builds a `file:` URL for `path`, absolutising relative paths.
pub(crate) fn file_url(path: &Path) -> Result<Url, LoadError> {
    let absolute = std::path::absolute(path).map_err(|error| LoadError::io(path, error))?;
    Url::from_file_path(&absolute)
        .map_err(|()| LoadError::malformed(path, "path cannot be expressed as a file URL"))
}

#[cfg(test)]
mod tests;
