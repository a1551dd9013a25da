//! The running process as a code scope.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use libloading::Library;
use url::Url;

use super::native::read_declaration;
use super::{CodeScope, ScopeResource};
use crate::archive::file_url;
use crate::declaration::PluginType;
use crate::error::{LoadError, LookupError};

/// Declarations exported by the current executable and the libraries it
/// already loaded, plus resources read from a list of directories.
///
/// Executables only export their symbols dynamically when linked to do so
/// (for instance with `-rdynamic`).
pub struct ProcessScope {
    image: Library,
    origin: Url,
    roots: Vec<PathBuf>,
}

impl ProcessScope {
    /// Opens the current process image with the given resource roots.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the executable path is unknown and
    /// [`LoadError::MalformedSource`] when the platform refuses to expose
    /// the process image.
    pub fn open(roots: impl IntoIterator<Item = PathBuf>) -> Result<Self, LoadError> {
        let executable = std::env::current_exe()
            .map_err(|error| LoadError::io("<current executable>", error))?;
        Ok(Self {
            image: current_image()?,
            origin: file_url(&executable)?,
            roots: roots.into_iter().collect(),
        })
    }

    /// Directories searched for resources, in order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

#[cfg(unix)]
fn current_image() -> Result<Library, LoadError> {
    Ok(libloading::os::unix::Library::this().into())
}

#[cfg(windows)]
fn current_image() -> Result<Library, LoadError> {
    libloading::os::windows::Library::this()
        .map(Library::from)
        .map_err(|error| LoadError::malformed_by("<current executable>", error))
}

impl CodeScope for ProcessScope {
    fn lookup(&self, symbol: &str) -> Result<PluginType, LookupError> {
        read_declaration(&self.image, symbol, None)
    }

    fn resources(&self, path: &str) -> Result<Vec<ScopeResource>, LoadError> {
        let mut found = Vec::new();
        for root in &self.roots {
            let candidate = root.join(path);
            match fs::read(&candidate) {
                Ok(content) => found.push(ScopeResource::new(file_url(&candidate)?, content)),
                Err(error)
                    if matches!(error.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {}
                Err(error) => return Err(LoadError::io(candidate, error)),
            }
        }
        Ok(found)
    }

    fn origin(&self) -> Url {
        self.origin.clone()
    }
}

impl fmt::Debug for ProcessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessScope")
            .field("origin", &self.origin.as_str())
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}
