//! Archive scopes backed by a mapped native library.

use std::fmt;
#[cfg(unix)]
use std::fs;
use std::path::{Path, PathBuf};

use libloading::Library;
use tempfile::TempDir;
use tracing::debug;
use url::Url;

use super::{CodeScope, ScopeResource};
use crate::archive::{PluginArchive, file_url};
use crate::declaration::{DeclarationHeader, PluginDeclaration, PluginType};
use crate::error::{LoadError, LookupError};

const NATIVE_TARGET: &str = "plugload::scope::native";

/// A plugin archive whose native library has been extracted and mapped.
///
/// Only the extracted library's own exports are visible through
/// [`CodeScope::lookup`]. The library is unmapped, and its private
/// extraction directory removed, when the last reference to the scope is
/// dropped.
pub struct NativeArchiveScope {
    library: Library,
    library_path: PathBuf,
    archive: PathBuf,
    origin: Url,
    extracted: TempDir,
}

impl NativeArchiveScope {
    /// Extracts and maps the native library held by the archive at `path`.
    ///
    /// `library_attribute` names the manifest attribute that may designate
    /// the library entry explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when the archive is unreadable,
    /// holds no unique library, or the library fails to load.
    pub fn open(path: &Path, library_attribute: &str) -> Result<Self, LoadError> {
        let origin = file_url(path)?;
        let mut archive = PluginArchive::open(path)?;
        let entry = archive.library_entry(library_attribute)?;
        let extracted = tempfile::Builder::new()
            .prefix("plugload-")
            .tempdir()
            .map_err(|error| LoadError::malformed_by(path, error))?;
        let library_path = archive.extract(&entry, extracted.path())?;
        // SAFETY: mapping runs the library's initialisers. Archives handed to
        // the loader are trusted plugin code built against this crate.
        let library = unsafe { Library::new(&library_path) }
            .map_err(|error| LoadError::malformed_by(path, error))?;
        debug!(
            target: NATIVE_TARGET,
            archive = %path.display(),
            library = %entry,
            "mapped plugin library"
        );
        Ok(Self {
            library,
            library_path,
            archive: path.to_path_buf(),
            origin,
            extracted,
        })
    }

    /// Archive the library was extracted from.
    #[must_use]
    pub fn archive(&self) -> &Path {
        &self.archive
    }
}

impl CodeScope for NativeArchiveScope {
    fn lookup(&self, symbol: &str) -> Result<PluginType, LookupError> {
        read_declaration(&self.library, symbol, Some(&self.library_path))
    }

    fn resources(&self, path: &str) -> Result<Vec<ScopeResource>, LoadError> {
        let mut archive = PluginArchive::open(&self.archive)?;
        Ok(archive
            .entry(path)?
            .map(|content| {
                let mut origin = self.origin.clone();
                origin.set_fragment(Some(path));
                ScopeResource::new(origin, content)
            })
            .into_iter()
            .collect())
    }

    fn origin(&self) -> Url {
        self.origin.clone()
    }
}

impl fmt::Debug for NativeArchiveScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeArchiveScope")
            .field("archive", &self.archive)
            .field("library", &self.library_path)
            .field("extracted", &self.extracted.path())
            .finish_non_exhaustive()
    }
}

/// Reads the declaration exported under `symbol` from `library`.
///
/// With an `owner`, the symbol must be defined by the object file at that
/// path: the platform loader also resolves names through a library's
/// dependencies, and those exports are not part of the scope.
pub(super) fn read_declaration(
    library: &Library,
    symbol: &str,
    owner: Option<&Path>,
) -> Result<PluginType, LookupError> {
    // SAFETY: only the symbol's address is taken here; nothing is read
    // until the owner and header checks below have passed.
    let address = unsafe { library.get::<*const PluginDeclaration>(symbol.as_bytes()) }
        .map_err(|error| LookupError::not_found(symbol, error.to_string()))?;
    let pointer: *const PluginDeclaration = *address;
    if pointer.is_null() {
        return Err(LookupError::not_found(
            symbol,
            "symbol resolves to a null address",
        ));
    }
    if let Some(library_path) = owner {
        ensure_defined_in(pointer.cast(), library_path, symbol)?;
    }
    // SAFETY: the address lies inside a mapped object and the header is a
    // plain pair of integers, read without alignment assumptions.
    let header = unsafe { pointer.cast::<DeclarationHeader>().read_unaligned() };
    header.check(symbol)?;
    if !pointer.is_aligned() {
        return Err(LookupError::not_found(
            symbol,
            "declaration is not suitably aligned",
        ));
    }
    // SAFETY: the magic and ABI version match, so the pointer addresses a
    // `#[repr(C)]` declaration static owned by `library`, which outlives
    // this borrow. Fields are copied before returning.
    let declaration = unsafe { &*pointer };
    PluginType::from_declaration(symbol, declaration)
}

#[cfg(unix)]
fn ensure_defined_in(
    address: *const std::ffi::c_void,
    library_path: &Path,
    symbol: &str,
) -> Result<(), LookupError> {
    let defining = defining_object(address).ok_or_else(|| {
        LookupError::not_found(symbol, "address does not belong to a loaded object")
    })?;
    if same_file(&defining, library_path) {
        Ok(())
    } else {
        Err(LookupError::not_found(
            symbol,
            format!("symbol is defined by {}", defining.display()),
        ))
    }
}

// Windows resolves exports of the given module only.
#[cfg(not(unix))]
const fn ensure_defined_in(
    _address: *const std::ffi::c_void,
    _library_path: &Path,
    _symbol: &str,
) -> Result<(), LookupError> {
    Ok(())
}

#[cfg(unix)]
fn defining_object(address: *const std::ffi::c_void) -> Option<PathBuf> {
    use std::ffi::{CStr, OsStr};
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let mut slot = MaybeUninit::<libc::Dl_info>::zeroed();
    // SAFETY: `dladdr` only consults the loader's tables and fills `slot`.
    let found = unsafe { libc::dladdr(address, slot.as_mut_ptr()) };
    if found == 0 {
        return None;
    }
    // SAFETY: a non-zero return means `slot` was filled.
    let info = unsafe { slot.assume_init() };
    if info.dli_fname.is_null() {
        return None;
    }
    // SAFETY: `dli_fname` is a NUL-terminated string owned by the loader.
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    Some(PathBuf::from(OsStr::from_bytes(name.to_bytes())))
}

#[cfg(unix)]
fn same_file(left: &Path, right: &Path) -> bool {
    left == right
        || matches!(
            (fs::canonicalize(left), fs::canonicalize(right)),
            (Ok(first), Ok(second)) if first == second
        )
}
