//! Dynamic Library Loader
//!
//! Safe wrapper around libloading for loading shared libraries and resolving
//! typed symbols from them.

use std::ffi::{c_void, CString};
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tracing::{debug, info};

use super::{FfiError, FfiSignature, NativeFn, Proxy};

/// A dynamically loaded library
///
/// The library is unmapped when this value is dropped, or explicitly through
/// [`NativeLibrary::close`]. Proxies borrow it, so it cannot go away while
/// one is still alive.
#[derive(Debug)]
pub struct NativeLibrary {
    /// Path the library was opened from
    path: PathBuf,
    /// The loaded library handle
    library: Library,
}

impl NativeLibrary {
    /// Load a library from the given path.
    ///
    /// Relative paths are resolved against the current working directory,
    /// never against the system loader's search path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FfiError> {
        let requested = path.as_ref();
        let load_error = |reason: String| FfiError::LibraryLoad {
            path: requested.to_path_buf(),
            reason,
        };

        let path = if requested.is_relative() {
            std::env::current_dir()
                .map_err(|e| load_error(format!("cannot determine working directory: {}", e)))?
                .join(requested)
        } else {
            requested.to_path_buf()
        };

        if !path.exists() {
            return Err(load_error("no such file".to_string()));
        }

        // Safety: loading a library runs its initializers. We trust the
        // caller to point us at a library they intend to execute.
        let library = unsafe { Library::new(&path) }.map_err(|e| load_error(e.to_string()))?;

        info!(path = %path.display(), "loaded native library");
        Ok(Self { path, library })
    }

    /// Load a library by base name, trying the platform filename in each
    /// search path and then in the current directory.
    ///
    /// A name that already points at an existing file is loaded directly.
    pub fn load_by_name(name: &str, search_paths: &[PathBuf]) -> Result<Self, FfiError> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Self::load(direct);
        }

        let candidates = candidate_paths(name, search_paths);
        for candidate in &candidates {
            debug!(candidate = %candidate.display(), "probing for library");
            if candidate.is_file() {
                return Self::load(candidate);
            }
        }

        let tried: Vec<String> = candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect();
        Err(FfiError::LibraryLoad {
            path: PathBuf::from(library_filename(name)),
            reason: format!("not found (tried: {})", tried.join(", ")),
        })
    }

    /// Get the path to this library
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the library exports a symbol with this name
    pub fn has_symbol(&self, name: &str) -> bool {
        let Ok(c_name) = CString::new(name) else {
            return false;
        };
        // Safety: the symbol is only looked up, never dereferenced or called.
        unsafe {
            self.library
                .get::<*mut c_void>(c_name.as_bytes_with_nul())
                .is_ok()
        }
    }

    /// Resolve the function named by the declaration as a callable of type `F`.
    ///
    /// Fails with [`FfiError::SignatureMismatch`] if the declaration does not
    /// describe `F`, and with [`FfiError::SymbolNotFound`] if the library has
    /// no such export.
    ///
    /// # Safety
    ///
    /// The native symbol must really be a C-ABI function of type `F`. Only the
    /// declaration is checked against `F`. A symbol whose actual signature
    /// differs from the declaration is undefined behavior when called, and
    /// there is no way to detect it here.
    pub unsafe fn resolve<F: NativeFn>(
        &self,
        signature: &FfiSignature,
    ) -> Result<Proxy<'_, F>, FfiError> {
        self.resolve_as(&signature.name, signature)
    }

    /// Like [`NativeLibrary::resolve`], but looks up `symbol` instead of the
    /// declared function name.
    ///
    /// # Safety
    ///
    /// Same contract as [`NativeLibrary::resolve`].
    pub unsafe fn resolve_as<F: NativeFn>(
        &self,
        symbol: &str,
        signature: &FfiSignature,
    ) -> Result<Proxy<'_, F>, FfiError> {
        if !signature.matches(&F::param_types(), F::return_type()) {
            return Err(FfiError::SignatureMismatch {
                declared: signature.to_string(),
                bound: F::describe(&signature.name).to_string(),
            });
        }

        let c_name = CString::new(symbol)
            .map_err(|_| FfiError::InvalidSymbol(symbol.to_string()))?;

        let func: Symbol<'_, F> = self.library.get(c_name.as_bytes_with_nul()).map_err(|e| {
            FfiError::SymbolNotFound {
                symbol: symbol.to_string(),
                library: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        debug!(symbol, signature = %signature, "resolved native symbol");
        Ok(Proxy::new(func, signature.clone()))
    }

    /// Unload the library now, reporting any error from the platform loader
    pub fn close(self) -> Result<(), FfiError> {
        let path = self.path;
        self.library.close().map_err(|e| FfiError::LibraryLoad {
            path: path.clone(),
            reason: format!("failed to unload: {}", e),
        })?;
        debug!(path = %path.display(), "unloaded native library");
        Ok(())
    }
}

/// Every path `load_by_name` tries, in order
fn candidate_paths(name: &str, search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let lib_name = library_filename(name);
    let mut candidates: Vec<PathBuf> = search_paths.iter().map(|p| p.join(&lib_name)).collect();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(&lib_name));
    }
    candidates
}

/// Construct the platform-specific library filename
pub fn library_filename(name: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        if name.starts_with("lib") && name.ends_with(".dylib") {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(target_os = "windows")]
    {
        if name.ends_with(".dll") {
            name.to_string()
        } else {
            format!("{}.dll", name)
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        if name.starts_with("lib") && name.ends_with(".so") {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }
}
