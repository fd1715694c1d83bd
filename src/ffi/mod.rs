//! Native Call Bridge
//!
//! Loads a shared library, binds one of its C exports to a typed Rust
//! function pointer and calls it.
//!
//! # Lifecycle
//!
//! ```text
//! declare("double multiply(double, double);")   -> FfiSignature
//!       │
//!       ▼
//! NativeLibrary::load("./libmult.so")           -> NativeLibrary
//!       │
//!       ▼
//! lib.resolve::<fn(f64, f64) -> f64>(&sig)      -> Proxy<'lib, F>
//!       │
//!       ▼
//! proxy.call(6.5, 2.0)                          -> 13.0
//! ```
//!
//! Each step happens once, in order. A [`Proxy`] borrows its
//! [`NativeLibrary`], so the library cannot be unloaded while it is in use.
//!
//! # Example
//!
//! ```no_run
//! use cbridge::ffi::{declare, NativeLibrary};
//!
//! type MultiplyFn = unsafe extern "C" fn(f64, f64) -> f64;
//!
//! let sig = declare("double multiply(double, double);")?;
//! let lib = NativeLibrary::load("./libmult.so")?;
//! // Safety: libmult exports `double multiply(double, double)`.
//! let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig)? };
//! assert_eq!(multiply.call(6.5, 2.0), 13.0);
//! # Ok::<(), cbridge::ffi::FfiError>(())
//! ```

mod binding;
mod error;
mod loader;
mod types;

pub use binding::{CType, NativeFn, Proxy};
pub use error::FfiError;
pub use loader::{library_filename, NativeLibrary};
pub use types::{format_result, FfiSignature, FfiType};

use tracing::debug;

/// Parse a C function declaration into a signature descriptor
pub fn declare(signature_text: &str) -> Result<FfiSignature, FfiError> {
    let signature = FfiSignature::parse(signature_text)?;
    debug!(signature = %signature, "declared native function");
    Ok(signature)
}
