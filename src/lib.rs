//! cbridge - Typed Native Call Bridge
//!
//! Loads a precompiled shared library, binds an exported C function to a
//! Rust function-pointer type and calls it. The reference use is
//! `double multiply(double, double)`:
//!
//! ```no_run
//! use cbridge::ffi::{declare, format_result, NativeLibrary};
//!
//! type MultiplyFn = unsafe extern "C" fn(f64, f64) -> f64;
//!
//! let sig = declare("double multiply(double, double);")?;
//! let lib = NativeLibrary::load("./libmult.dylib")?;
//! // Safety: libmult exports `double multiply(double, double)`.
//! let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig)? };
//! println!("The result is: {}", format_result(multiply.call(6.5, 2.0)));
//! # Ok::<(), cbridge::ffi::FfiError>(())
//! ```
//!
//! # Modules
//!
//! - [`ffi`]: declaration parsing, library loading, typed symbol resolution
//! - [`config`]: `cbridge.toml` settings
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod ffi;
pub mod logging;

pub use config::{BridgeConfig, ConfigError, LibraryTarget};
pub use ffi::{declare, FfiError, FfiSignature, FfiType, NativeFn, NativeLibrary, Proxy};
