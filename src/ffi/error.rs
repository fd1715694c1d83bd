//! FFI Errors

use std::path::PathBuf;

use thiserror::Error;

/// Error type for bridge operations
#[derive(Debug, Error)]
pub enum FfiError {
    /// The declaration text is not a valid C function declaration
    #[error("Invalid signature: {0}")]
    Signature(String),

    /// The library could not be opened or mapped into the process
    #[error("Failed to load library '{}': {reason}", path.display())]
    LibraryLoad { path: PathBuf, reason: String },

    /// The library is loaded but does not export the symbol
    #[error("Symbol '{symbol}' not found in '{}': {reason}", library.display())]
    SymbolNotFound {
        symbol: String,
        library: PathBuf,
        reason: String,
    },

    /// The symbol name cannot be passed to the dynamic loader
    #[error("Invalid symbol name: {0:?}")]
    InvalidSymbol(String),

    /// The declaration does not describe the Rust function type it is bound to
    #[error("Signature mismatch: declared `{declared}`, bound as `{bound}`")]
    SignatureMismatch { declared: String, bound: String },
}

impl FfiError {
    pub(crate) fn signature(msg: impl Into<String>) -> Self {
        FfiError::Signature(msg.into())
    }
}
