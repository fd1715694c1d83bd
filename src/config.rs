//! cbridge Configuration
//!
//! Handles parsing and management of cbridge.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name searched for by [`BridgeConfig::locate`].
pub const CONFIG_FILE_NAME: &str = "cbridge.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching cbridge.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Where the native library lives
    #[serde(default)]
    pub library: LibraryConfig,

    /// The function to bind
    #[serde(default)]
    pub function: FunctionConfig,

    /// Default operands
    #[serde(default)]
    pub call: CallConfig,
}

/// How the library file is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryTarget {
    /// Load exactly this file
    Path(PathBuf),
    /// Search for the platform filename of this base name
    Name {
        name: String,
        search_paths: Vec<PathBuf>,
    },
}

impl BridgeConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Io(e),
        })?;
        let config: BridgeConfig = toml::from_str(&content)?;
        debug!(path = %path.display(), library = ?config.library_target(), "parsed config");
        Ok(config)
    }

    /// Nearest `cbridge.toml` in `start_dir` or one of its ancestors.
    pub fn locate(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the nearest `cbridge.toml` above `start_dir`.
    ///
    /// Without one, the defaults reproduce the reference call: `mult` in the
    /// working directory, `double multiply(double, double);`, 6.5 and 2.0.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        match Self::locate(start_dir) {
            Some(path) => {
                info!(path = %path.display(), "using config file");
                Self::load(&path)
            }
            None => {
                debug!(start = %start_dir.display(), "no {} found, using defaults", CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    /// Explicit path wins over name lookup.
    pub fn library_target(&self) -> LibraryTarget {
        match &self.library.path {
            Some(path) => LibraryTarget::Path(path.clone()),
            None => LibraryTarget::Name {
                name: self.library.name.clone(),
                search_paths: self.library.search_paths.clone(),
            },
        }
    }

    /// Symbol to look up; the declared function name unless overridden.
    pub fn symbol_override(&self) -> Option<&str> {
        self.function.symbol.as_deref()
    }
}

/// Library location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Path to the library file, relative to the working directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Base name used with `search_paths` when no path is given
    #[serde(default = "default_library_name")]
    pub name: String,

    /// Directories searched before the working directory
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

fn default_library_name() -> String {
    "mult".to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: None,
            name: default_library_name(),
            search_paths: Vec::new(),
        }
    }
}

/// Function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// C declaration of the export
    #[serde(default = "default_declaration")]
    pub declaration: String,

    /// Exported symbol name, if it differs from the declared name
    #[serde(default)]
    pub symbol: Option<String>,
}

fn default_declaration() -> String {
    "double multiply(double, double);".to_string()
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            declaration: default_declaration(),
            symbol: None,
        }
    }
}

/// Operands passed when none are given on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallConfig {
    #[serde(default = "default_a")]
    pub a: f64,

    #[serde(default = "default_b")]
    pub b: f64,
}

fn default_a() -> f64 {
    6.5
}

fn default_b() -> f64 {
    2.0
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            a: default_a(),
            b: default_b(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.library.name, "mult");
        assert!(config.library.path.is_none());
        assert_eq!(config.function.declaration, "double multiply(double, double);");
        assert_eq!(config.call.a, 6.5);
        assert_eq!(config.call.b, 2.0);
        assert_eq!(
            config.library_target(),
            LibraryTarget::Name {
                name: "mult".to_string(),
                search_paths: Vec::new(),
            }
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[library]
path = "./libmult.dylib"

[function]
declaration = "double times(double x, double y)"
symbol = "multiply"

[call]
a = 3.0
"#;
        let config: BridgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.library_target(),
            LibraryTarget::Path(PathBuf::from("./libmult.dylib"))
        );
        assert_eq!(config.symbol_override(), Some("multiply"));
        assert_eq!(config.call.a, 3.0);
        assert_eq!(config.call.b, 2.0);
    }

    #[test]
    fn test_parse_error() {
        let err = toml::from_str::<BridgeConfig>("[call]\na = \"six\"").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut config = BridgeConfig::default();
        config.library.search_paths = vec![PathBuf::from("/opt/native")];
        config.call.b = 4.0;
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            toml::to_string_pretty(&config).unwrap(),
        )
        .unwrap();

        let found = BridgeConfig::find_and_load(&nested).unwrap();
        assert_eq!(found, config);
    }

    #[test]
    fn test_locate_prefers_nearest_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        let nested = project.join("src").join("bin");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[call]\na = 1.0\n").unwrap();
        std::fs::write(project.join(CONFIG_FILE_NAME), "[call]\na = 7.0\n").unwrap();
        // A directory with the config name is not a config file
        std::fs::create_dir(nested.join(CONFIG_FILE_NAME)).unwrap();

        assert_eq!(
            BridgeConfig::locate(&nested),
            Some(project.join(CONFIG_FILE_NAME))
        );
        assert_eq!(BridgeConfig::find_and_load(&nested).unwrap().call.a, 7.0);
        assert_eq!(
            BridgeConfig::locate(dir.path()),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );
    }
}
