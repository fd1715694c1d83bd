//! cbridge - Native Call Bridge
//!
//! CLI entry point: load a shared library, bind `multiply` and print the product.

use anyhow::{Context, Result};
use cbridge::config::{BridgeConfig, LibraryTarget};
use cbridge::ffi::{declare, format_result, NativeLibrary};
use cbridge::logging;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// The Rust binding every declaration is checked against
type MultiplyFn = unsafe extern "C" fn(f64, f64) -> f64;

#[derive(Parser)]
#[command(name = "cbridge")]
#[command(version)]
#[command(about = "Call a native double(double, double) function from a shared library", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// First operand (default: call.a from config, 6.5)
    a: Option<f64>,

    /// Second operand (default: call.b from config, 2.0)
    b: Option<f64>,

    /// Path to the shared library
    #[arg(long, value_name = "PATH")]
    lib: Option<PathBuf>,

    /// Library base name, expanded to the platform filename (e.g. mult -> libmult.so)
    #[arg(long, conflicts_with = "lib")]
    name: Option<String>,

    /// Extra directory to search for --name
    #[arg(short = 'L', long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// C declaration of the function
    #[arg(long = "declare", value_name = "TEXT")]
    declaration: Option<String>,

    /// Exported symbol name, if it differs from the declared name
    #[arg(long)]
    symbol: Option<String>,

    /// Config file (default: nearest cbridge.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            BridgeConfig::find_and_load(&cwd).context("Failed to load cbridge.toml")?
        }
    };

    let declaration = cli
        .declaration
        .as_deref()
        .unwrap_or(&config.function.declaration);
    let signature = declare(declaration).context("Invalid function declaration")?;

    let library = open_library(&library_target(&cli, &config))?;

    let symbol = cli
        .symbol
        .as_deref()
        .or(config.symbol_override())
        .unwrap_or(&signature.name);
    let a = cli.a.unwrap_or(config.call.a);
    let b = cli.b.unwrap_or(config.call.b);

    let result = {
        // Safety: the library is expected to export `symbol` as
        // `double (double, double)`. The declaration was just checked
        // against MultiplyFn, but the export itself cannot be inspected.
        let multiply = unsafe { library.resolve_as::<MultiplyFn>(symbol, &signature) }
            .with_context(|| format!("Failed to bind '{}'", symbol))?;
        multiply.call(a, b)
    };
    info!(a, b, result, "native call returned");

    println!("The result is: {}", format_result(result));

    library.close().context("Failed to unload library")?;
    Ok(())
}

/// Command-line flags take precedence over cbridge.toml
fn library_target(cli: &Cli, config: &BridgeConfig) -> LibraryTarget {
    if let Some(path) = &cli.lib {
        return LibraryTarget::Path(path.clone());
    }
    match (cli.name.clone(), config.library_target()) {
        (Some(name), LibraryTarget::Name { search_paths, .. }) => LibraryTarget::Name {
            name,
            search_paths: cli.search_paths.iter().cloned().chain(search_paths).collect(),
        },
        (Some(name), LibraryTarget::Path(_)) => LibraryTarget::Name {
            name,
            search_paths: cli.search_paths.clone(),
        },
        (None, LibraryTarget::Name { name, search_paths }) => LibraryTarget::Name {
            name,
            search_paths: cli.search_paths.iter().cloned().chain(search_paths).collect(),
        },
        (None, target @ LibraryTarget::Path(_)) => target,
    }
}

fn open_library(target: &LibraryTarget) -> Result<NativeLibrary> {
    let library = match target {
        LibraryTarget::Path(path) => NativeLibrary::load(path),
        LibraryTarget::Name { name, search_paths } => NativeLibrary::load_by_name(name, search_paths),
    }
    .context("Failed to load native library")?;
    Ok(library)
}
