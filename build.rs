//! Build script for the reference native library
//!
//! Compiles `native/mult.c` into a shared library with the host C compiler so
//! tests, benches and demos have a real `multiply` export to load. The path of
//! the produced library is exported as `CBRIDGE_TEST_LIB`. If no compiler is
//! available the variable is left empty and the tests that need it skip.

use std::env;
use std::path::{Path, PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let source = manifest_dir.join("native").join("mult.c");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", source.display());

    let library = out_dir.join(shared_library_filename("mult", &target_os));

    match build_shared_library(&source, &library, &target_os) {
        Ok(()) => {
            println!("cargo:rustc-env=CBRIDGE_TEST_LIB={}", library.display());
        }
        Err(reason) => {
            println!(
                "cargo:warning=Failed to build reference library {}: {}",
                library.display(),
                reason
            );
            println!("cargo:rustc-env=CBRIDGE_TEST_LIB=");
        }
    }
}

/// Compile a single C file into a shared library using the compiler `cc` picks
fn build_shared_library(source: &Path, output: &Path, target_os: &str) -> Result<(), String> {
    let compiler = cc::Build::new()
        .cargo_metadata(false)
        .try_get_compiler()
        .map_err(|e| e.to_string())?;

    let mut cmd = compiler.to_command();
    // MSVC drops .obj/.lib/.exp next to the working directory
    if let Some(dir) = output.parent() {
        cmd.current_dir(dir);
    }
    if compiler.is_like_msvc() {
        cmd.arg("/nologo")
            .arg("/LD")
            .arg(source)
            .arg(format!("/Fe{}", output.display()));
    } else {
        if target_os == "macos" || target_os == "ios" {
            cmd.arg("-dynamiclib");
        } else {
            cmd.arg("-shared");
        }
        cmd.args(["-fPIC", "-O2", "-o"]).arg(output).arg(source);
    }

    let status = cmd
        .status()
        .map_err(|e| format!("could not run {}: {}", compiler.path().display(), e))?;
    if !status.success() {
        return Err(format!("{} exited with {}", compiler.path().display(), status));
    }
    Ok(())
}

/// Platform library filename, mirrored from `ffi::library_filename`
fn shared_library_filename(name: &str, target_os: &str) -> String {
    match target_os {
        "windows" => format!("{}.dll", name),
        "macos" | "ios" => format!("lib{}.dylib", name),
        _ => format!("lib{}.so", name),
    }
}
