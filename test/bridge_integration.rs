//! Bridge Integration Tests
//!
//! Loads the reference library built from `native/mult.c` by build.rs and
//! exercises the declare -> load -> resolve -> call lifecycle against it.

use cbridge::ffi::{declare, format_result, FfiError, NativeLibrary};
use std::path::PathBuf;

type MultiplyFn = unsafe extern "C" fn(f64, f64) -> f64;

/// Path of the reference library, if build.rs managed to compile it
fn test_lib_path() -> Option<PathBuf> {
    let path = PathBuf::from(env!("CBRIDGE_TEST_LIB"));
    if path.as_os_str().is_empty() || !path.exists() {
        eprintln!("Reference library not built, skipping test");
        return None;
    }
    Some(path)
}

fn load() -> Option<NativeLibrary> {
    let path = test_lib_path()?;
    Some(NativeLibrary::load(&path).expect("Failed to load reference library"))
}

#[test]
fn test_load_library() {
    let Some(lib) = load() else { return };
    assert!(lib
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .contains("mult"));
    assert!(lib.has_symbol("multiply"));
    assert!(lib.has_symbol("add"));
    assert!(!lib.has_symbol("divide"));
}

#[test]
fn test_multiply_reference_values() {
    let Some(lib) = load() else { return };
    let sig = declare("double multiply(double, double);").unwrap();
    // Safety: native/mult.c defines `double multiply(double, double)`.
    let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap();

    assert_eq!(multiply.call(6.5, 2.0), 13.0);
    assert_eq!(format_result(multiply.call(6.5, 2.0)), "13.0");
    assert_eq!(multiply.signature().to_string(), "f64 multiply(f64, f64)");
}

#[test]
fn test_multiply_matches_rust_product() {
    let Some(lib) = load() else { return };
    let sig = declare("double multiply(double a, double b)").unwrap();
    // Safety: native/mult.c defines `double multiply(double, double)`.
    let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap();

    let samples = [
        (0.0, 0.0),
        (1.0, -1.0),
        (3.25, 4.5),
        (-7.125, 0.001),
        (1e150, 1e150),
        (1e-200, 1e-200),
        (f64::MAX, 0.5),
        (f64::MIN_POSITIVE, 2.0),
        (123456.789, 987.654321),
    ];
    for (a, b) in samples {
        let got = multiply.call(a, b);
        let want = a * b;
        let tolerance = want.abs() * f64::EPSILON;
        assert!(
            (got - want).abs() <= tolerance,
            "{} * {}: got {}, want {}",
            a,
            b,
            got,
            want
        );
    }
}

#[test]
fn test_repeated_calls_are_stable() {
    let Some(lib) = load() else { return };
    let sig = declare("double multiply(double, double);").unwrap();
    // Safety: native/mult.c defines `double multiply(double, double)`.
    let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap();

    let first = multiply.call(2.5, -3.5);
    for _ in 0..100 {
        assert_eq!(multiply.call(2.5, -3.5).to_bits(), first.to_bits());
    }
}

#[test]
fn test_non_finite_inputs_propagate() {
    let Some(lib) = load() else { return };
    let sig = declare("double multiply(double, double);").unwrap();
    // Safety: native/mult.c defines `double multiply(double, double)`.
    let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap();

    assert!(multiply.call(f64::NAN, 1.0).is_nan());
    assert_eq!(multiply.call(f64::INFINITY, 2.0), f64::INFINITY);
    assert_eq!(multiply.call(f64::NEG_INFINITY, 2.0), f64::NEG_INFINITY);
    assert!(multiply.call(f64::INFINITY, 0.0).is_nan());
    assert_eq!(format_result(multiply.call(f64::NAN, 1.0)), "nan");
}

#[test]
fn test_missing_symbol() {
    let Some(lib) = load() else { return };
    let sig = declare("double divide(double, double);").unwrap();
    // Safety: resolution fails before anything is called.
    let err = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap_err();
    match err {
        FfiError::SymbolNotFound { symbol, library, .. } => {
            assert_eq!(symbol, "divide");
            assert_eq!(library.as_path(), lib.path());
        }
        other => panic!("expected SymbolNotFound, got {:?}", other),
    }
}

#[test]
fn test_invalid_symbol_name() {
    let Some(lib) = load() else { return };
    let sig = declare("double multiply(double, double);").unwrap();
    // Safety: resolution fails before anything is called.
    let err = unsafe { lib.resolve_as::<MultiplyFn>("multi\0ply", &sig) }.unwrap_err();
    assert!(matches!(err, FfiError::InvalidSymbol(_)));
}

#[test]
fn test_declaration_mismatch_is_rejected() {
    let Some(lib) = load() else { return };

    for text in [
        "float multiply(float, float);",
        "double multiply(double);",
        "int multiply(double, double);",
        "double multiply(double, ...);",
    ] {
        let sig = declare(text).unwrap();
        // Safety: resolution fails before anything is called.
        let err = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap_err();
        assert!(
            matches!(err, FfiError::SignatureMismatch { .. }),
            "{}: {:?}",
            text,
            err
        );
    }
}

#[test]
fn test_resolve_under_another_name() {
    let Some(lib) = load() else { return };
    let sig = declare("double plus(double, double);").unwrap();
    // Safety: native/mult.c defines `double add(double, double)`.
    let add = unsafe { lib.resolve_as::<MultiplyFn>("add", &sig) }.unwrap();
    assert_eq!(add.call(6.5, 2.0), 8.5);
    assert_eq!(add.signature().name, "plus");
}

#[test]
fn test_load_by_name_from_search_path() {
    let Some(path) = test_lib_path() else { return };
    let dir = path.parent().unwrap().to_path_buf();

    let lib = NativeLibrary::load_by_name("mult", &[dir]).unwrap();
    assert!(lib.has_symbol("multiply"));
}

#[test]
fn test_concurrent_calls() {
    let Some(lib) = load() else { return };
    let sig = declare("double multiply(double, double);").unwrap();
    // Safety: native/mult.c defines `double multiply(double, double)`.
    let multiply = unsafe { lib.resolve::<MultiplyFn>(&sig) }.unwrap();

    std::thread::scope(|s| {
        for t in 0..8 {
            let multiply = &multiply;
            s.spawn(move || {
                for i in 0..1000 {
                    let a = (t * 1000 + i) as f64;
                    assert_eq!(multiply.call(a, 0.5), a * 0.5);
                }
            });
        }
    });
}

#[test]
fn test_explicit_close() {
    let Some(lib) = load() else { return };
    lib.close().unwrap();
}
