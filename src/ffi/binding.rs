//! Typed Bindings
//!
//! A resolved symbol is bound to a Rust `unsafe extern "C" fn(..) -> R`
//! pointer type. [`NativeFn`] reports the [`FfiType`]s that pointer type
//! implies, so a textual declaration can be checked against the binding
//! before the symbol is ever called. Argument count and types at the call
//! site are then enforced by the compiler.

use std::fmt;

use libloading::Symbol;

use super::{FfiSignature, FfiType};

mod sealed {
    pub trait Sealed {}
}

/// A Rust type with a fixed C ABI counterpart
pub trait CType: Copy + sealed::Sealed {
    /// The C-side type this Rust type marshals as
    const FFI_TYPE: FfiType;
}

macro_rules! impl_ctype {
    ($($ty:ty => $ffi:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl CType for $ty {
                const FFI_TYPE: FfiType = $ffi;
            }
        )*
    };
}

impl_ctype! {
    () => FfiType::Void,
    u8 => FfiType::U8,
    u16 => FfiType::U16,
    u32 => FfiType::U32,
    u64 => FfiType::U64,
    i8 => FfiType::I8,
    i16 => FfiType::I16,
    i32 => FfiType::I32,
    i64 => FfiType::I64,
    f32 => FfiType::F32,
    f64 => FfiType::F64,
}

#[cfg(target_pointer_width = "64")]
impl_ctype! {
    usize => FfiType::U64,
    isize => FfiType::I64,
}

#[cfg(target_pointer_width = "32")]
impl_ctype! {
    usize => FfiType::U32,
    isize => FfiType::I32,
}

impl<T> sealed::Sealed for *const T {}
impl<T> CType for *const T {
    const FFI_TYPE: FfiType = FfiType::Ptr;
}

impl<T> sealed::Sealed for *mut T {}
impl<T> CType for *mut T {
    const FFI_TYPE: FfiType = FfiType::Ptr;
}

/// A C-ABI function pointer type a symbol can be bound as
pub trait NativeFn: Copy + sealed::Sealed {
    /// Parameter types, in order
    fn param_types() -> Vec<FfiType>;
    /// Return type
    fn return_type() -> FfiType;

    /// Render the binding as a signature with the given name
    fn describe(name: &str) -> FfiSignature {
        FfiSignature::new(name, Self::param_types(), Self::return_type())
    }
}

/// A resolved native function, callable as `F`.
///
/// The proxy borrows the library it came from, so the library stays mapped
/// for as long as any proxy exists.
pub struct Proxy<'lib, F: NativeFn> {
    symbol: Symbol<'lib, F>,
    signature: FfiSignature,
}

impl<'lib, F: NativeFn> Proxy<'lib, F> {
    pub(crate) fn new(symbol: Symbol<'lib, F>, signature: FfiSignature) -> Self {
        Self { symbol, signature }
    }

    /// The declaration this proxy was resolved with
    pub fn signature(&self) -> &FfiSignature {
        &self.signature
    }
}

impl<F: NativeFn> fmt::Debug for Proxy<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

macro_rules! impl_native_fn {
    ($($arg:ident $val:ident),*) => {
        impl<R: CType, $($arg: CType),*> sealed::Sealed for unsafe extern "C" fn($($arg),*) -> R {}

        impl<R: CType, $($arg: CType),*> NativeFn for unsafe extern "C" fn($($arg),*) -> R {
            fn param_types() -> Vec<FfiType> {
                vec![$($arg::FFI_TYPE),*]
            }

            fn return_type() -> FfiType {
                R::FFI_TYPE
            }
        }

        impl<'lib, R: CType, $($arg: CType),*> Proxy<'lib, unsafe extern "C" fn($($arg),*) -> R> {
            /// Invoke the native function.
            ///
            /// Blocks the calling thread until the native side returns.
            pub fn call(&self, $($val: $arg),*) -> R {
                // SAFETY: `NativeLibrary::resolve` is unsafe and its caller
                // vouched that the symbol has exactly this type.
                unsafe { (*self.symbol)($($val),*) }
            }
        }
    };
}

impl_native_fn!();
impl_native_fn!(A a);
impl_native_fn!(A a, B b);
impl_native_fn!(A a, B b, C c);
impl_native_fn!(A a, B b, C c, D d);
impl_native_fn!(A a, B b, C c, D d, E e);
impl_native_fn!(A a, B b, C c, D d, E e, G g);
