//! FFI Type System
//!
//! C-side types a declaration can name, and the parser that turns a
//! declaration like `double multiply(double, double);` into an [`FfiSignature`].

use std::fmt;
use std::os::raw::{c_char, c_long};
use std::str::FromStr;

use super::FfiError;

/// Scalar types supported for function parameters and return values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfiType {
    /// Void (no value)
    Void,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Any data pointer (platform-dependent width)
    Ptr,
}

impl FfiType {
    /// Get the size in bytes of this type
    pub fn size(&self) -> usize {
        match self {
            FfiType::Void => 0,
            FfiType::U8 | FfiType::I8 => 1,
            FfiType::U16 | FfiType::I16 => 2,
            FfiType::U32 | FfiType::I32 | FfiType::F32 => 4,
            FfiType::U64 | FfiType::I64 | FfiType::F64 => 8,
            FfiType::Ptr => std::mem::size_of::<usize>(),
        }
    }

    /// Check if this type is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FfiType::U8
                | FfiType::U16
                | FfiType::U32
                | FfiType::U64
                | FfiType::I8
                | FfiType::I16
                | FfiType::I32
                | FfiType::I64
        )
    }

    /// Check if this type is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, FfiType::F32 | FfiType::F64)
    }

    /// Check if this type is a pointer type
    pub fn is_pointer(&self) -> bool {
        matches!(self, FfiType::Ptr)
    }

    /// `long` follows the target's C ABI: 64-bit on LP64, 32-bit on LLP64
    fn c_long(signed: bool) -> Self {
        match (std::mem::size_of::<c_long>(), signed) {
            (8, true) => FfiType::I64,
            (8, false) => FfiType::U64,
            (_, true) => FfiType::I32,
            (_, false) => FfiType::U32,
        }
    }

    fn c_size() -> Self {
        if std::mem::size_of::<usize>() == 8 {
            FfiType::U64
        } else {
            FfiType::U32
        }
    }

    fn c_char() -> Self {
        if c_char::MIN == 0 {
            FfiType::U8
        } else {
            FfiType::I8
        }
    }
}

impl FromStr for FfiType {
    type Err = FfiError;

    /// Parse a C (or Rust-style shorthand) type spelling.
    ///
    /// `const`/`volatile` qualifiers are ignored. A spelling containing `*`
    /// is a pointer, provided the pointee is itself a known type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('*') {
            let pointee: String = s.chars().filter(|&c| c != '*').collect();
            pointee.parse::<FfiType>()?;
            return Ok(FfiType::Ptr);
        }

        let words: Vec<&str> = s
            .split_whitespace()
            .filter(|w| !matches!(*w, "const" | "volatile"))
            .collect();
        let normalized = words.join(" ");

        let ty = match normalized.as_str() {
            "void" => FfiType::Void,
            "char" => FfiType::c_char(),
            "signed char" | "int8_t" | "i8" => FfiType::I8,
            "unsigned char" | "uint8_t" | "u8" | "bool" | "_Bool" => FfiType::U8,
            "short" | "short int" | "signed short" | "signed short int" | "int16_t" | "i16" => {
                FfiType::I16
            }
            "unsigned short" | "unsigned short int" | "uint16_t" | "u16" => FfiType::U16,
            "int" | "signed" | "signed int" | "int32_t" | "i32" => FfiType::I32,
            "unsigned" | "unsigned int" | "uint32_t" | "u32" => FfiType::U32,
            "long" | "long int" | "signed long" | "signed long int" => FfiType::c_long(true),
            "unsigned long" | "unsigned long int" => FfiType::c_long(false),
            "long long" | "long long int" | "signed long long" | "int64_t" | "i64" => FfiType::I64,
            "unsigned long long" | "unsigned long long int" | "uint64_t" | "u64" => FfiType::U64,
            "size_t" | "uintptr_t" | "usize" => FfiType::c_size(),
            "float" | "f32" => FfiType::F32,
            "double" | "f64" => FfiType::F64,
            "" => return Err(FfiError::signature("missing type")),
            other => return Err(FfiError::signature(format!("unknown type '{}'", other))),
        };
        Ok(ty)
    }
}

impl fmt::Display for FfiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiType::Void => write!(f, "void"),
            FfiType::U8 => write!(f, "u8"),
            FfiType::U16 => write!(f, "u16"),
            FfiType::U32 => write!(f, "u32"),
            FfiType::U64 => write!(f, "u64"),
            FfiType::I8 => write!(f, "i8"),
            FfiType::I16 => write!(f, "i16"),
            FfiType::I32 => write!(f, "i32"),
            FfiType::I64 => write!(f, "i64"),
            FfiType::F32 => write!(f, "f32"),
            FfiType::F64 => write!(f, "f64"),
            FfiType::Ptr => write!(f, "ptr"),
        }
    }
}

/// Function signature for FFI calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiSignature {
    /// Function name
    pub name: String,
    /// Parameter types
    pub params: Vec<FfiType>,
    /// Return type
    pub return_type: FfiType,
    /// Whether this function is variadic
    pub variadic: bool,
}

impl FfiSignature {
    /// Create a new function signature
    pub fn new(name: impl Into<String>, params: Vec<FfiType>, return_type: FfiType) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            variadic: false,
        }
    }

    /// Create a variadic function signature
    pub fn variadic(name: impl Into<String>, params: Vec<FfiType>, return_type: FfiType) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            variadic: true,
        }
    }

    /// Whether this signature has exactly the given parameter and return types
    pub fn matches(&self, params: &[FfiType], return_type: FfiType) -> bool {
        !self.variadic && self.params == params && self.return_type == return_type
    }

    /// Parse a C-style declaration.
    ///
    /// Format: `return_type function_name(param1_type [name], ...);`. The
    /// trailing semicolon is optional, `(void)` means no parameters and `...`
    /// may end the parameter list.
    pub fn parse(declaration: &str) -> Result<Self, FfiError> {
        let text = declaration.trim();
        let text = text.strip_suffix(';').unwrap_or(text).trim_end();

        if text.is_empty() {
            return Err(FfiError::signature("empty declaration"));
        }

        let open = text
            .find('(')
            .ok_or_else(|| FfiError::signature(format!("missing '(' in '{}'", text)))?;
        let close = text
            .rfind(')')
            .ok_or_else(|| FfiError::signature(format!("missing ')' in '{}'", text)))?;
        if close < open {
            return Err(FfiError::signature(format!("unbalanced parentheses in '{}'", text)));
        }
        if close != text.len() - 1 {
            return Err(FfiError::signature(format!(
                "unexpected text after ')': '{}'",
                &text[close + 1..]
            )));
        }

        let head = text[..open].trim_end();
        let inner = &text[open + 1..close];
        if inner.contains(['(', ')']) {
            return Err(FfiError::signature(format!(
                "unexpected parenthesis in parameter list '{}'",
                inner
            )));
        }

        let (return_type_text, name) = split_trailing_identifier(head);
        if !is_identifier(name) {
            return Err(FfiError::signature(format!(
                "missing or invalid function name in '{}'",
                text
            )));
        }
        let return_type_text = return_type_text.trim();
        if return_type_text.is_empty() {
            return Err(FfiError::signature(format!("missing return type for '{}'", name)));
        }
        let return_type: FfiType = return_type_text.parse()?;

        let (params, variadic) = parse_params(inner)?;

        Ok(Self {
            name: name.to_string(),
            params,
            return_type,
            variadic,
        })
    }
}

/// Parse the text between the parentheses of a declaration
fn parse_params(inner: &str) -> Result<(Vec<FfiType>, bool), FfiError> {
    let inner = inner.trim();
    if inner.is_empty() || inner == "void" {
        return Ok((Vec::new(), false));
    }

    let pieces: Vec<&str> = inner.split(',').map(str::trim).collect();
    let mut params = Vec::with_capacity(pieces.len());
    let mut variadic = false;

    for (i, piece) in pieces.iter().enumerate() {
        if *piece == "..." {
            if i != pieces.len() - 1 {
                return Err(FfiError::signature("'...' must be the last parameter"));
            }
            if params.is_empty() {
                return Err(FfiError::signature("'...' needs at least one named parameter"));
            }
            variadic = true;
            continue;
        }
        let ty = parse_param(piece)?;
        if ty == FfiType::Void {
            return Err(FfiError::signature("'void' cannot be a parameter type"));
        }
        params.push(ty);
    }

    Ok((params, variadic))
}

/// A parameter is a type optionally followed by a name
fn parse_param(piece: &str) -> Result<FfiType, FfiError> {
    if piece.is_empty() {
        return Err(FfiError::signature("empty parameter"));
    }
    match piece.parse::<FfiType>() {
        Ok(ty) => Ok(ty),
        Err(err) => {
            let (ty, name) = split_trailing_identifier(piece);
            if !is_identifier(name) || ty.trim().is_empty() {
                return Err(err);
            }
            ty.parse()
        }
    }
}

/// Split `text` before its trailing run of identifier characters.
///
/// `"char *dup"` splits into `("char *", "dup")`. The split always lands on a
/// char boundary, whatever the input.
fn split_trailing_identifier(text: &str) -> (&str, &str) {
    let start = text
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    text.split_at(start)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for FfiSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        if self.variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

/// Render a returned double for display.
///
/// Shortest round-trip digits. Integral values keep a trailing `.0`
/// (`13.0`), exponents carry a sign and at least two digits (`1e+20`,
/// `1.5e-07`), NaN prints as `nan` and infinities as `inf`/`-inf`.
pub fn format_result(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    } else if value == f64::INFINITY {
        return "inf".to_string();
    } else if value == f64::NEG_INFINITY {
        return "-inf".to_string();
    }

    let shortest = format!("{:?}", value);
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => shortest,
    }
}
