//! Argument marshaling for C-style calls
//!
//! Helpers that turn identifiers into NUL-terminated strings and allocate
//! zeroed double buffers, for callers handing values across an FFI boundary
//! or reusing buffers between repeated evaluations.

use std::ffi::CString;
use std::fmt::Display;

use crate::Result;

/// Convert anything printable (a NAIF ID, a body name) to a `CString`
///
/// Fails if the text contains an interior NUL byte.
pub fn str_to_cstring(id: impl Display) -> Result<CString> {
    Ok(CString::new(id.to_string())?)
}

/// Zeroed storage for `n` doubles
pub fn empty_double_vector(n: usize) -> Vec<f64> {
    vec![0.0; n]
}

/// Copy `values` into freshly allocated double storage
pub fn to_double_vector(values: &[f64]) -> Vec<f64> {
    values.to_vec()
}
