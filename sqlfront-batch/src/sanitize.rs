//! Parameter name validation and independent copies of parameter values.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BatchError, BatchResult};
use crate::parameter::{ParameterSnapshot, ParameterValue, SqlParameter};

/// Identifier grammar for batched parameter names.
pub const PARAMETER_NAME_PATTERN: &str =
    r"^@[\p{Lo}\p{Lu}\p{Ll}\p{Lm}_@#][\p{Lo}\p{Lu}\p{Ll}\p{Lm}\p{Nd}\x{FF3F}_@#\$]*$";

static PARAMETER_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(PARAMETER_NAME_PATTERN).ok());

/// Check a parameter name against the identifier grammar.
///
/// ```rust
/// use sqlfront_batch::is_valid_parameter_name;
///
/// assert!(is_valid_parameter_name("@_valid1"));
/// assert!(is_valid_parameter_name("@Größe"));
/// assert!(!is_valid_parameter_name("@1bad"));
/// assert!(!is_valid_parameter_name("@id; DROP TABLE t"));
/// ```
pub fn is_valid_parameter_name(name: &str) -> bool {
    PARAMETER_NAME
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
}

/// Copy the `offset`/`size` window of an array into fresh storage.
///
/// A zero `size` takes everything after `offset`. An offset past the end
/// yields an empty copy.
pub fn copy_window<T: Copy>(source: &[T], offset: usize, size: usize) -> Vec<T> {
    let remaining = source.len().saturating_sub(offset);
    let len = if size > 0 { size.min(remaining) } else { remaining };
    if len == 0 {
        return Vec::new();
    }
    source[offset..offset + len].to_vec()
}

/// Take an independent snapshot of `param` for batching.
///
/// Byte and character arrays are copied through [`copy_window`] and the
/// snapshot offset becomes zero. Cloneable values are copied with their own
/// clone. Shared values keep pointing at the caller's value.
pub fn sanitize(param: &SqlParameter) -> BatchResult<ParameterSnapshot> {
    if !is_valid_parameter_name(&param.name) {
        return Err(BatchError::InvalidParameterName(param.name.clone()));
    }

    let (value, offset) = match &param.value {
        ParameterValue::Bytes(bytes) => (
            ParameterValue::Bytes(copy_window(bytes, param.offset, param.size)),
            0,
        ),
        ParameterValue::Chars(chars) => (
            ParameterValue::Chars(copy_window(chars, param.offset, param.size)),
            0,
        ),
        other => (other.clone(), param.offset),
    };

    Ok(ParameterSnapshot {
        name: param.name.clone(),
        direction: param.direction,
        value,
        offset,
        size: param.size,
    })
}
