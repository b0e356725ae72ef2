//! `AttachDbFilename` expansion and the local-host rule that goes with it.

use std::path::Path;

use crate::error::{OptionsError, OptionsResult};
use crate::grammar::keys;

/// Placeholder replaced by the host's data directory.
pub const DATA_DIRECTORY_MACRO: &str = "|datadirectory|";

/// Expand a leading `|DataDirectory|` against `root`.
///
/// Returns `Ok(None)` when the value does not start with the macro. A missing
/// root expands as an empty one. The remainder may not climb above the root
/// with `..` segments.
///
/// ```rust
/// use std::path::Path;
/// use sqlfront_options::expand_data_directory;
///
/// let expanded = expand_data_directory("|DataDirectory|\\app.mdf", Some(Path::new("C:\\data"))).unwrap();
/// assert_eq!(expanded.as_deref(), Some("C:\\data\\app.mdf"));
/// assert!(expand_data_directory("|DataDirectory|/../x.mdf", Some(Path::new("/srv"))).is_err());
/// ```
pub fn expand_data_directory(value: &str, root: Option<&Path>) -> OptionsResult<Option<String>> {
    let Some(head) = value.get(..DATA_DIRECTORY_MACRO.len()) else {
        return Ok(None);
    };
    if !head.eq_ignore_ascii_case(DATA_DIRECTORY_MACRO) {
        return Ok(None);
    }

    let root = root.map(|r| r.to_string_lossy().into_owned()).unwrap_or_default();
    let separator = if root.contains('\\') && !root.contains('/') { '\\' } else { '/' };
    let remainder = &value[DATA_DIRECTORY_MACRO.len()..];

    let mut depth = 0usize;
    for segment in remainder.split(['\\', '/']) {
        match segment {
            "" | "." => {}
            ".." => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(OptionsError::invalid_value(keys::ATTACH_DB_FILENAME))?;
            }
            _ => depth += 1,
        }
    }

    let root_trimmed = root.trim_end_matches(['\\', '/']);
    let file = remainder.trim_start_matches(['\\', '/']);
    let mut expanded = String::with_capacity(root_trimmed.len() + file.len() + 1);
    expanded.push_str(root_trimmed);
    expanded.push(separator);
    expanded.push_str(file);
    Ok(Some(expanded))
}

/// Whether `host` names this machine.
///
/// Matches an empty host, `.`, `(local)`, the machine name and its first DNS
/// label, each optionally followed by `\instance`. Comparison ignores case.
pub fn is_local_host(host: &str, machine_name: &str) -> bool {
    if host.is_empty() {
        return true;
    }
    if names_host(host, ".") || names_host(host, "(local)") || names_host(host, machine_name) {
        return true;
    }
    match machine_name.find('.') {
        Some(pos) if pos > 0 => names_host(host, &machine_name[..pos]),
        _ => false,
    }
}

fn names_host(host: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if host.eq_ignore_ascii_case(name) {
        return true;
    }
    host.get(..name.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(name))
        && host[name.len()..].starts_with('\\')
}
