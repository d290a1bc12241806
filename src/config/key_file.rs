//! Flat `KEY=VALUE` key file lookup.
//!
//! The file holds one pair per line. Each line is split on its first `=` only,
//! so values may themselves contain `=`. Keys are compared exactly (no
//! trimming), the first matching line wins, and a line with nothing after the
//! `=` never matches.

use std::path::Path;

/// Reads `path` and returns the value stored under `key`.
///
/// Returns an empty string when the key is absent or the file cannot be read;
/// callers treat an empty value as "not configured".
pub fn read_key(path: impl AsRef<Path>, key: &str) -> String {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => lookup_key(&contents, key),
        Err(e) => {
            log::debug!("Could not read key file {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Looks `key` up in the text of a key file.
pub fn lookup_key(contents: &str, key: &str) -> String {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, v)| *k == key && !v.is_empty())
        .map(|(_, v)| v.to_string())
        .unwrap_or_default()
}
