//! Default dictionary-root resolution.
//!
//! The cache core only needs a directory path, however the host determined
//! it. For hosts that do not carry their own configuration layer, this
//! module resolves a conventional default: the `PHONETIC_DICT_ROOT`
//! environment variable when set, otherwise a `data` directory under the
//! current working directory.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming the default dictionary root directory.
pub const DICT_ROOT_ENV: &str = "PHONETIC_DICT_ROOT";

/// Resolve the default dictionary root.
///
/// Order: [`DICT_ROOT_ENV`] if set, else `data` relative to the current
/// working directory. The path is not required to exist here; existence is
/// checked when a cache is constructed for it.
pub fn dict_root() -> PathBuf {
    dict_root_from(env::var_os(DICT_ROOT_ENV))
}

// Pure so the resolution is testable without mutating the process
// environment under parallel tests.
fn dict_root_from(override_root: Option<OsString>) -> PathBuf {
    override_root
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}
