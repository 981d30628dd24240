//! Loading dictionaries from disk or the bundled fallback.
//!
//! The loader is a stateless transform from bytes to a
//! [`DictionaryMapping`]: it reads `phonetic.dict` from a directory (or the
//! resource embedded by the `bundled-dict` feature when the directory has
//! none), parses the pipe-delimited records, and returns a fresh snapshot.
//! It touches no shared state, so a failed load never corrupts a mapping
//! that is already being served.
//!
//! # Record format
//!
//! ```text
//! title|bopomofo|bopomofo2|pinyin
//! ```
//!
//! One record per line, `|` separated with no escaping. Lines that do not
//! split into exactly 4 fields are skipped silently; a partially corrupt
//! dictionary still loads its well-formed remainder.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::dictionary::{DictionaryMapping, Explanation};
use crate::error::{DictError, Result};

/// File name looked up inside a dictionary directory.
pub const DICT_FILE_NAME: &str = "phonetic.dict";

/// Fallback dictionary compiled into the library.
#[cfg(feature = "bundled-dict")]
const BUNDLED_DICT: &str = include_str!("../../data/phonetic.dict");

/// Load the dictionary for `directory`.
///
/// Prefers `<directory>/phonetic.dict`; if the file does not exist, falls
/// back to the bundled resource. Fails with [`DictError::NotFound`] when
/// neither source is available, or [`DictError::Io`] /
/// [`DictError::Encoding`] when the file cannot be read as UTF-8 text.
///
/// Each call builds a self-contained mapping; nothing is cached here.
pub fn load_dict(directory: &Path) -> Result<DictionaryMapping> {
    let dict_file = directory.join(DICT_FILE_NAME);
    let text = if dict_file.is_file() {
        info!(path = %dict_file.display(), "loading phonetic dictionary");
        let bytes = fs::read(&dict_file)?;
        String::from_utf8(bytes).map_err(|_| DictError::Encoding { path: dict_file })?
    } else {
        bundled_dict(directory)?
    };

    let mapping = parse_records(&text);
    info!(
        keys = mapping.len(),
        dropped = mapping.dropped_lines(),
        "phonetic dictionary load complete"
    );
    Ok(mapping)
}

#[cfg(feature = "bundled-dict")]
fn bundled_dict(directory: &Path) -> Result<String> {
    info!(
        path = %directory.display(),
        "no dictionary file in directory, using bundled fallback"
    );
    Ok(BUNDLED_DICT.to_owned())
}

#[cfg(not(feature = "bundled-dict"))]
fn bundled_dict(directory: &Path) -> Result<String> {
    Err(DictError::NotFound(directory.to_owned()))
}

/// Parse record lines into a fresh mapping.
///
/// Malformed lines (field count != 4, including trailing-delimiter lines)
/// are dropped without aborting the rest of the load; only a counter on the
/// returned mapping records that they existed.
fn parse_records(text: &str) -> DictionaryMapping {
    let mut mapping = DictionaryMapping::default();
    for line in text.lines() {
        let mut fields = line.split('|');
        match (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) {
            (Some(key), Some(bopomofo), Some(bopomofo2), Some(pinyin), None) => {
                mapping.push(key, Explanation::new(bopomofo, bopomofo2, pinyin));
            }
            _ => mapping.record_dropped_line(),
        }
    }
    debug!(keys = mapping.len(), "parsed dictionary records");
    mapping
}
