//! Parsed dictionary records and the immutable mapping snapshot.
//!
//! A dictionary maps a word to one or more [`Explanation`] records, in the
//! order they appear in the source file. The whole mapping is built once by
//! the loader and never mutated afterwards; a reload produces a brand-new
//! [`DictionaryMapping`] and the cache swaps the reference.

pub mod loader;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// One parsed dictionary entry.
///
/// Records carry two auxiliary transcription fields plus the pinyin
/// pronunciation that lookups surface. Field names follow the source data,
/// which emits `title|bopomofo|bopomofo2|pinyin` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    bopomofo: String,
    bopomofo2: String,
    pinyin: String,
}

impl Explanation {
    /// Create an explanation from the three non-key fields of a record.
    pub fn new(
        bopomofo: impl Into<String>,
        bopomofo2: impl Into<String>,
        pinyin: impl Into<String>,
    ) -> Self {
        Self {
            bopomofo: bopomofo.into(),
            bopomofo2: bopomofo2.into(),
            pinyin: pinyin.into(),
        }
    }

    /// Bopomofo transcription (second field of the record).
    pub fn bopomofo(&self) -> &str {
        &self.bopomofo
    }

    /// Alternate bopomofo transcription (third field of the record).
    pub fn bopomofo2(&self) -> &str {
        &self.bopomofo2
    }

    /// Pinyin pronunciation (fourth field); this is what lookups return.
    pub fn pinyin(&self) -> &str {
        &self.pinyin
    }
}

/// Explanations for one key, in file order. Most keys have exactly one.
pub type Explanations = SmallVec<[Explanation; 1]>;

/// An immutable snapshot of one loaded dictionary generation.
///
/// Duplicate keys in the source file accumulate in the key's sequence;
/// [`DictionaryMapping::pronunciation`] surfaces only the first occurrence.
/// Once constructed a snapshot is never edited in place, so concurrent
/// readers holding a reference to an old generation stay consistent across
/// reloads.
#[derive(Debug, Default)]
pub struct DictionaryMapping {
    entries: FxHashMap<String, Explanations>,
    dropped_lines: usize,
}

impl DictionaryMapping {
    /// Append an explanation to `key`'s sequence, creating it if new.
    ///
    /// Only the loader calls this; after construction the mapping is
    /// read-only.
    pub(crate) fn push(&mut self, key: &str, explanation: Explanation) {
        match self.entries.get_mut(key) {
            Some(seq) => seq.push(explanation),
            None => {
                let mut seq = Explanations::new();
                seq.push(explanation);
                self.entries.insert(key.to_owned(), seq);
            }
        }
    }

    pub(crate) fn record_dropped_line(&mut self) {
        self.dropped_lines += 1;
    }

    /// All explanations recorded for `key`, in file order.
    pub fn explanations(&self, key: &str) -> Option<&[Explanation]> {
        self.entries.get(key).map(|seq| seq.as_slice())
    }

    /// Pronunciation of the first explanation recorded for `key`.
    ///
    /// Later duplicates for the same key are shadowed, never surfaced.
    pub fn pronunciation(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|seq| seq.first())
            .map(|e| e.pinyin())
    }

    /// Number of distinct keys in this snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of malformed source lines skipped while building this
    /// snapshot. Skipping is silent per line; this counter is the only
    /// observable trace.
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }
}
