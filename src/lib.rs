//! # phonetic-dict
//!
//! A file-backed phonetic dictionary cache with atomic hot-reload.
//!
//! The library loads pipe-delimited `phonetic.dict` files mapping a word to
//! one or more pronunciation explanations, keeps at most one cache per
//! canonical directory path, and lets a running host swap in new dictionary
//! contents without ever serving a torn or partial mapping. A failed reload
//! rolls back to the last good generation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use phonetic_dict::prelude::*;
//!
//! let registry = CacheRegistry::new();
//! let cache = registry.get_instance("/etc/phonetic")?;
//!
//! if let Some(pinyin) = cache.lookup("hao")? {
//!     println!("hao -> {}", pinyin);
//! }
//!
//! // Pick up edits to /etc/phonetic/phonetic.dict; the old mapping keeps
//! // serving concurrent readers until the swap, and stays in service if
//! // the reload fails.
//! cache.reload();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::cache::{CacheRegistry, PhoneticCache};
    pub use crate::config::dict_root;
    pub use crate::dictionary::loader::{load_dict, DICT_FILE_NAME};
    pub use crate::dictionary::{DictionaryMapping, Explanation, Explanations};
    pub use crate::error::{DictError, Result};
}
