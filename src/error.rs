//! Error types for dictionary loading and cache operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a dictionary or using a cache.
#[derive(Debug, Error)]
pub enum DictError {
    /// Neither a directory-local dictionary file nor the bundled fallback
    /// is available.
    ///
    /// Fatal during construction: the caller gets no usable cache and the
    /// registry keeps no partially-initialized entry.
    #[error("no dictionary file in {0} and no bundled fallback")]
    NotFound(PathBuf),

    /// Reading the dictionary source failed.
    ///
    /// Fatal during construction; recovered with a rollback during reload.
    #[error("I/O error reading dictionary")]
    Io(#[from] std::io::Error),

    /// The dictionary file was not valid UTF-8.
    #[error("dictionary file {path} is not valid UTF-8")]
    Encoding {
        /// Path of the offending file.
        path: PathBuf,
    },

    /// The requested directory path could not be canonicalized.
    ///
    /// Canonical (absolute, symlink-free) paths are the identity keys of
    /// the registry, so a path that cannot be resolved cannot name an
    /// instance.
    #[error("cannot canonicalize dictionary path {path}")]
    Canonicalize {
        /// The path as given by the caller.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The cache instance was destroyed by eviction and must not be used.
    ///
    /// Obtain a fresh handle via `CacheRegistry::get_instance`.
    #[error("phonetic cache for {0} was destroyed")]
    InstanceDestroyed(PathBuf),
}

/// A specialized `Result` type for dictionary cache operations.
pub type Result<T> = std::result::Result<T, DictError>;
