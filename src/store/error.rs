//! Object store error types.

use thiserror::Error;

/// Errors that can occur when reading from the object store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing is stored under the key
    #[error("No object registered with key {key}")]
    NotFound { key: String },

    /// An object is stored under the key, but of another type
    #[error("Object registered with key {key} is not of requested type {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}
