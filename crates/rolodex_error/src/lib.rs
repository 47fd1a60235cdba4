//! Error types for the Rolodex media vault.
//!
//! This crate provides the foundation error types used throughout the Rolodex workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use rolodex_error::{RolodexResult, HttpError};
//!
//! fn fetch_avatar() -> RolodexResult<Vec<u8>> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! assert!(fetch_avatar().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod http;
mod storage;
mod validation;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{RolodexError, RolodexErrorKind, RolodexResult};
pub use http::HttpError;
pub use storage::{StorageError, StorageErrorKind};
pub use validation::ValidationError;
