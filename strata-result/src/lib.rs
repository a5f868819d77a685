//! Error types and result definitions for the strata dataset toolkit.
//!
//! This crate provides the unified error type ([`Error`]) and result type alias
//! ([`Result<T>`]) used throughout all strata crates. All operations that could
//! fail return `Result<T>`, where the error variant carries enough context to
//! diagnose what went wrong without re-reading configuration.
//!
//! # Error Philosophy
//!
//! strata uses a single error enum ([`Error`]) rather than crate-specific error
//! types.
//!
//! This approach:
//! - Simplifies error handling across crate boundaries
//! - Allows errors to propagate naturally with the `?` operator
//! - Keeps validation failures (raised before any I/O happens) structurally
//!   distinguishable from engine and filesystem failures
//!
//! # Error Categories
//!
//! - **Resolution failures** ([`Error::DatasetNotFound`],
//!   [`Error::Configuration`]): missing dataset entries, illegal overrides
//! - **Validation failures** ([`Error::Partition`], [`Error::Location`]):
//!   partition prefix-rule violations, unresolvable location templates
//! - **Routing failures** ([`Error::UnsupportedProtocol`],
//!   [`Error::NoFilesystemMatch`], [`Error::UnsupportedFormat`]): no handler
//!   for a scheme, no configured filesystem, no codec for a format
//! - **Pass-through failures** ([`Error::Io`], [`Error::Arrow`],
//!   [`Error::Parquet`]): the underlying engine or filesystem error, unwrapped
//! - **Internal errors** ([`Error::Internal`]): bugs or unexpected states

pub mod error;
pub mod result;

pub use error::{DatasetId, Error};
pub use result::Result;
