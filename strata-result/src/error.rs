use std::{fmt, io};
use thiserror::Error;

/// Identifying slice of a dataset descriptor attached to partition errors.
///
/// Partition validation happens deep inside resolution, far from the caller
/// that supplied the offending values. Carrying the layer/name pair plus the
/// declared partition order and the pinned values lets error handlers report
/// exactly which dataset was mis-addressed without re-resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetId {
    /// Lifecycle layer the dataset belongs to (`raw`, `clean`, ...).
    pub layer: String,
    /// Dataset name within the layer.
    pub name: String,
    /// Declared partition columns, in order.
    pub partition_by: Vec<String>,
    /// Pinned partition values, in `partition_by` order.
    pub partitions: Vec<(String, String)>,
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer, self.name)
    }
}

/// Unified error type for all strata operations.
///
/// This enum spans the full stack, from dataset resolution to format codecs.
/// Validation errors (resolution, partitions, templates, routing) are raised
/// before any I/O is attempted; engine and filesystem failures pass through
/// untranslated via the `#[from]` variants.
///
/// # Error Handling Strategy
///
/// Errors propagate upward through the call stack using Rust's `?` operator.
/// Internal code can match on specific variants for fine-grained handling;
/// the `Display` output is written for end users of a data pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// No configuration entry exists for the requested dataset.
    ///
    /// Raised when neither a concrete `(layer, name)` entry nor a `_dynamic`
    /// entry for the layer exists. Layers that declare a `_dynamic` entry
    /// accept any name; layers that do not are closed sets.
    #[error(
        "dataset '{layer}.{name}' not found and layer '{layer}' does not allow dynamic datasets"
    )]
    DatasetNotFound { layer: String, name: String },

    /// Invalid configuration or an illegal override.
    ///
    /// This covers attempts to override a dataset's location, format
    /// overrides on statically configured datasets, unknown format names,
    /// and malformed configuration documents. The message states what was
    /// rejected and what to use instead.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Pinned partition values violate the declared partition order.
    ///
    /// Partition keys must pin a contiguous prefix of `partition_by`: for
    /// `[a, b, c]` the valid pin-sets are `{}`, `{a}`, `{a, b}` and
    /// `{a, b, c}`. The offending descriptor travels with the error.
    #[error("partition error for dataset '{dataset}': {message}")]
    Partition {
        message: String,
        dataset: Box<DatasetId>,
    },

    /// A location template references a parameter that is not available.
    ///
    /// The interpolation context is the descriptor's own fields overlaid by
    /// its `params` map; anything else is a configuration mistake. Both the
    /// missing placeholder and the full template are reported.
    #[error("location template '{template}' references undefined parameter '{placeholder}'")]
    Location {
        placeholder: String,
        template: String,
    },

    /// URI scheme with no registered filesystem handler.
    #[error("protocol '{protocol}' is not supported (location '{location}')")]
    UnsupportedProtocol { protocol: String, location: String },

    /// The URI's protocol is known, but no configured filesystem entry
    /// matches it with a positive score.
    #[error("no filesystem configuration matches URI '{0}'")]
    NoFilesystemMatch(String),

    /// No codec is registered for the format/protocol combination.
    ///
    /// `excel` and `pickle` are modeled formats without in-tree codecs and
    /// always land here; other formats land here only when a caller removes
    /// their default registration.
    #[error("no codec registered for format '{format}' over protocol '{protocol}'")]
    UnsupportedFormat { format: String, protocol: String },

    /// Invalid user input or API parameter.
    ///
    /// Malformed URIs (missing scheme, `file:` without `file:///`), argument
    /// values of the wrong type, single-file operations aimed at
    /// directories. These errors are recoverable: fix the input and retry.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error during file or filesystem operations.
    ///
    /// Wraps standard library I/O errors from any filesystem backend. The
    /// underlying `io::Error` retains the original failure detail
    /// (not found, permission denied, disk full, ...).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow library error during columnar data operations.
    ///
    /// Serialization, schema mismatches during concatenation, CSV/JSON/IPC
    /// reader failures. Arrow is the columnar interchange format for every
    /// codec, so these errors surface format-level incompatibilities.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet library error while encoding or decoding parquet files.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never occur during normal operation. The message includes
    /// details about which invariant was violated.
    #[error("an internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error from any displayable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_result::Error;
    ///
    /// let err = Error::configuration("unknown dataset format 'orc'");
    /// assert!(matches!(err, Error::Configuration(msg) if msg.contains("orc")));
    /// ```
    #[inline]
    pub fn configuration<E: fmt::Display>(err: E) -> Self {
        Error::Configuration(err.to_string())
    }

    /// Create an invalid-argument error from any displayable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_result::Error;
    ///
    /// fn parse_batch_size(input: &str) -> Result<usize, Error> {
    ///     input.parse::<usize>().map_err(Error::invalid_argument)
    /// }
    ///
    /// assert_eq!(parse_batch_size("1024").unwrap(), 1024);
    /// assert!(matches!(
    ///     parse_batch_size("lots"),
    ///     Err(Error::InvalidArgument(_))
    /// ));
    /// ```
    #[inline]
    pub fn invalid_argument<E: fmt::Display>(err: E) -> Self {
        Error::InvalidArgument(err.to_string())
    }

    /// Create an internal error from any displayable value.
    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
