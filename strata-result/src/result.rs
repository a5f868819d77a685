use crate::error::Error;

/// Result type alias used throughout strata.
///
/// This is a type alias for `std::result::Result<T, Error>`, providing a
/// convenient shorthand for functions that return strata errors. All strata
/// operations that can fail should return this type.
pub type Result<T> = std::result::Result<T, Error>;
