use std::fmt;
use std::str::FromStr;

use strata_result::Error;

/// Serialization format of a dataset.
///
/// The format decides which codec handles reads and writes. `Excel` and
/// `Pickle` are modeled so existing configuration documents keep loading,
/// but no codec ships for them; dispatching either yields
/// [`Error::UnsupportedFormat`]. `Bytes` marks datasets that are opaque
/// byte streams rather than tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Parquet,
    /// Arrow IPC file, also known as Feather V2.
    Feather,
    Csv,
    Json,
    Excel,
    Pickle,
    Bytes,
}

impl Format {
    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Parquet => "parquet",
            Format::Feather => "feather",
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Excel => "excel",
            Format::Pickle => "pickle",
            Format::Bytes => "bytes",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "parquet" => Ok(Format::Parquet),
            "feather" | "arrow-ipc" => Ok(Format::Feather),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "excel" => Ok(Format::Excel),
            "pickle" => Ok(Format::Pickle),
            "bytes" => Ok(Format::Bytes),
            other => Err(Error::configuration(format!(
                "unknown dataset format '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_canonical_names() {
        for format in [
            Format::Parquet,
            Format::Feather,
            Format::Csv,
            Format::Json,
            Format::Excel,
            Format::Pickle,
            Format::Bytes,
        ] {
            assert_eq!(format.as_str().parse::<Format>().unwrap(), format);
        }
    }

    #[test]
    fn accepts_arrow_ipc_alias() {
        assert_eq!("arrow-ipc".parse::<Format>().unwrap(), Format::Feather);
    }

    #[test]
    fn unknown_format_is_a_configuration_error() {
        let err = "orc".parse::<Format>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("orc"));
    }

    #[test]
    fn defaults_to_parquet() {
        assert_eq!(Format::default(), Format::Parquet);
    }
}
