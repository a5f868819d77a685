use strata_result::{Error, Result};

/// A location URI split into scheme, authority and path.
///
/// Hand-rolled on purpose: dataset locations are plain
/// `scheme://host/path` strings and the routing layer needs exactly these
/// three pieces. `host` keeps any port (`localhost:9000`); `path` keeps its
/// leading slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitUri {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl SplitUri {
    /// Split `scheme://host/path`. Locations without an explicit scheme are
    /// rejected so a bare path can never silently land on the wrong backend.
    pub fn parse(location: &str) -> Result<Self> {
        let Some((scheme, rest)) = location.split_once("://") else {
            return Err(Error::invalid_argument(format!(
                "location '{location}' has no scheme; use an explicit URI such as 'file:///{}'",
                location.trim_start_matches('/')
            )));
        };
        if scheme.is_empty() {
            return Err(Error::invalid_argument(format!(
                "location '{location}' has an empty scheme"
            )));
        }
        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            path: path.to_string(),
        })
    }
}
