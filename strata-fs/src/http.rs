use std::io::{Read, Write};

use strata_result::{Error, Result};

use crate::{FileInfo, FileSystem};

/// Read-only HTTP(S) backend.
///
/// Paths are full URLs; `open_read` issues a GET and streams the response
/// body, `is_file` probes with a HEAD request. Mutating operations and
/// listings fail: HTTP sources feed raw ingestion, nothing writes back
/// through them.
#[derive(Debug)]
pub struct HttpFs {
    client: reqwest::blocking::Client,
}

impl Default for HttpFs {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFs {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    Error::Io(std::io::Error::other(err))
}

fn read_only(op: &str) -> Error {
    Error::invalid_argument(format!("https filesystem is read-only ({op} not supported)"))
}

impl FileSystem for HttpFs {
    fn protocol(&self) -> &str {
        "https"
    }

    fn open_read(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;
        Ok(Box::new(response))
    }

    fn open_write(&self, _url: &str) -> Result<Box<dyn Write + Send>> {
        Err(read_only("open_write"))
    }

    fn is_file(&self, url: &str) -> Result<bool> {
        let response = self.client.head(url).send().map_err(transport_error)?;
        Ok(response.status().is_success())
    }

    fn is_dir(&self, _url: &str) -> Result<bool> {
        Ok(false)
    }

    fn ls(&self, _url: &str) -> Result<Vec<FileInfo>> {
        Err(Error::invalid_argument(
            "https filesystem does not support listing",
        ))
    }

    fn find(&self, _url: &str) -> Result<Vec<String>> {
        Err(Error::invalid_argument(
            "https filesystem does not support listing",
        ))
    }

    fn makedirs(&self, _url: &str) -> Result<()> {
        Err(read_only("makedirs"))
    }

    fn rm(&self, _url: &str, _recursive: bool) -> Result<()> {
        Err(read_only("rm"))
    }

    fn put_file(&self, _local: &std::path::Path, _url: &str) -> Result<()> {
        Err(read_only("put_file"))
    }
}
