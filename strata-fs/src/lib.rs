//! Synchronous filesystem abstraction for the strata dataset toolkit.
//!
//! Everything here is blocking: codecs and the catalog drive filesystems from
//! plain threads, so the trait surface is `std::io` readers and writers, not
//! futures.
//!
//! The crate has three parts:
//!
//! - [`FileSystem`]: the object-safe backend trait, with default
//!   implementations for the derived operations (`cat_file`, `pipe_file`,
//!   `get_file`, `put_file`, `exists`).
//! - Backends: [`LocalFs`] over `std::fs`, [`MemoryFs`] over a shared
//!   key-value map, and the read-only [`HttpFs`] over `reqwest::blocking`.
//! - Routing: [`SplitUri`] parsing plus [`FsRouter`], which scores configured
//!   filesystem entries against a URI and hands back a backend and a
//!   normalized path.

pub mod http;
pub mod local;
pub mod memory;
pub mod router;
pub mod uri;

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use bytes::Bytes;
use strata_result::Result;

pub use http::HttpFs;
pub use local::LocalFs;
pub use memory::MemoryFs;
pub use router::{match_score, match_uri, FsFactory, FsRouter};
pub use uri::SplitUri;

/// A single directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Backend path of the entry.
    pub path: String,
    pub is_dir: bool,
    /// File size in bytes; `None` for directories.
    pub size: Option<u64>,
}

/// Blocking filesystem backend.
///
/// Paths are backend-native strings produced by the router (absolute paths
/// for [`LocalFs`], key-space paths for [`MemoryFs`], full URLs for
/// [`HttpFs`]). Implementations must be safe to share across threads; the
/// catalog hands out one `Arc<dyn FileSystem>` per routed location.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Protocol this backend serves (`file`, `memory`, `https`, ...).
    fn protocol(&self) -> &str;

    /// Open a file for reading.
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Open a file for writing, truncating any existing content. Parent
    /// directories must already exist (`makedirs` is an explicit step).
    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>>;

    fn is_file(&self, path: &str) -> Result<bool>;

    fn is_dir(&self, path: &str) -> Result<bool>;

    /// List the immediate children of a directory, sorted by path.
    fn ls(&self, path: &str) -> Result<Vec<FileInfo>>;

    /// Recursively list all files under `path`, sorted. A file path lists as
    /// itself; a missing path lists as empty.
    fn find(&self, path: &str) -> Result<Vec<String>>;

    /// Create a directory and all missing parents. Succeeds if it already
    /// exists.
    fn makedirs(&self, path: &str) -> Result<()>;

    /// Remove a file, or a whole tree when `recursive` is set. Removing an
    /// absent path succeeds.
    fn rm(&self, path: &str, recursive: bool) -> Result<()>;

    /// Whether anything (file or directory) exists at `path`.
    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.is_file(path)? || self.is_dir(path)?)
    }

    /// Read a whole file into memory.
    fn cat_file(&self, path: &str) -> Result<Bytes> {
        let mut reader = self.open_read(path)?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf.into())
    }

    /// Write a whole buffer, replacing any existing file.
    fn pipe_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut writer = self.open_write(path)?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    /// Download a remote file to a local path.
    fn get_file(&self, remote: &str, local: &Path) -> Result<()> {
        let mut reader = self.open_read(remote)?;
        let mut file = std::fs::File::create(local)?;
        std::io::copy(&mut reader, &mut file)?;
        Ok(())
    }

    /// Upload a local file to a remote path.
    fn put_file(&self, local: &Path, remote: &str) -> Result<()> {
        let data = std::fs::read(local)?;
        self.pipe_file(remote, &data)
    }

    /// Rewrite `path` so it lands inside the staged shadow tree.
    ///
    /// The prefix is inserted at the backend's addressing root, so the
    /// staged tree mirrors the real one: a backend rooted at `/data` maps
    /// `/data/raw/x` to `/data/stage/raw/x`. The default implementation
    /// anchors at the path root.
    fn stage_path(&self, path: &str, prefix: &str) -> String {
        format!(
            "/{}/{}",
            prefix.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
