use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use strata_result::Result;

use crate::{FileInfo, FileSystem};

/// Local filesystem backend over `std::fs`.
///
/// The router hands this backend absolute, root-joined paths; `root` is kept
/// so [`FileSystem::stage_path`] can anchor the staged shadow tree below the
/// configured root instead of at `/`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new("/")
    }
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn metadata_or_absent(path: &str) -> Result<Option<std::fs::Metadata>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl FileSystem for LocalFs {
    fn protocol(&self) -> &str {
        "file"
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>> {
        Ok(Box::new(std::fs::File::create(path)?))
    }

    fn is_file(&self, path: &str) -> Result<bool> {
        Ok(metadata_or_absent(path)?.is_some_and(|m| m.is_file()))
    }

    fn is_dir(&self, path: &str) -> Result<bool> {
        Ok(metadata_or_absent(path)?.is_some_and(|m| m.is_dir()))
    }

    fn ls(&self, path: &str) -> Result<Vec<FileInfo>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            out.push(FileInfo {
                path: entry.path().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: meta.is_file().then(|| meta.len()),
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn find(&self, path: &str) -> Result<Vec<String>> {
        if self.is_file(path)? {
            return Ok(vec![path.to_string()]);
        }
        if !self.is_dir(path)? {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut stack = vec![PathBuf::from(path)];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    stack.push(entry.path());
                } else {
                    out.push(entry.path().to_string_lossy().into_owned());
                }
            }
        }
        out.sort();
        Ok(out)
    }

    fn makedirs(&self, path: &str) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        let result = if recursive && self.is_dir(path)? {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn cat_file(&self, path: &str) -> Result<Bytes> {
        Ok(std::fs::read(path)?.into())
    }

    fn stage_path(&self, path: &str, prefix: &str) -> String {
        let root = self.root.to_string_lossy();
        let root = root.trim_end_matches('/');
        let rel = path.strip_prefix(root).unwrap_or(path);
        format!(
            "{root}/{}/{}",
            prefix.trim_matches('/'),
            rel.trim_start_matches('/')
        )
    }
}
