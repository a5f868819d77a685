use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use strata_result::Result;

use crate::{FileInfo, FileSystem};

/// Shared in-memory filesystem.
///
/// Keys are normalized absolute paths; directories are implicit (a directory
/// exists when any key lives strictly under it), so `makedirs` is a no-op.
/// Clones share the same store, which is what routing relies on: a write
/// through one routed handle is visible to every later read.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    store: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

fn norm(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file: '{path}'"))
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.store.read().expect("MemoryFs store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buffered writer that publishes into the shared store.
///
/// The buffer is published on `flush` and again on drop, so both explicit
/// flushes and plain scope exits leave the file visible.
struct MemWriter {
    key: String,
    buf: Vec<u8>,
    store: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemWriter {
    fn publish(&self) {
        self.store
            .write()
            .expect("MemoryFs store lock poisoned")
            .insert(self.key.clone(), Bytes::from(self.buf.clone()));
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.publish();
        Ok(())
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        self.publish();
    }
}

impl FileSystem for MemoryFs {
    fn protocol(&self) -> &str {
        "memory"
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let key = norm(path);
        let store = self.store.read().expect("MemoryFs store lock poisoned");
        let bytes = store.get(&key).cloned().ok_or_else(|| not_found(path))?;
        Ok(Box::new(io::Cursor::new(bytes)))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>> {
        Ok(Box::new(MemWriter {
            key: norm(path),
            buf: Vec::new(),
            store: Arc::clone(&self.store),
        }))
    }

    fn is_file(&self, path: &str) -> Result<bool> {
        let key = norm(path);
        Ok(self
            .store
            .read()
            .expect("MemoryFs store lock poisoned")
            .contains_key(&key))
    }

    fn is_dir(&self, path: &str) -> Result<bool> {
        let key = norm(path);
        let prefix = if key == "/" { key.clone() } else { format!("{key}/") };
        let store = self.store.read().expect("MemoryFs store lock poisoned");
        Ok(store.range(prefix.clone()..).next().is_some_and(|(k, _)| {
            k.starts_with(&prefix)
        }))
    }

    fn ls(&self, path: &str) -> Result<Vec<FileInfo>> {
        let key = norm(path);
        let prefix = if key == "/" { key.clone() } else { format!("{key}/") };
        let store = self.store.read().expect("MemoryFs store lock poisoned");
        let mut out: Vec<FileInfo> = Vec::new();
        for (k, v) in store.range(prefix.clone()..) {
            let Some(rest) = k.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    let dir = format!("{prefix}{child}");
                    if out.last().map(|e| e.path.as_str()) != Some(dir.as_str()) {
                        out.push(FileInfo {
                            path: dir,
                            is_dir: true,
                            size: None,
                        });
                    }
                }
                None => out.push(FileInfo {
                    path: k.clone(),
                    is_dir: false,
                    size: Some(v.len() as u64),
                }),
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn find(&self, path: &str) -> Result<Vec<String>> {
        let key = norm(path);
        let store = self.store.read().expect("MemoryFs store lock poisoned");
        let mut out = Vec::new();
        if store.contains_key(&key) {
            out.push(key.clone());
        }
        let prefix = if key == "/" { key } else { format!("{key}/") };
        for (k, _) in store.range(prefix.clone()..) {
            if !k.starts_with(&prefix) {
                break;
            }
            out.push(k.clone());
        }
        Ok(out)
    }

    fn makedirs(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        let key = norm(path);
        let mut store = self.store.write().expect("MemoryFs store lock poisoned");
        store.remove(&key);
        if recursive {
            let prefix = if key == "/" { key } else { format!("{key}/") };
            let doomed: Vec<String> = store
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone())
                .collect();
            for k in doomed {
                store.remove(&k);
            }
        }
        Ok(())
    }

    fn pipe_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.store
            .write()
            .expect("MemoryFs store lock poisoned")
            .insert(norm(path), Bytes::copy_from_slice(data));
        Ok(())
    }

    // Zero-copy read: hand back the stored buffer instead of streaming it.
    fn cat_file(&self, path: &str) -> Result<Bytes> {
        let key = norm(path);
        self.store
            .read()
            .expect("MemoryFs store lock poisoned")
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(path).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_store() {
        let fs = MemoryFs::new();
        let other = fs.clone();
        fs.pipe_file("/a/b", b"1").unwrap();
        assert_eq!(other.cat_file("/a/b").unwrap().as_ref(), b"1");
    }

    #[test]
    fn open_write_publishes_on_drop() {
        let fs = MemoryFs::new();
        {
            let mut w = fs.open_write("/x/y").unwrap();
            w.write_all(b"late").unwrap();
        }
        assert_eq!(fs.cat_file("/x/y").unwrap().as_ref(), b"late");
    }

    #[test]
    fn directories_are_implicit() {
        let fs = MemoryFs::new();
        fs.pipe_file("/ds/l1=A/part-0.parquet", b"a").unwrap();
        assert!(fs.is_dir("/ds").unwrap());
        assert!(fs.is_dir("/ds/l1=A").unwrap());
        assert!(!fs.is_dir("/ds/l1=A/part-0.parquet").unwrap());
        assert!(fs.is_file("/ds/l1=A/part-0.parquet").unwrap());
        assert!(!fs.is_dir("/other").unwrap());
    }

    #[test]
    fn ls_lists_immediate_children_once() {
        let fs = MemoryFs::new();
        fs.pipe_file("/ds/l1=A/p0", b"a").unwrap();
        fs.pipe_file("/ds/l1=A/p1", b"b").unwrap();
        fs.pipe_file("/ds/top.txt", b"c").unwrap();
        let listing = fs.ls("/ds").unwrap();
        let paths: Vec<&str> = listing.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/ds/l1=A", "/ds/top.txt"]);
        assert!(listing[0].is_dir);
        assert_eq!(listing[1].size, Some(1));
    }

    #[test]
    fn find_returns_all_files_under_prefix() {
        let fs = MemoryFs::new();
        fs.pipe_file("/ds/l1=A/p0", b"a").unwrap();
        fs.pipe_file("/ds/l1=B/p0", b"b").unwrap();
        fs.pipe_file("/dskin/p0", b"c").unwrap();
        assert_eq!(fs.find("/ds").unwrap(), vec!["/ds/l1=A/p0", "/ds/l1=B/p0"]);
        assert_eq!(fs.find("/ds/l1=A/p0").unwrap(), vec!["/ds/l1=A/p0"]);
    }

    #[test]
    fn rm_recursive_clears_subtree_only() {
        let fs = MemoryFs::new();
        fs.pipe_file("/ds/l1=A/p0", b"a").unwrap();
        fs.pipe_file("/ds2/p0", b"b").unwrap();
        fs.rm("/ds", true).unwrap();
        assert!(!fs.exists("/ds").unwrap());
        assert!(fs.is_file("/ds2/p0").unwrap());
    }

    #[test]
    fn missing_file_read_is_not_found() {
        let fs = MemoryFs::new();
        let err = fs.cat_file("/absent").unwrap_err();
        match err {
            strata_result::Error::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("expected io error, got {other}"),
        }
    }
}
