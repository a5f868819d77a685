use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use strata_config::FsEntry;
use strata_result::{Error, Result};

use crate::uri::SplitUri;
use crate::{FileSystem, HttpFs, LocalFs, MemoryFs};

/// Constructs a [`FileSystem`] backend for a matched configuration entry.
///
/// The router calls the factory registered for an entry's protocol the first
/// time a location routes to it; results are cached per location string. This
/// is the seam for protocols whose clients live outside this workspace:
/// registering an `s3` factory makes `s3://` locations routable without this
/// crate knowing anything about object-store clients.
pub type FsFactory = Arc<dyn Fn(&FsEntry) -> Result<Arc<dyn FileSystem>> + Send + Sync>;

/// Score a filesystem entry against a parsed URI.
///
/// Zero means "cannot serve this URI"; among positive scores the highest
/// wins. Local, memory and https entries serve any URI of their protocol.
/// S3 entries distinguish AWS (`s3://bucket/key`, bucket in the authority)
/// from S3-compatible services (`s3://host:port/bucket/key`, bucket as the
/// first path segment): an exact bucket match outranks a protocol-only
/// match, and an S3-compatible entry is out of the running entirely when
/// its endpoint host differs from the URI authority.
pub fn match_score(entry: &FsEntry, uri: &SplitUri) -> i32 {
    match entry {
        FsEntry::File { .. } | FsEntry::Memory {} | FsEntry::Https {} => 1,
        FsEntry::S3 {
            bucket,
            endpoint_url: None,
            ..
        } => 1 + i32::from(bucket == &uri.host),
        FsEntry::S3 {
            bucket,
            endpoint_url: Some(endpoint),
            ..
        } => {
            if endpoint_host(endpoint) != uri.host {
                return 0;
            }
            let first_segment = uri.path.trim_start_matches('/').split('/').next().unwrap_or("");
            1 + i32::from(bucket == first_segment)
        }
    }
}

/// Authority portion of an endpoint URL, keeping any port.
fn endpoint_host(endpoint: &str) -> &str {
    let rest = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

/// Pick the filesystem entry serving `location`.
///
/// Candidates are the configured entries whose protocol equals the URI
/// scheme, scored by [`match_score`]; ties break toward the earliest declared
/// entry. When nothing is configured for a builtin protocol (`file`,
/// `memory`, `https`) a default entry is synthesized; `s3` has no sensible
/// default (it needs a bucket), so an unconfigured `s3` URI is
/// [`Error::NoFilesystemMatch`]. A scheme outside the known set is
/// [`Error::UnsupportedProtocol`].
pub fn match_uri(location: &str, filesystems: &[(String, FsEntry)]) -> Result<FsEntry> {
    let uri = SplitUri::parse(location)?;

    let mut best: Option<(i32, &FsEntry)> = None;
    let mut saw_protocol = false;
    for (_, entry) in filesystems {
        if entry.protocol() != uri.scheme {
            continue;
        }
        saw_protocol = true;
        let score = match_score(entry, &uri);
        if score > 0 && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, entry));
        }
    }
    if let Some((_, entry)) = best {
        return Ok(entry.clone());
    }
    if saw_protocol {
        return Err(Error::NoFilesystemMatch(location.to_string()));
    }

    match uri.scheme.as_str() {
        "file" => Ok(FsEntry::File { path: None }),
        "memory" => Ok(FsEntry::Memory {}),
        "https" => Ok(FsEntry::Https {}),
        "s3" => Err(Error::NoFilesystemMatch(location.to_string())),
        other => Err(Error::UnsupportedProtocol {
            protocol: other.to_string(),
            location: location.to_string(),
        }),
    }
}

/// Backend-native path for a URI under a matched entry.
///
/// - `file`: the URI path joined below the entry's configured root. The
///   authority must be empty (`file:///` form); host-relative file URIs were
///   already rejected during routing.
/// - `memory`: the authority folded into the key space (`/host/path`).
/// - `https`: the original URL unchanged; the backend consumes URLs.
/// - `s3` AWS: `bucket/key` assembled from authority plus path;
///   S3-compatible: the URI path already is `bucket/key`.
fn normalize_path(entry: &FsEntry, uri: &SplitUri, location: &str) -> String {
    match entry {
        FsEntry::File { path } => {
            let root = path
                .as_deref()
                .map_or_else(String::new, |p| p.to_string_lossy().trim_end_matches('/').to_string());
            let joined = format!("{root}/{}", uri.path.trim_matches('/'));
            match joined.trim_end_matches('/') {
                "" => "/".to_string(),
                other => other.to_string(),
            }
        }
        FsEntry::Memory {} => {
            let joined = format!("/{}/{}", uri.host, uri.path.trim_matches('/'));
            match joined.trim_end_matches('/') {
                "" => "/".to_string(),
                other => other.to_string(),
            }
        }
        FsEntry::Https {} => location.to_string(),
        FsEntry::S3 {
            endpoint_url: None, ..
        } => {
            let joined = format!("{}/{}", uri.host, uri.path.trim_matches('/'));
            joined.trim_end_matches('/').to_string()
        }
        FsEntry::S3 {
            endpoint_url: Some(_),
            ..
        } => uri.path.trim_matches('/').to_string(),
    }
}

/// Maps locations to `(filesystem, path)` pairs.
///
/// Routing is pure apart from backend construction: the router parses the
/// URI, scores the configured entries, normalizes the path, and asks the
/// protocol's [`FsFactory`] for a handle. No I/O touches the target store.
/// Routed results are memoized per location string; handles are stateless
/// clients, so sharing one across calls is safe.
pub struct FsRouter {
    filesystems: Vec<(String, FsEntry)>,
    factories: RwLock<FxHashMap<String, FsFactory>>,
    routed: RwLock<FxHashMap<String, (Arc<dyn FileSystem>, String)>>,
}

impl std::fmt::Debug for FsRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRouter")
            .field("filesystems", &self.filesystems)
            .finish_non_exhaustive()
    }
}

impl FsRouter {
    /// Create a router over configured entries, in declaration order.
    ///
    /// Builtin factories are pre-registered: `file` backends are rooted at
    /// the entry's configured path, `https` is the read-only HTTP client,
    /// and `memory` hands every location the same shared store so
    /// sequential operations through different routed handles observe each
    /// other.
    pub fn new(filesystems: Vec<(String, FsEntry)>) -> Self {
        let mut factories: FxHashMap<String, FsFactory> = FxHashMap::default();
        factories.insert(
            "file".to_string(),
            Arc::new(|entry: &FsEntry| {
                let root = match entry {
                    FsEntry::File { path: Some(p) } => p.clone(),
                    _ => "/".into(),
                };
                Ok(Arc::new(LocalFs::new(root)) as Arc<dyn FileSystem>)
            }),
        );
        let shared = MemoryFs::new();
        factories.insert(
            "memory".to_string(),
            Arc::new(move |_: &FsEntry| Ok(Arc::new(shared.clone()) as Arc<dyn FileSystem>)),
        );
        factories.insert(
            "https".to_string(),
            Arc::new(|_: &FsEntry| Ok(Arc::new(HttpFs::new()) as Arc<dyn FileSystem>)),
        );
        Self {
            filesystems,
            factories: RwLock::new(factories),
            routed: RwLock::new(FxHashMap::default()),
        }
    }

    /// Configured entries, in declaration order.
    pub fn filesystems(&self) -> &[(String, FsEntry)] {
        &self.filesystems
    }

    /// Register (or replace) the factory for a protocol.
    ///
    /// Replacing a factory drops the routed-location cache so stale handles
    /// from the previous factory cannot be served.
    pub fn register_factory(&self, protocol: impl Into<String>, factory: FsFactory) {
        self.factories
            .write()
            .expect("FsRouter factories lock poisoned")
            .insert(protocol.into(), factory);
        self.routed
            .write()
            .expect("FsRouter route cache lock poisoned")
            .clear();
    }

    /// Resolve `location` to a backend handle and a backend-native path.
    pub fn route(&self, location: &str) -> Result<(Arc<dyn FileSystem>, String)> {
        if let Some(hit) = self
            .routed
            .read()
            .expect("FsRouter route cache lock poisoned")
            .get(location)
        {
            return Ok(hit.clone());
        }

        let uri = SplitUri::parse(location)?;
        if uri.scheme == "file" && !uri.host.is_empty() {
            return Err(Error::invalid_argument(format!(
                "'file:' URIs must be absolute ('file:///...') but got '{location}'"
            )));
        }

        let entry = match_uri(location, &self.filesystems)?;
        let path = normalize_path(&entry, &uri, location);
        let factory = self
            .factories
            .read()
            .expect("FsRouter factories lock poisoned")
            .get(entry.protocol())
            .cloned()
            .ok_or_else(|| Error::UnsupportedProtocol {
                protocol: entry.protocol().to_string(),
                location: location.to_string(),
            })?;
        let fs = factory(&entry)?;
        tracing::debug!(
            location,
            protocol = entry.protocol(),
            path = path.as_str(),
            "routed location"
        );

        self.routed
            .write()
            .expect("FsRouter route cache lock poisoned")
            .insert(location.to_string(), (Arc::clone(&fs), path.clone()));
        Ok((fs, path))
    }
}
