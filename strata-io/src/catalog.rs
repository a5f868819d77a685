use std::io;
use std::sync::Arc;

use bytes::Bytes;
use strata_catalog::{render_location, resolve_dataset, Dataset, DatasetOptions};
use strata_config::ConfigSource;
use strata_fs::{FileSystem, FsRouter, SplitUri};
use strata_result::{Error, Result};
use tracing::{debug, info, warn};

use crate::args::{filter_args, merge_args};
use crate::codec::Dispatcher;
use crate::hive::relative_path;
use crate::staging::{env_staging, StagingGuard, StagingOverrides};
use crate::table::Table;

/// The data-access context: configuration, filesystem routing, format
/// dispatch and staging state behind one handle.
///
/// A `Catalog` is cheap to clone; clones share the router's backend cache
/// and the staging override stack, so a [`Catalog::use_staging`] guard taken
/// on one handle governs all of them.
///
/// Datasets are addressed logically throughout: every operation takes
/// `(layer, name)` plus [`DatasetOptions`] and resolves them freshly, so
/// nothing holds stale locations across configuration changes.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: Arc<dyn ConfigSource>,
    router: Arc<FsRouter>,
    dispatcher: Arc<Dispatcher>,
    staging: Arc<StagingOverrides>,
}

impl Catalog {
    /// A catalog over `config` with the built-in codecs and filesystems.
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        let router = Arc::new(FsRouter::new(config.filesystems()));
        Self {
            config,
            router,
            dispatcher: Arc::new(Dispatcher::with_defaults()),
            staging: Arc::default(),
        }
    }

    /// Replace the codec dispatcher (for protocol-specialized or custom
    /// codecs).
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    pub fn config(&self) -> &Arc<dyn ConfigSource> {
        &self.config
    }

    pub fn router(&self) -> &FsRouter {
        &self.router
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Resolve `(layer, name)` plus overrides into a dataset descriptor.
    pub fn dataset(&self, layer: &str, name: &str, options: DatasetOptions) -> Result<Dataset> {
        resolve_dataset(self.config.as_ref(), layer, name, options)
    }

    /// The dataset's rendered location URI.
    pub fn location(&self, ds: &Dataset) -> Result<String> {
        render_location(ds)
    }

    /// Route the dataset to its backend and plain path.
    pub fn fs_path(&self, ds: &Dataset) -> Result<(Arc<dyn FileSystem>, String)> {
        let location = render_location(ds)?;
        self.router.route(&location)
    }

    /// Route the dataset to its backend and staged shadow path.
    pub fn fs_path_staged(&self, ds: &Dataset) -> Result<(Arc<dyn FileSystem>, String)> {
        let (fs, path) = self.fs_path(ds)?;
        let staged = fs.stage_path(&path, &self.config.staging().prefix);
        Ok((fs, staged))
    }

    /// The path writes should target: staged when staging is enabled,
    /// plain otherwise.
    pub fn writer_path(&self, ds: &Dataset) -> Result<(Arc<dyn FileSystem>, String)> {
        if self.is_staging_enabled() {
            self.fs_path_staged(ds)
        } else {
            self.fs_path(ds)
        }
    }

    /// The path reads should come from: the staged path when staging is
    /// enabled and something exists there, otherwise the plain path.
    /// Removing a staged tree reverts readers to production data.
    pub fn reader_path(&self, ds: &Dataset) -> Result<(Arc<dyn FileSystem>, String)> {
        if self.is_staging_enabled() {
            let (fs, staged) = self.fs_path_staged(ds)?;
            if fs.exists(&staged)? {
                return Ok((fs, staged));
            }
            debug!(
                path = staged.as_str(),
                "staged path absent, reading the plain path"
            );
        }
        self.fs_path(ds)
    }

    /// Whether staging indirection currently applies, re-evaluated on every
    /// call: innermost [`Catalog::use_staging`] guard, else the
    /// [`crate::staging::STAGING_ENV`] environment variable, else the
    /// configured default.
    pub fn is_staging_enabled(&self) -> bool {
        if let Some(on) = self.staging.current() {
            return on;
        }
        if let Some(on) = env_staging() {
            return on;
        }
        self.config.staging().enabled
    }

    /// Force staging on or off for the guard's lifetime. Guards nest; the
    /// innermost wins.
    pub fn use_staging(&self, on: bool) -> StagingGuard {
        StagingGuard::new(self.staging.clone(), on)
    }

    /// Read a dataset into a table.
    pub fn read_table(&self, layer: &str, name: &str, options: DatasetOptions) -> Result<Table> {
        let ds = self.dataset(layer, name, options)?;
        self.read_table_from(&ds)
    }

    /// Read an already resolved dataset into a table.
    pub fn read_table_from(&self, ds: &Dataset) -> Result<Table> {
        let location = render_location(ds)?;
        info!("reading dataset {}.{} from {}", ds.layer, ds.name, location);
        let codec = self
            .dispatcher
            .codec(ds.format, &self.protocol_of(ds, &location)?)?;
        let (fs, path) = self.reader_path(ds)?;
        let args = filter_args(
            merge_args(&ds.args, &ds.read_args),
            codec.read_args(),
            &format!("{} read", ds.format),
        );
        codec.read(fs.as_ref(), &path, ds, &args)
    }

    /// Write a table to a dataset.
    pub fn write_table(
        &self,
        table: &Table,
        layer: &str,
        name: &str,
        options: DatasetOptions,
    ) -> Result<()> {
        let ds = self.dataset(layer, name, options)?;
        self.write_table_to(table, &ds)
    }

    /// Write a table to an already resolved dataset.
    pub fn write_table_to(&self, table: &Table, ds: &Dataset) -> Result<()> {
        let location = render_location(ds)?;
        info!("writing dataset {}.{} to {}", ds.layer, ds.name, location);
        let codec = self
            .dispatcher
            .codec(ds.format, &self.protocol_of(ds, &location)?)?;
        let (fs, path) = self.writer_path(ds)?;
        let args = filter_args(
            merge_args(&ds.args, &ds.write_args),
            codec.write_args(),
            &format!("{} write", ds.format),
        );
        if let Some(parent) = parent_of(&path) {
            fs.makedirs(parent)?;
        }
        codec.write(table, fs.as_ref(), &path, ds, &args)
    }

    /// Read a dataset as an opaque byte stream, whatever its format.
    pub fn read_bytes(&self, layer: &str, name: &str, options: DatasetOptions) -> Result<Bytes> {
        let ds = self.dataset(layer, name, options)?;
        if ds.columns.is_some() {
            return Err(Error::invalid_argument(
                "byte-level reads cannot apply a column projection",
            ));
        }
        let location = render_location(&ds)?;
        info!("reading dataset {}.{} from {}", ds.layer, ds.name, location);
        let (fs, path) = self.reader_path(&ds)?;
        fs.cat_file(&path)
    }

    /// Write a dataset as an opaque byte stream, whatever its format.
    pub fn write_bytes(
        &self,
        data: &[u8],
        layer: &str,
        name: &str,
        options: DatasetOptions,
    ) -> Result<()> {
        let ds = self.dataset(layer, name, options)?;
        let location = render_location(&ds)?;
        info!("writing dataset {}.{} to {}", ds.layer, ds.name, location);
        let (fs, path) = self.writer_path(&ds)?;
        if let Some(parent) = parent_of(&path) {
            fs.makedirs(parent)?;
        }
        fs.pipe_file(&path, data)
    }

    /// The distinct partition value combinations present in a dataset,
    /// filtered by whatever partitions the options pin.
    pub fn list_partitions(
        &self,
        layer: &str,
        name: &str,
        options: DatasetOptions,
    ) -> Result<Table> {
        let ds = self.dataset(layer, name, options)?;
        if ds.partition_by.is_empty() {
            return Err(Error::invalid_argument(format!(
                "dataset '{ds}' is not partitioned"
            )));
        }
        let projected = Dataset {
            columns: Some(ds.partition_by.clone()),
            ..ds
        };
        self.read_table_from(&projected)?.distinct()
    }

    /// Copy a dataset to another dataset.
    ///
    /// Matching formats copy byte-for-byte through a local scratch
    /// directory. Mismatched formats fall back to a read-then-write round
    /// trip through the table layer, which transcodes but loses any
    /// format-specific layout.
    pub fn copy(
        &self,
        src_layer: &str,
        src_name: &str,
        src_options: DatasetOptions,
        dst_layer: &str,
        dst_name: &str,
        dst_options: DatasetOptions,
    ) -> Result<()> {
        let src = self.dataset(src_layer, src_name, src_options)?;
        let dst = self.dataset(dst_layer, dst_name, dst_options)?;
        self.copy_datasets(&src, &dst)
    }

    /// Copy between two already resolved datasets.
    pub fn copy_datasets(&self, src: &Dataset, dst: &Dataset) -> Result<()> {
        if src.format != dst.format {
            warn!(
                "copying dataset {src} ({}) to {dst} ({}) across formats via a table round-trip",
                src.format, dst.format
            );
            let table = self.read_table_from(src)?;
            return self.write_table_to(&table, dst);
        }

        info!("copying dataset {src} to {dst}");
        let (src_fs, src_path) = self.reader_path(src)?;
        let (dst_fs, dst_path) = self.writer_path(dst)?;
        let scratch = tempfile::tempdir()?;
        let transfer = scratch.path().join("transfer");

        if src_fs.is_file(&src_path)? {
            src_fs.get_file(&src_path, &transfer)?;
            if let Some(parent) = parent_of(&dst_path) {
                dst_fs.makedirs(parent)?;
            }
            return dst_fs.put_file(&transfer, &dst_path);
        }
        if !src_fs.is_dir(&src_path)? {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("copy source '{src_path}' does not exist"),
            )));
        }
        for file in src_fs.find(&src_path)? {
            let relative = relative_path(&src_path, &file);
            let remote = format!("{dst_path}/{relative}");
            src_fs.get_file(&file, &transfer)?;
            if let Some(parent) = parent_of(&remote) {
                dst_fs.makedirs(parent)?;
            }
            dst_fs.put_file(&transfer, &remote)?;
        }
        Ok(())
    }

    fn protocol_of(&self, ds: &Dataset, location: &str) -> Result<String> {
        match &ds.protocol {
            Some(protocol) => Ok(protocol.clone()),
            None => Ok(SplitUri::parse(location)?.scheme),
        }
    }
}

/// Everything before the final path segment; `None` at the addressing root.
fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    (idx > 0).then(|| &trimmed[..idx])
}
