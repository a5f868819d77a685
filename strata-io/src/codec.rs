use std::fmt;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use strata_catalog::{Dataset, Format};
use strata_config::ArgMap;
use strata_fs::FileSystem;
use strata_result::{Error, Result};

use crate::codecs::{CsvCodec, FeatherCodec, JsonCodec, ParquetCodec};
use crate::table::Table;

/// A format engine: reads tables off a filesystem and writes them back.
///
/// `path` is always the backend-native path produced by the router, staged
/// or plain. Codecs receive only arguments whose keys appear in their
/// `read_args` / `write_args` tables; the caller filters the rest out.
pub trait TableCodec: Send + Sync + fmt::Debug {
    /// The format this codec serves.
    fn format(&self) -> Format;

    /// Argument keys the reader accepts.
    fn read_args(&self) -> &'static [&'static str];

    /// Argument keys the writer accepts.
    fn write_args(&self) -> &'static [&'static str];

    fn read(&self, fs: &dyn FileSystem, path: &str, ds: &Dataset, args: &ArgMap)
        -> Result<Table>;

    fn write(
        &self,
        table: &Table,
        fs: &dyn FileSystem,
        path: &str,
        ds: &Dataset,
        args: &ArgMap,
    ) -> Result<()>;
}

/// Routing table from `(format, protocol)` to a codec.
///
/// Lookup tries the exact `(format, Some(protocol))` entry first, then the
/// protocol-agnostic `(format, None)` entry. Protocol-specialized codecs can
/// be registered at runtime and shadow the default for that protocol only.
pub struct Dispatcher {
    codecs: RwLock<FxHashMap<(Format, Option<String>), Arc<dyn TableCodec>>>,
}

impl Dispatcher {
    /// An empty dispatcher with no codecs registered.
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(FxHashMap::default()),
        }
    }

    /// A dispatcher with the built-in codecs registered protocol-agnostic:
    /// parquet, feather, csv and json. `excel`, `pickle` and `bytes` have
    /// no table codec and dispatch to [`Error::UnsupportedFormat`].
    pub fn with_defaults() -> Self {
        let dispatcher = Self::new();
        dispatcher.register(None, Arc::new(ParquetCodec));
        dispatcher.register(None, Arc::new(FeatherCodec));
        dispatcher.register(None, Arc::new(CsvCodec));
        dispatcher.register(None, Arc::new(JsonCodec));
        dispatcher
    }

    /// Register `codec` for its format, either protocol-agnostic (`None`) or
    /// specialized to one protocol. Replaces any previous registration for
    /// the same slot.
    pub fn register(&self, protocol: Option<&str>, codec: Arc<dyn TableCodec>) {
        self.codecs
            .write()
            .expect("Dispatcher codec table lock poisoned")
            .insert((codec.format(), protocol.map(str::to_string)), codec);
    }

    /// The codec serving `format` over `protocol`.
    pub fn codec(&self, format: Format, protocol: &str) -> Result<Arc<dyn TableCodec>> {
        let codecs = self
            .codecs
            .read()
            .expect("Dispatcher codec table lock poisoned");
        codecs
            .get(&(format, Some(protocol.to_string())))
            .or_else(|| codecs.get(&(format, None)))
            .cloned()
            .ok_or_else(|| Error::UnsupportedFormat {
                format: format.to_string(),
                protocol: protocol.to_string(),
            })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codecs = self
            .codecs
            .read()
            .expect("Dispatcher codec table lock poisoned");
        let mut slots: Vec<String> = codecs
            .keys()
            .map(|(format, protocol)| match protocol {
                Some(protocol) => format!("{format}@{protocol}"),
                None => format.to_string(),
            })
            .collect();
        slots.sort();
        f.debug_struct("Dispatcher").field("codecs", &slots).finish()
    }
}
