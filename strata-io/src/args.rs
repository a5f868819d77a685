//! Reader/writer argument plumbing.
//!
//! Datasets carry three argument maps: `args` for both directions and
//! `read_args` / `write_args` overlaid per direction. Codecs declare which
//! keys they accept; everything else is dropped (and logged) before the
//! codec sees it, so one dataset entry can serve several formats without
//! each codec re-validating foreign keys.

use strata_config::ArgMap;
use tracing::debug;

/// Merge shared arguments with a per-direction overlay; the overlay wins
/// per key.
pub fn merge_args(shared: &ArgMap, overlay: &ArgMap) -> ArgMap {
    let mut merged = shared.clone();
    merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Keep only the keys in `accepted`, logging every dropped key at debug
/// level. `context` names the codec and direction (`"csv read"`).
pub fn filter_args(args: ArgMap, accepted: &[&str], context: &str) -> ArgMap {
    let (kept, dropped): (ArgMap, ArgMap) = args
        .into_iter()
        .partition(|(key, _)| accepted.contains(&key.as_str()));
    for key in dropped.keys() {
        debug!(key = key.as_str(), context, "dropping unsupported argument");
    }
    kept
}
