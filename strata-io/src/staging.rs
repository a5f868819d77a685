use std::sync::{Arc, Mutex};

/// Environment toggle for staged reads and writes.
pub const STAGING_ENV: &str = "STRATA_STAGING";

/// Scoped staging overrides, innermost last.
///
/// The stack is shared by every clone of a catalog so a guard taken on one
/// handle governs them all.
#[derive(Debug, Default)]
pub(crate) struct StagingOverrides {
    stack: Mutex<Vec<bool>>,
}

impl StagingOverrides {
    /// The innermost override, if any guard is live.
    pub(crate) fn current(&self) -> Option<bool> {
        self.stack
            .lock()
            .expect("staging override stack lock poisoned")
            .last()
            .copied()
    }

    fn push(&self, on: bool) -> usize {
        let mut stack = self
            .stack
            .lock()
            .expect("staging override stack lock poisoned");
        let depth = stack.len();
        stack.push(on);
        depth
    }
}

/// Scoped staging override; reverts when dropped.
///
/// Guards nest: each one remembers the stack depth it was pushed at and
/// truncates back to it, so dropping an outer guard also clears anything an
/// inner scope left behind.
#[must_use = "staging reverts as soon as the guard drops"]
#[derive(Debug)]
pub struct StagingGuard {
    overrides: Arc<StagingOverrides>,
    depth: usize,
}

impl StagingGuard {
    pub(crate) fn new(overrides: Arc<StagingOverrides>, on: bool) -> Self {
        let depth = overrides.push(on);
        Self { overrides, depth }
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        self.overrides
            .stack
            .lock()
            .expect("staging override stack lock poisoned")
            .truncate(self.depth);
    }
}

/// The environment's staging verdict: `None` when [`STAGING_ENV`] is unset,
/// otherwise whether its value reads as true (`1`, `true`, `yes`,
/// case-insensitive).
pub(crate) fn env_staging() -> Option<bool> {
    let value = std::env::var(STAGING_ENV).ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    Some(matches!(normalized.as_str(), "1" | "true" | "yes"))
}
