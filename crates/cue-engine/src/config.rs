//! Engine configuration.

/// Dispatch wrappers reserved per stream.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Staging slots reserved per stream for a single cue window.
pub const DEFAULT_STAGING_CAPACITY: usize = 64;

/// Capacities reserved when a stream is created.
///
/// A stream whose windows stay within these never allocates while cueing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CueConfig {
    pub pool_capacity: usize,
    pub staging_capacity: usize,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            staging_capacity: DEFAULT_STAGING_CAPACITY,
        }
    }
}
