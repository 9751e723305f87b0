use serde::{Deserialize, Serialize};

/// Knobs for the local map/shuffle/reduce runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Number of reduce partitions the map output is hashed into.
    pub shuffle_partitions: usize,
    /// Scratch directory for shuffle partition files.
    pub shuffle_dir: String,
    /// Keep shuffle files after a successful run (debugging aid).
    pub keep_shuffle: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shuffle_partitions: 16,
            shuffle_dir: ".fmr_shuffle".to_string(),
            keep_shuffle: false,
        }
    }
}
