//! Job compositions and the local map/shuffle/reduce runtime.
//!
//! Architecture role:
//! - [`engine`]: builders that assemble the flat job parameter map for each
//!   relational operation and wire the matching mapper/reducer pair
//! - [`runtime`]: shard discovery, the parallel per-record phase, the
//!   grouping boundary, and the parallel per-key phase

pub mod engine;
pub mod runtime;

pub use engine::{Engine, InterlaceMember, JoinJob, JoinSide, SelectJob};
pub use fmr_mapreduce::JoinMode;
pub use runtime::{discover_shards, run_job, JobSummary};
