use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

pub fn partition_path(job_id: u64, map_task: u64, partition: u32) -> String {
    format!("{job_id}/{map_task}/part-{partition}.jsonl")
}

pub fn map_task_dir(job_id: u64, map_task: u64) -> String {
    format!("{job_id}/{map_task}")
}

pub fn index_path(job_id: u64, map_task: u64) -> String {
    format!("{}/index.json", map_task_dir(job_id, map_task))
}

/// Route a key to its reduce partition.
///
/// Exact key equality is all the grouping contract needs, so any stable
/// hash works; every record of a key lands in one partition.
pub fn partition_for_key(key: &str, partitions: usize) -> u32 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partitions.max(1) as u64) as u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionMeta {
    pub partition: u32,
    pub file: String,
    pub records: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapTaskIndex {
    pub job_id: u64,
    pub map_task: u64,
    pub partitions: Vec<PartitionMeta>,
}
