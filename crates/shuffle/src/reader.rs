use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use fmr_common::{FmrError, Result};
use fmr_mapreduce::{KeyedRecord, RecordValue};

use crate::layout::{index_path, partition_path, MapTaskIndex};

pub struct ShuffleReader {
    root_dir: PathBuf,
}

impl ShuffleReader {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn read_map_task_index(&self, job_id: u64, map_task: u64) -> Result<MapTaskIndex> {
        let bytes = fs::read(self.root_dir.join(index_path(job_id, map_task)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FmrError::Execution(format!("index json decode failed: {e}")))
    }

    /// Records one map task wrote for one partition.
    ///
    /// A missing file means the task emitted nothing for this partition,
    /// which is a legitimate outcome, not an error.
    pub fn read_partition(
        &self,
        job_id: u64,
        map_task: u64,
        partition: u32,
    ) -> Result<Vec<KeyedRecord>> {
        let abs = self.root_dir.join(partition_path(job_id, map_task, partition));
        if !abs.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&abs)?;
        content
            .lines()
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    FmrError::Execution(format!("shuffle record decode failed: {e}"))
                })
            })
            .collect()
    }

    /// Gather one partition across all map tasks and group by exact key.
    ///
    /// This is the platform guarantee the per-key phase depends on: every
    /// value sharing a key arrives in one complete batch. Iteration order of
    /// the returned groups is unconstrained.
    pub fn read_grouped(
        &self,
        job_id: u64,
        map_tasks: &[u64],
        partition: u32,
    ) -> Result<Vec<(String, Vec<RecordValue>)>> {
        let mut groups: HashMap<String, Vec<RecordValue>> = HashMap::new();
        for &task in map_tasks {
            for record in self.read_partition(job_id, task, partition)? {
                groups.entry(record.key).or_default().push(record.value);
            }
        }
        Ok(groups.into_iter().collect())
    }
}
