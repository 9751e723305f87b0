use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use fmr_common::{FmrError, Result};
use fmr_mapreduce::KeyedRecord;

use crate::layout::{index_path, map_task_dir, partition_path, MapTaskIndex, PartitionMeta};

pub struct ShuffleWriter {
    root_dir: PathBuf,
}

impl ShuffleWriter {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Write one partition of one map task as JSON lines.
    pub fn write_partition(
        &self,
        job_id: u64,
        map_task: u64,
        partition: u32,
        records: &[KeyedRecord],
    ) -> Result<PartitionMeta> {
        if records.is_empty() {
            return Err(FmrError::InvalidConfig(
                "shuffle partition cannot be empty".to_string(),
            ));
        }
        let rel = partition_path(job_id, map_task, partition);
        let abs = self.root_dir.join(&rel);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&abs)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| FmrError::Execution(format!("shuffle record encode failed: {e}")))?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        let bytes = fs::metadata(&abs)?.len();
        Ok(PartitionMeta {
            partition,
            file: rel,
            records: records.len() as u64,
            bytes,
        })
    }

    pub fn write_map_task_index(
        &self,
        job_id: u64,
        map_task: u64,
        mut partitions: Vec<PartitionMeta>,
    ) -> Result<MapTaskIndex> {
        partitions.sort_by_key(|p| p.partition);
        let index = MapTaskIndex {
            job_id,
            map_task,
            partitions,
        };

        let dir = self.root_dir.join(map_task_dir(job_id, map_task));
        fs::create_dir_all(&dir)?;

        let json_path = self.root_dir.join(index_path(job_id, map_task));
        let json_bytes = serde_json::to_vec_pretty(&index)
            .map_err(|e| FmrError::Execution(format!("index json encode failed: {e}")))?;
        fs::write(&json_path, &json_bytes)?;

        Ok(index)
    }
}
