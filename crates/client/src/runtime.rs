//! Local execution runtime: the reference platform for the map/reduce core.
//!
//! Responsibilities:
//! - expand input paths into shards;
//! - run the per-record phase over shards in parallel, routing emitted
//!   records into hash partitions on disk;
//! - run the per-key phase over partitions in parallel, one complete batch
//!   per distinct key;
//! - write plain-text output part files and report job totals.
//!
//! Fault semantics: any mapper/reducer error aborts the whole run. Skipping
//! an offending record would silently change query semantics, so there are
//! no retries and no partial output on fault.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use fmr_common::metrics::global_metrics;
use fmr_common::{FmrError, JobId, Result, RunnerConfig};
use fmr_mapreduce::{KeyReducer, KeyedRecord, MapInput, RecordMapper};
use fmr_shuffle::{partition_for_key, ShuffleReader, ShuffleWriter};

/// Totals of one completed job run.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job_id: JobId,
    pub shards: usize,
    /// Input records seen by the per-record phase.
    pub records_in: u64,
    /// Keyed records emitted into the shuffle.
    pub records_emitted: u64,
    /// Distinct key groups delivered to the per-key phase.
    pub groups: u64,
    /// Output records written.
    pub records_out: u64,
    pub output_dir: PathBuf,
}

/// Expand input paths into shard files.
///
/// A file is one shard; a directory contributes every regular file under it
/// (recursively), skipping dotfiles and `_`-prefixed marker files (the
/// `_SUCCESS` convention of result directories). Resolving to zero shards
/// is a configuration fault rather than a silently empty job.
pub fn discover_shards(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut shards = Vec::new();
    for input in inputs {
        if input.is_file() {
            shards.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(FmrError::InvalidConfig(format!(
                "input path {} does not exist",
                input.display()
            )));
        }
        for entry in WalkDir::new(input) {
            let entry = entry
                .map_err(|e| FmrError::Execution(format!("walking {}: {e}", input.display())))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            shards.push(entry.into_path());
        }
    }
    shards.sort();
    shards.dedup();
    if shards.is_empty() {
        return Err(FmrError::InvalidConfig(
            "input paths resolved to zero shards".to_string(),
        ));
    }
    Ok(shards)
}

/// Run one map/shuffle/reduce job to completion.
///
/// The output directory is `<output_root>/<name>/<job id>`, mirroring how
/// the launcher layer names result sets per operation.
pub fn run_job(
    name: &str,
    mapper: &dyn RecordMapper,
    reducer: &dyn KeyReducer,
    inputs: &[PathBuf],
    output_root: &Path,
    config: &RunnerConfig,
) -> Result<JobSummary> {
    let job_id = next_job_id();
    let job_label = job_id.to_string();
    let shards = discover_shards(inputs)?;
    let partitions = config.shuffle_partitions.max(1);
    let shuffle_root = PathBuf::from(&config.shuffle_dir);
    let output_dir = output_root.join(name).join(&job_label);

    info!(
        %job_id,
        name,
        shards = shards.len(),
        partitions,
        output = %output_dir.display(),
        "starting job"
    );

    let writer = ShuffleWriter::new(&shuffle_root);
    let map_stats = shards
        .par_iter()
        .enumerate()
        .map(|(task, shard)| run_map_task(job_id, task as u64, shard, mapper, partitions, &writer))
        .collect::<Result<Vec<_>>>()?;
    let records_in: u64 = map_stats.iter().map(|s| s.records_in).sum();
    let records_emitted: u64 = map_stats.iter().map(|s| s.records_emitted).sum();
    let shuffle_bytes: u64 = map_stats.iter().map(|s| s.shuffle_bytes).sum();
    global_metrics().record_map(&job_label, records_in, records_emitted);
    global_metrics().record_shuffle_write(&job_label, records_emitted, shuffle_bytes);
    info!(%job_id, records_in, records_emitted, "map phase complete");

    fs::create_dir_all(&output_dir)?;
    let reader = ShuffleReader::new(&shuffle_root);
    let map_tasks: Vec<u64> = (0..shards.len() as u64).collect();
    let reduce_stats = (0..partitions as u32)
        .into_par_iter()
        .map(|p| run_reduce_partition(job_id, p, &reader, &map_tasks, reducer, &output_dir))
        .collect::<Result<Vec<_>>>()?;
    let groups: u64 = reduce_stats.iter().map(|s| s.groups).sum();
    let records_out: u64 = reduce_stats.iter().map(|s| s.records_out).sum();
    global_metrics().record_reduce(&job_label, groups, records_out);
    info!(%job_id, groups, records_out, "reduce phase complete");

    if !config.keep_shuffle {
        let _ = fs::remove_dir_all(shuffle_root.join(&job_label));
    }

    Ok(JobSummary {
        job_id,
        shards: shards.len(),
        records_in,
        records_emitted,
        groups,
        records_out,
        output_dir,
    })
}

struct MapTaskStats {
    records_in: u64,
    records_emitted: u64,
    shuffle_bytes: u64,
}

fn run_map_task(
    job_id: JobId,
    task: u64,
    shard: &Path,
    mapper: &dyn RecordMapper,
    partitions: usize,
    writer: &ShuffleWriter,
) -> Result<MapTaskStats> {
    let source_path = shard.to_string_lossy();
    let file = File::open(shard)?;
    let reader = BufReader::new(file);

    let mut buffers: Vec<Vec<KeyedRecord>> = vec![Vec::new(); partitions];
    let mut offset = 0u64;
    let mut records_in = 0u64;
    let mut records_emitted = 0u64;
    for line in reader.lines() {
        let line = line?;
        let input = MapInput {
            source_path: source_path.as_ref(),
            offset,
            line: &line,
        };
        offset += line.len() as u64 + 1;
        records_in += 1;
        for record in mapper.map(&input)? {
            let partition = partition_for_key(&record.key, partitions) as usize;
            buffers[partition].push(record);
            records_emitted += 1;
        }
    }

    let mut metas = Vec::new();
    for (partition, records) in buffers.iter().enumerate() {
        if records.is_empty() {
            continue;
        }
        metas.push(writer.write_partition(job_id.0, task, partition as u32, records)?);
    }
    let shuffle_bytes = metas.iter().map(|m| m.bytes).sum();
    writer.write_map_task_index(job_id.0, task, metas)?;

    debug!(%job_id, task, shard = %shard.display(), records_in, records_emitted, "map task complete");
    Ok(MapTaskStats {
        records_in,
        records_emitted,
        shuffle_bytes,
    })
}

#[derive(Default)]
struct ReduceStats {
    groups: u64,
    records_out: u64,
}

fn run_reduce_partition(
    job_id: JobId,
    partition: u32,
    reader: &ShuffleReader,
    map_tasks: &[u64],
    reducer: &dyn KeyReducer,
    output_dir: &Path,
) -> Result<ReduceStats> {
    let groups = reader.read_grouped(job_id.0, map_tasks, partition)?;
    if groups.is_empty() {
        return Ok(ReduceStats::default());
    }

    let out_path = output_dir.join(format!("part-{partition:05}.txt"));
    let file = File::create(&out_path)?;
    let mut writer = BufWriter::new(file);
    let mut stats = ReduceStats {
        groups: groups.len() as u64,
        records_out: 0,
    };
    for (key, values) in groups {
        for (out_key, out_value) in reducer.reduce(&key, values)? {
            // Text output convention: no separator when the value is empty,
            // so key-discarding reducers produce clean single-column tables.
            if out_value.is_empty() {
                writeln!(writer, "{out_key}")?;
            } else {
                writeln!(writer, "{out_key}\t{out_value}")?;
            }
            stats.records_out += 1;
        }
    }
    writer.flush()?;

    debug!(%job_id, partition, groups = stats.groups, records_out = stats.records_out, "reduce partition complete");
    Ok(stats)
}

fn next_job_id() -> JobId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    JobId(nanos)
}
