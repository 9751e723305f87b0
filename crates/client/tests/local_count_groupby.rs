use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fmr_client::{run_job, Engine, SelectJob};
use fmr_common::RunnerConfig;
use fmr_mapreduce::{ColumnSelector, CountReducer, TokenCountMapper};

fn unique_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{nanos}"))
}

fn write_lines(path: &Path, lines: &[&str]) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, lines.join("\n")).expect("write shard");
}

fn read_output(dir: &Path) -> Vec<String> {
    let mut rows = Vec::new();
    for entry in fs::read_dir(dir).expect("read output dir") {
        let entry = entry.expect("entry");
        if !entry
            .file_name()
            .to_string_lossy()
            .starts_with("part-")
        {
            continue;
        }
        let content = fs::read_to_string(entry.path()).expect("read part");
        rows.extend(content.lines().map(|l| l.to_string()));
    }
    rows.sort();
    rows
}

fn test_config(root: &Path) -> RunnerConfig {
    RunnerConfig {
        shuffle_partitions: 4,
        shuffle_dir: root.join("shuffle").to_string_lossy().into_owned(),
        keep_shuffle: false,
    }
}

#[test]
fn counts_rows_per_group_across_shards() {
    let root = unique_dir("fmr_count_groupby");
    let input = root.join("table");
    write_lines(&input.join("shard-0.csv"), &["a,1", "b,2", "a,3"]);
    write_lines(&input.join("shard-1.csv"), &["c,4", "a,5"]);

    let mut job = SelectJob::new(vec![input]);
    job.key_columns = ColumnSelector::Columns(vec![0]);

    let engine = Engine::new(test_config(&root));
    let summary = engine
        .select_count(&job, &root.join("out"))
        .expect("run count");

    assert_eq!(summary.groups, 3);
    assert_eq!(read_output(&summary.output_dir), vec!["a\t3", "b\t1", "c\t1"]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn count_with_filter_only_counts_matching_rows() {
    let root = unique_dir("fmr_count_filtered");
    let input = root.join("table");
    write_lines(&input.join("shard-0.csv"), &["a,keep", "a,drop", "b,keep"]);

    let mut job = SelectJob::new(vec![input]);
    job.key_columns = ColumnSelector::Columns(vec![0]);
    job.filter_columns = vec![1];
    job.filter_vals = vec![vec!["keep".to_string()]];
    job.invert_flags = vec![false];

    let engine = Engine::new(test_config(&root));
    let summary = engine
        .select_count(&job, &root.join("out"))
        .expect("run count");

    assert_eq!(read_output(&summary.output_dir), vec!["a\t1", "b\t1"]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn token_count_with_count_reducer_is_wordcount() {
    let root = unique_dir("fmr_wordcount");
    let input = root.join("text");
    write_lines(&input.join("doc.txt"), &["to be or", "not to be"]);

    let summary = run_job(
        "wordcount",
        &TokenCountMapper,
        &CountReducer,
        &[input],
        &root.join("out"),
        &test_config(&root),
    )
    .expect("run wordcount");

    assert_eq!(
        read_output(&summary.output_dir),
        vec!["be\t2", "not\t1", "or\t1", "to\t2"]
    );

    let _ = fs::remove_dir_all(root);
}
