use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fmr_client::{Engine, InterlaceMember, SelectJob};
use fmr_common::RunnerConfig;
use fmr_mapreduce::ColumnSelector;

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
fn interlace_unions_tables_and_trims_whitespace() {
    let root = unique_dir("fmr_interlace");
    let t1 = root.join("t1");
    let t2 = root.join("t2");
    write_lines(&t1.join("part-0.csv"), &["a,1", "  b,2  "]);
    write_lines(&t2.join("part-0.csv"), &["c,3"]);

    let engine = Engine::new(test_config(&root));
    let summary = engine
        .interlace(&[t1, t2], &root.join("out"))
        .expect("run interlace");

    assert_eq!(read_output(&summary.output_dir), vec!["a,1", "b,2", "c,3"]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn interlace_keeps_duplicate_rows_from_different_sources() {
    // Both shards put "dup,9" at byte offset 0, so the rows collide on the
    // discarded grouping key; each value must still come through.
    let root = unique_dir("fmr_interlace_dup");
    let t1 = root.join("t1");
    let t2 = root.join("t2");
    write_lines(&t1.join("part-0.csv"), &["dup,9"]);
    write_lines(&t2.join("part-0.csv"), &["dup,9"]);

    let engine = Engine::new(test_config(&root));
    let summary = engine
        .interlace(&[t1, t2], &root.join("out"))
        .expect("run interlace");

    assert_eq!(summary.records_out, 2);
    assert_eq!(read_output(&summary.output_dir), vec!["dup,9", "dup,9"]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn select_where_interlace_unions_filtered_selections_and_hotstarts() {
    let root = unique_dir("fmr_select_interlace");
    let table = root.join("table");
    write_lines(&table.join("part-0.csv"), &["a,1", "b,2", "c,3"]);
    let hotstart = root.join("hotstart");
    write_lines(&hotstart.join("part-0.csv"), &["z,9"]);

    let select = |val: &str| {
        let mut job = SelectJob::new(vec![table.clone()]);
        job.key_columns = ColumnSelector::Columns(vec![0]);
        job.filter_columns = vec![0];
        job.filter_vals = vec![vec![val.to_string()]];
        job.invert_flags = vec![false];
        job
    };

    let engine = Engine::new(test_config(&root));
    let summary = engine
        .select_where_interlace(
            &[
                InterlaceMember::Select(select("a")),
                InterlaceMember::Select(select("c")),
                InterlaceMember::Existing(hotstart),
            ],
            &root.join("out"),
        )
        .expect("run composition");

    // Member selects emit key<TAB>row lines; the interlace passes them
    // through whole, the hotstart rows come through untouched.
    assert_eq!(
        read_output(&summary.output_dir),
        vec!["a\ta,1", "c\tc,3", "z,9"]
    );

    let _ = fs::remove_dir_all(root);
}
