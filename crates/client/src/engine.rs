//! Job builders for the relational operations.
//!
//! Each builder assembles the flat string-keyed job parameter map the way
//! the launcher layer would, parses it back into a typed config (the same
//! path the per-record phase takes on a real platform), and wires the
//! matching mapper/reducer pair into the runtime.

use std::path::{Path, PathBuf};

use fmr_common::{Result, RunnerConfig};
use fmr_mapreduce::{
    ColumnSelector, ConcatReducer, CountReducer, IdentityMapper, IdentityReducer, JobConf,
    JoinConf, JoinMapper, JoinMode, JoinReducer, SelectConf, SelectMapper,
};

use crate::runtime::{run_job, JobSummary};

/// Parameters of a single-table select/count job.
///
/// `filter_columns[i]` is checked against `filter_vals[i]` under
/// `invert_flags[i]`; the three lists must stay aligned (enforced when the
/// job parameters are compiled).
#[derive(Debug, Clone)]
pub struct SelectJob {
    pub inputs: Vec<PathBuf>,
    pub delimiter: char,
    pub key_columns: ColumnSelector,
    pub target_columns: ColumnSelector,
    pub filter_columns: Vec<usize>,
    pub filter_vals: Vec<Vec<String>>,
    pub invert_flags: Vec<bool>,
}

impl SelectJob {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            delimiter: ',',
            key_columns: ColumnSelector::All,
            target_columns: ColumnSelector::All,
            filter_columns: Vec::new(),
            filter_vals: Vec::new(),
            invert_flags: Vec::new(),
        }
    }
}

/// One side of a join job.
#[derive(Debug, Clone)]
pub struct JoinSide {
    /// Path prefixes identifying this table's shards. Also the job's inputs:
    /// globs are not expanded, pass complete prefixes.
    pub paths: Vec<PathBuf>,
    pub delimiter: char,
    pub key_columns: ColumnSelector,
    pub target_columns: ColumnSelector,
    pub filter_columns: Vec<usize>,
    pub filter_vals: Vec<Vec<String>>,
    pub invert_flags: Vec<bool>,
}

impl JoinSide {
    pub fn new(paths: Vec<PathBuf>, key_columns: ColumnSelector) -> Self {
        Self {
            paths,
            delimiter: ',',
            key_columns,
            target_columns: ColumnSelector::All,
            filter_columns: Vec::new(),
            filter_vals: Vec::new(),
            invert_flags: Vec::new(),
        }
    }
}

/// Parameters of a two-table join job.
#[derive(Debug, Clone)]
pub struct JoinJob {
    pub table_1: JoinSide,
    pub table_2: JoinSide,
}

/// One member of a select-then-interlace composition.
#[derive(Debug, Clone)]
pub enum InterlaceMember {
    /// Run this select, then interlace its output.
    Select(SelectJob),
    /// Interlace a pre-existing result set as-is ("hotstart").
    Existing(PathBuf),
}

/// Facade over the runtime: one method per relational operation.
#[derive(Debug, Clone)]
pub struct Engine {
    config: RunnerConfig,
}

impl Engine {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// `SELECT target_columns FROM inputs WHERE ..` keyed (grouped) by
    /// `key_columns`.
    pub fn select_where(&self, job: &SelectJob, output_root: &Path) -> Result<JobSummary> {
        let conf = encode_select(job);
        let mapper = SelectMapper::new(SelectConf::from_conf(&conf)?);
        run_job(
            "select_where",
            &mapper,
            &IdentityReducer,
            &job.inputs,
            output_root,
            &self.config,
        )
    }

    /// `SELECT count(*) FROM inputs WHERE .. GROUP BY key_columns`.
    pub fn select_count(&self, job: &SelectJob, output_root: &Path) -> Result<JobSummary> {
        let conf = encode_select(job);
        let mapper = SelectMapper::new(SelectConf::from_conf(&conf)?);
        run_job(
            "select_count_star_where_and_groupby",
            &mapper,
            &CountReducer,
            &job.inputs,
            output_root,
            &self.config,
        )
    }

    /// `SELECT .. FROM table_1 {INNER|LEFT} JOIN table_2 ON key columns`.
    pub fn join(&self, job: &JoinJob, mode: JoinMode, output_root: &Path) -> Result<JobSummary> {
        let conf = encode_join(job);
        let parsed = JoinConf::from_conf(&conf)?;
        let mapper = JoinMapper::new(parsed.clone());
        let reducer = JoinReducer::new(mode, &parsed);
        let mut inputs = job.table_1.paths.clone();
        inputs.extend(job.table_2.paths.iter().cloned());
        let name = match mode {
            JoinMode::Inner => "inner_join",
            JoinMode::Left => "left_join",
        };
        run_job(name, &mapper, &reducer, &inputs, output_root, &self.config)
    }

    /// Write every row of every input into one result set, keys discarded.
    pub fn interlace(&self, inputs: &[PathBuf], output_root: &Path) -> Result<JobSummary> {
        run_job(
            "interlace_tables",
            &IdentityMapper,
            &ConcatReducer,
            inputs,
            output_root,
            &self.config,
        )
    }

    /// Run each member select, then interlace all the results into one
    /// logical table.
    pub fn select_where_interlace(
        &self,
        members: &[InterlaceMember],
        output_root: &Path,
    ) -> Result<JobSummary> {
        let mut result_dirs = Vec::with_capacity(members.len());
        for member in members {
            match member {
                InterlaceMember::Select(job) => {
                    result_dirs.push(self.select_where(job, output_root)?.output_dir);
                }
                InterlaceMember::Existing(path) => result_dirs.push(path.clone()),
            }
        }
        self.interlace(&result_dirs, output_root)
    }
}

fn encode_select(job: &SelectJob) -> JobConf {
    let mut conf = JobConf::new();
    conf.set("delimiter", job.delimiter.to_string());
    conf.set("key_columns", job.key_columns.to_string());
    conf.set("target_columns", job.target_columns.to_string());
    encode_filter_keys(
        &mut conf,
        "filter_columns",
        "filter_vals",
        "invert_filter_vals",
        &job.filter_columns,
        &job.filter_vals,
        &job.invert_flags,
    );
    conf
}

fn encode_join(job: &JoinJob) -> JobConf {
    let mut conf = JobConf::new();
    encode_join_side(&mut conf, &job.table_1, 1);
    encode_join_side(&mut conf, &job.table_2, 2);
    conf
}

fn encode_join_side(conf: &mut JobConf, side: &JoinSide, n: u8) {
    let paths = side
        .paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(",");
    conf.set(format!("table_{n}_path"), paths);
    conf.set(format!("table_{n}_delimiter"), side.delimiter.to_string());
    conf.set(
        format!("table_{n}_key_columns"),
        side.key_columns.to_string(),
    );
    conf.set(
        format!("table_{n}_target_columns"),
        side.target_columns.to_string(),
    );
    encode_filter_keys(
        conf,
        &format!("table_{n}_filter_columns"),
        &format!("table_{n}_filter_vals"),
        &format!("table_{n}_invert_filter_vals"),
        &side.filter_columns,
        &side.filter_vals,
        &side.invert_flags,
    );
}

fn encode_filter_keys(
    conf: &mut JobConf,
    cols_key: &str,
    vals_key: &str,
    invert_key: &str,
    columns: &[usize],
    value_groups: &[Vec<String>],
    inverts: &[bool],
) {
    if columns.is_empty() && value_groups.is_empty() && inverts.is_empty() {
        return;
    }
    // Misaligned lists are still encoded; compilation faults on them.
    conf.set(
        cols_key,
        columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("|"),
    );
    conf.set(
        vals_key,
        value_groups
            .iter()
            .map(|g| g.join(","))
            .collect::<Vec<_>>()
            .join("|"),
    );
    conf.set(
        invert_key,
        inverts
            .iter()
            .map(|i| if *i { "1" } else { "0" })
            .collect::<Vec<_>>()
            .join("|"),
    );
}
