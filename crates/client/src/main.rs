use std::path::{Path, PathBuf};

use fmr_client::{Engine, JoinJob, JoinMode, JoinSide, SelectJob};
use fmr_common::RunnerConfig;
use fmr_mapreduce::ColumnSelector;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.first().map(|a| a.as_str()) {
        None | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("select") => run_select(&args, false),
        Some("count") => run_select(&args, true),
        Some("join") => run_join(&args),
        Some("interlace") => run_interlace(&args),
        Some(other) => Err(format!("unknown subcommand: {other}").into()),
    }
}

#[derive(Debug, Default)]
struct CommonOpts {
    output: Option<PathBuf>,
    partitions: Option<usize>,
    shuffle_dir: Option<String>,
    keep_shuffle: bool,
}

impl CommonOpts {
    fn config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::default();
        if let Some(partitions) = self.partitions {
            config.shuffle_partitions = partitions;
        }
        if let Some(dir) = &self.shuffle_dir {
            config.shuffle_dir = dir.clone();
        }
        config.keep_shuffle = self.keep_shuffle;
        config
    }

    fn output(&self) -> Result<&Path, Box<dyn std::error::Error>> {
        self.output.as_deref().ok_or_else(|| "missing --output".into())
    }
}

fn run_select(args: &[String], count: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut common = CommonOpts::default();
    let mut job = SelectJob::new(Vec::new());

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => job.inputs.extend(parse_paths(value(args, &mut i)?)),
            "--delimiter" => job.delimiter = parse_delimiter(value(args, &mut i)?)?,
            "--key-columns" => job.key_columns = ColumnSelector::parse(value(args, &mut i)?)?,
            "--target-columns" => {
                job.target_columns = ColumnSelector::parse(value(args, &mut i)?)?
            }
            "--filter-columns" => job.filter_columns = parse_filter_columns(value(args, &mut i)?)?,
            "--filter-vals" => job.filter_vals = parse_filter_vals(value(args, &mut i)?),
            "--invert-filter-vals" => {
                job.invert_flags = parse_invert_flags(value(args, &mut i)?)?
            }
            other => parse_common(&mut common, args, &mut i, other)?,
        }
        i += 1;
    }

    let engine = Engine::new(common.config());
    let output = common.output()?;
    let summary = if count {
        engine.select_count(&job, output)?
    } else {
        engine.select_where(&job, output)?
    };
    print_summary(&summary);
    Ok(())
}

fn run_join(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut common = CommonOpts::default();
    let mut mode = JoinMode::Inner;
    let mut table_1 = JoinSide::new(Vec::new(), ColumnSelector::Columns(vec![0]));
    let mut table_2 = JoinSide::new(Vec::new(), ColumnSelector::Columns(vec![0]));

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--table1-path" => table_1.paths.extend(parse_paths(value(args, &mut i)?)),
            "--table2-path" => table_2.paths.extend(parse_paths(value(args, &mut i)?)),
            "--table1-delimiter" => table_1.delimiter = parse_delimiter(value(args, &mut i)?)?,
            "--table2-delimiter" => table_2.delimiter = parse_delimiter(value(args, &mut i)?)?,
            "--table1-key-columns" => {
                table_1.key_columns = ColumnSelector::parse(value(args, &mut i)?)?
            }
            "--table2-key-columns" => {
                table_2.key_columns = ColumnSelector::parse(value(args, &mut i)?)?
            }
            "--table1-target-columns" => {
                table_1.target_columns = ColumnSelector::parse(value(args, &mut i)?)?
            }
            "--table2-target-columns" => {
                table_2.target_columns = ColumnSelector::parse(value(args, &mut i)?)?
            }
            "--table1-filter-columns" => {
                table_1.filter_columns = parse_filter_columns(value(args, &mut i)?)?
            }
            "--table2-filter-columns" => {
                table_2.filter_columns = parse_filter_columns(value(args, &mut i)?)?
            }
            "--table1-filter-vals" => table_1.filter_vals = parse_filter_vals(value(args, &mut i)?),
            "--table2-filter-vals" => table_2.filter_vals = parse_filter_vals(value(args, &mut i)?),
            "--table1-invert-filter-vals" => {
                table_1.invert_flags = parse_invert_flags(value(args, &mut i)?)?
            }
            "--table2-invert-filter-vals" => {
                table_2.invert_flags = parse_invert_flags(value(args, &mut i)?)?
            }
            "--mode" => {
                mode = match value(args, &mut i)? {
                    "inner" => JoinMode::Inner,
                    "left" => JoinMode::Left,
                    other => return Err(format!("unknown join mode: {other}").into()),
                }
            }
            other => parse_common(&mut common, args, &mut i, other)?,
        }
        i += 1;
    }

    let engine = Engine::new(common.config());
    let job = JoinJob { table_1, table_2 };
    let summary = engine.join(&job, mode, common.output()?)?;
    print_summary(&summary);
    Ok(())
}

fn run_interlace(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut common = CommonOpts::default();
    let mut inputs = Vec::new();

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => inputs.extend(parse_paths(value(args, &mut i)?)),
            other => parse_common(&mut common, args, &mut i, other)?,
        }
        i += 1;
    }

    let engine = Engine::new(common.config());
    let summary = engine.interlace(&inputs, common.output()?)?;
    print_summary(&summary);
    Ok(())
}

fn parse_common(
    common: &mut CommonOpts,
    args: &[String],
    i: &mut usize,
    flag: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match flag {
        "--output" => common.output = Some(PathBuf::from(value(args, i)?)),
        "--partitions" => common.partitions = Some(value(args, i)?.parse()?),
        "--shuffle-dir" => common.shuffle_dir = Some(value(args, i)?.to_string()),
        "--keep-shuffle" => common.keep_shuffle = true,
        "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        other => return Err(format!("unknown argument: {other}").into()),
    }
    Ok(())
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, Box<dyn std::error::Error>> {
    let flag = args[*i].clone();
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}").into())
}

fn parse_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_delimiter(raw: &str) -> Result<char, Box<dyn std::error::Error>> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("delimiter must be exactly one character, got {raw:?}").into()),
    }
}

fn parse_filter_columns(raw: &str) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    let mut columns = Vec::new();
    for t in raw.split('|') {
        let parsed = t
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("bad filter column index: {t:?}"))?;
        columns.push(parsed);
    }
    Ok(columns)
}

fn parse_filter_vals(raw: &str) -> Vec<Vec<String>> {
    raw.split('|')
        .map(|g| g.split(',').map(|v| v.to_string()).collect())
        .collect()
}

fn parse_invert_flags(raw: &str) -> Result<Vec<bool>, Box<dyn std::error::Error>> {
    let mut flags = Vec::new();
    for f in raw.split('|') {
        flags.push(match f.trim() {
            "0" => false,
            "1" => true,
            other => return Err(format!("bad invert flag {other:?} (expected 0 or 1)").into()),
        });
    }
    Ok(flags)
}

fn print_summary(summary: &fmr_client::JobSummary) {
    println!(
        "OK: {} rows ({} groups) in {}",
        summary.records_out,
        summary.groups,
        summary.output_dir.display()
    );
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  fmr select --input PATHS --output DIR [--delimiter C]");
    eprintln!("             [--key-columns SPEC] [--target-columns SPEC]");
    eprintln!("             [--filter-columns 1|2 --filter-vals a,b|c --invert-filter-vals 0|1]");
    eprintln!("  fmr count ... (same flags; counts rows per key group)");
    eprintln!("  fmr join --table1-path PATHS --table2-path PATHS");
    eprintln!("           --table1-key-columns SPEC --table2-key-columns SPEC");
    eprintln!("           [--table{{1,2}}-delimiter C] [--table{{1,2}}-target-columns SPEC]");
    eprintln!("           [--table{{1,2}}-filter-* ...] [--mode inner|left] --output DIR");
    eprintln!("  fmr interlace --input PATHS --output DIR");
    eprintln!();
    eprintln!("  PATHS are comma-separated files or directories; SPEC is '*' or");
    eprintln!("  comma-separated zero-based column indices.");
    eprintln!();
    eprintln!("  Common flags: --partitions N, --shuffle-dir DIR, --keep-shuffle");
}
