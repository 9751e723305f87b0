use thiserror::Error;

/// Canonical FMR error taxonomy used across crates.
///
/// Classification guidance:
/// - [`FmrError::InvalidConfig`]: malformed or inconsistent job parameters discovered before any record is processed
/// - [`FmrError::Schema`]: a parsed row is narrower than a referenced column index
/// - [`FmrError::JoinKey`]: more than one right-side row shares a join key that must be unique
/// - [`FmrError::Tagging`]: a shard path resolves to no configured table, or to both
/// - [`FmrError::Execution`]: runtime plumbing failures after configuration was accepted
/// - [`FmrError::Io`]: raw filesystem IO failures from std APIs
#[derive(Debug, Error)]
pub enum FmrError {
    /// Invalid or inconsistent job parameters.
    ///
    /// Examples:
    /// - mismatched filter column/value/invert list lengths
    /// - unparseable column selector or multi-character delimiter
    /// - input paths that resolve to zero shards
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A row referenced a column index beyond its width.
    ///
    /// Record-level indexing failures abort the whole job: they indicate a
    /// configuration/schema mismatch affecting the dataset, and skipping the
    /// record would silently change query semantics.
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// The right side of a join contributed duplicate rows under one key.
    ///
    /// The join contract requires the table-2 key to be unique; picking an
    /// arbitrary row would produce incorrect output, so the job faults.
    #[error("non-unique join key: {0}")]
    JoinKey(String),

    /// A shard path matched neither table's path prefixes, or both.
    #[error("table tagging failed: {0}")]
    Tagging(String),

    /// Runtime execution failures after configuration was accepted.
    ///
    /// Examples:
    /// - shuffle partition decode failures
    /// - a join reducer receiving untagged values (mis-wired job)
    #[error("execution error: {0}")]
    Execution(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard FMR result alias.
pub type Result<T> = std::result::Result<T, FmrError>;
