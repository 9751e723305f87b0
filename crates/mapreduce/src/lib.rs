//! The algorithmic core: per-record transforms and per-key reductions that
//! implement relational operators (filtered projection, group-by count,
//! inner/left join, table interlacing) over delimiter-separated flat files.
//!
//! Architecture role:
//! - row parsing/projection and the filter predicate language
//! - source tagging for shuffle joins
//! - the flat string-keyed job parameter codec shared with the platform
//! - the mapper/reducer implementations the runtime wires together
//!
//! The core is stateless across records, performs no I/O, and never blocks;
//! grouping all records of a key into one reducer invocation is the
//! platform's contract (locally provided by `fmr-shuffle` + the client
//! runtime).
//!
//! Key modules:
//! - [`row`]
//! - [`filter`]
//! - [`tag`]
//! - [`record`]
//! - [`conf`]
//! - [`mapper`]
//! - [`reducer`]

pub mod conf;
pub mod filter;
pub mod mapper;
pub mod record;
pub mod reducer;
pub mod row;
pub mod tag;

// Re-export only what you want at the crate root (no globs).
pub use conf::{JobConf, JoinConf, SelectConf, TableConf};
pub use filter::{FilterEntry, FilterSpec};
pub use mapper::{
    IdentityMapper, JoinMapper, MapInput, RecordMapper, SelectMapper, TokenCountMapper,
};
pub use record::{KeyedRecord, RecordValue, TaggedRow};
pub use reducer::{
    ConcatReducer, CountReducer, IdentityReducer, JoinMode, JoinReducer, KeyReducer,
};
pub use row::{ColumnSelector, Row, KEY_JOINER, VALUE_JOINER};
pub use tag::{tag_source, TableTag};
