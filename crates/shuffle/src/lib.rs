pub mod layout;
pub mod reader;
pub mod writer;

pub use layout::*;
pub use reader::ShuffleReader;
pub use writer::ShuffleWriter;
