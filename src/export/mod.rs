pub mod arrow;
pub mod write;

pub use self::arrow::{to_record_batch, ArrowRow};
pub use write::{write_detail, write_overview, write_table, OutputFormat};
