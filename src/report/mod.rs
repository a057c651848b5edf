//! CSV report generation.

mod writer;

pub use writer::{export_filename, format_hhmm, write_report};
