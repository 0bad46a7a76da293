//! CSV export of the filtered user registry.

mod csv;
pub mod filter;
mod fs_utils;
pub mod logic;

pub use filter::{ExportFilter, ExportRow};
pub use fs_utils::export_file_name;
pub use logic::{ExportLogic, ExportRequest, ExportSummary};
