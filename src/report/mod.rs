//! Report generation: human-readable summaries and spreadsheet exports.

pub mod export;
pub mod presenter;

pub use export::{export_filename, export_survey, XLSX_CONTENT_TYPE};
pub use presenter::SummaryPresenter;
