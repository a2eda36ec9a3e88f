//! Report module - terminal tables and JSON exports

pub mod eda_report;
pub mod iv_export;
pub mod summary;

pub use eda_report::*;
pub use iv_export::*;
pub use summary::*;
