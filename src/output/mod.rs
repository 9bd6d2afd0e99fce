//! Result output formats and progress reporting.

mod json;
pub mod progress;

pub use json::{JsonResultFile, JsonSettings, JsonSummary, write_results};
