//! CLI argument parsing and command handling.

mod args;
mod validators;

pub use args::{AnalyzeArgs, Cli, Command, ConfigAction};
pub use validators::parse_confidence;
