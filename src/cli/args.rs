//! CLI argument definitions.

use crate::cli::validators::parse_confidence;
use crate::detect::{BoxConvention, OutputLayout};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bird detection in images and camera-style frame streams.
#[derive(Debug, Parser)]
#[command(name = "avistar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Image files, directories or URLs to analyze.
    pub inputs: Vec<String>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a directory for new frames and detect continuously.
    Watch {
        /// Directory to watch for incoming frames.
        dir: PathBuf,

        /// Directory for auto-captured frames (overrides config).
        #[arg(long)]
        captures_dir: Option<PathBuf>,

        /// Process the directory's current contents, then exit.
        #[arg(long)]
        drain: bool,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the analyze command.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Path to ONNX model file (overrides config).
    #[arg(short, long, env = "AVISTAR_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "AVISTAR_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Model output tensor layout (box-major or channel-major).
    #[arg(long, env = "AVISTAR_OUTPUT_LAYOUT")]
    pub output_layout: Option<OutputLayout>,

    /// Raw box coordinate convention (top-left or center).
    #[arg(long, env = "AVISTAR_BOX_CONVENTION")]
    pub box_convention: Option<BoxConvention>,

    /// Apply contrast/brightness enhancement before inference.
    #[arg(long)]
    pub enhance: bool,

    /// Output directory for JSON results (default: same as input).
    #[arg(short, long, env = "AVISTAR_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Reprocess files even if output exists.
    #[arg(long)]
    pub force: bool,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl AnalyzeArgs {
    /// Fold CLI overrides into a loaded configuration.
    pub fn apply_to(&self, config: &mut crate::config::Config) {
        if let Some(threshold) = self.min_confidence {
            config.detection.confidence_threshold = threshold;
        }
        if let Some(layout) = self.output_layout {
            config.model.output_layout = layout;
        }
        if let Some(convention) = self.box_convention {
            config.model.box_convention = convention;
        }
        if self.enhance {
            config.detection.enhance = true;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_plain_inputs() {
        let cli = Cli::parse_from(["avistar", "a.jpg", "https://example.com/b.png"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.inputs.len(), 2);
    }

    #[test]
    fn test_parses_watch_command() {
        let cli = Cli::parse_from(["avistar", "watch", "frames/", "--drain"]);
        match cli.command {
            Some(Command::Watch { dir, drain, .. }) => {
                assert_eq!(dir, PathBuf::from("frames/"));
                assert!(drain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "avistar",
            "-c",
            "0.4",
            "--output-layout",
            "channel-major",
            "a.jpg",
        ]);
        let mut config = crate::config::Config::default();
        cli.analyze.apply_to(&mut config);
        assert_eq!(config.detection.confidence_threshold, 0.4);
        assert_eq!(config.model.output_layout, OutputLayout::ChannelMajor);
    }
}
