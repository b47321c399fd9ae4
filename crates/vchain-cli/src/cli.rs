//! Command-line arguments.
//!
//! Every option is optional; unset flags fall through to the environment,
//! then the config file, then the built-in defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vchain", version, about = "Chain remote video generations into longer clips")]
pub struct Cli {
    /// Config file (YAML, TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token for the remote service
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Seconds to wait between requests
    #[arg(long, global = true)]
    pub wait: Option<f64>,

    /// Debug logging
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub debug: Option<bool>,

    /// Upstream proxy URL
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Directory for working files
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a video from an image and/or a text prompt
    Generate(GenerateArgs),
    /// Extend an existing video by chaining last-frame generations
    Extend(ExtendArgs),
    /// Append a reversed copy of a video to itself
    Loop(LoopArgs),
    /// Print version information
    Version,
}

/// Options shared by every command that submits generations.
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Model to use (gen2 or gen3)
    #[arg(long)]
    pub model: Option<String>,

    /// Folder (asset group) to store results in
    #[arg(long)]
    pub folder: Option<String>,

    /// Explore mode
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub explore: Option<bool>,

    /// Interpolate frames (gen2)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub interpolate: Option<bool>,

    /// Upscale frames (gen2)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub upscale: Option<bool>,

    /// Add a watermark
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub watermark: Option<bool>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Source image
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Text prompt
    #[arg(long)]
    pub text: Option<String>,

    /// Output file; without it nothing is saved unless the video is extended
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Extend the video by this many continuations
    #[arg(long)]
    pub extend: Option<usize>,

    /// Output width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Resolution tier (gen3), e.g. 720p
    #[arg(long)]
    pub resolution: Option<String>,

    /// Use the image as the last frame instead of the first (gen3)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub last_frame: Option<bool>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExtendArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Input video
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output file; without it the segments are not joined
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Number of segments to append
    #[arg(short, long)]
    pub n: Option<usize>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct LoopArgs {
    /// Input video
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_boolean_flag_means_true() {
        let cli = Cli::try_parse_from(["vchain", "generate", "--text", "waves", "--upscale", "--interpolate=false"])
            .unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.model.upscale, Some(true));
                assert_eq!(args.model.interpolate, Some(false));
                assert_eq!(args.model.watermark, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vchain", "extend", "--input", "car.mp4", "-n", "2", "--token", "t", "--debug"])
            .unwrap();
        assert_eq!(cli.token.as_deref(), Some("t"));
        assert_eq!(cli.debug, Some(true));
        match cli.command {
            Command::Extend(args) => assert_eq!(args.n, Some(2)),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
