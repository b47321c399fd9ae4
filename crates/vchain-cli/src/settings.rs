//! Layered settings.
//!
//! Precedence, lowest first: built-in defaults, the `--config` file,
//! `VCHAIN_*` environment variables, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use vchain_client::ClientConfig;
use vchain_models::{Gen2Options, Gen3Options, ModelFamily, ModelKind};
use vchain_pipeline::{ChainConfig, GenerationSettings};

use crate::cli::{Cli, Command, ModelArgs};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "VCHAIN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token: String,
    /// Seconds between requests
    pub wait: f64,
    pub debug: bool,
    pub proxy: Option<String>,
    pub work_dir: Option<PathBuf>,

    pub model: String,
    pub folder: Option<String>,
    pub explore: bool,
    pub interpolate: bool,
    pub upscale: bool,
    pub watermark: bool,
    pub width: u32,
    pub height: u32,
    pub resolution: Option<String>,
    pub last_frame: bool,

    pub image: Option<PathBuf>,
    pub text: String,
    pub output: Option<PathBuf>,
    pub extend: usize,
    pub input: Option<PathBuf>,
    pub n: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            wait: 2.0,
            debug: false,
            proxy: None,
            work_dir: None,
            model: ModelFamily::Gen2.to_string(),
            folder: None,
            explore: false,
            interpolate: true,
            upscale: false,
            watermark: false,
            width: 0,
            height: 0,
            resolution: None,
            last_frame: false,
            image: None,
            text: String::new(),
            output: None,
            extend: 0,
            input: None,
            n: 1,
        }
    }
}

type Builder = ConfigBuilder<config::builder::DefaultState>;

impl Settings {
    /// Load settings for `cli`, reading variables from the process environment.
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_env(cli, None)
    }

    /// Load settings for `cli`. `env` replaces the process environment when set.
    pub fn load_with_env(cli: &Cli, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );
        builder = apply_flags(builder, cli)?;

        let settings: Settings = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !self.wait.is_finite() || self.wait < 0.0 {
            bail!("wait must be a non-negative number of seconds, got {}", self.wait);
        }
        Ok(())
    }

    /// The token, or an error naming the missing setting.
    pub fn require_token(&self) -> Result<&str> {
        let token = self.token.trim();
        if token.is_empty() {
            bail!("token is required (--token or {}_TOKEN)", ENV_PREFIX);
        }
        Ok(token)
    }

    pub fn model_kind(&self) -> Result<ModelKind> {
        let family: ModelFamily = self.model.parse()?;
        Ok(match family {
            ModelFamily::Gen2 => ModelKind::gen2(
                Gen2Options::default()
                    .with_dimensions(self.width, self.height)
                    .with_interpolate(self.interpolate)
                    .with_upscale(self.upscale)
                    .with_watermark(self.watermark),
            ),
            ModelFamily::Gen3 => ModelKind::gen3(
                Gen3Options::default()
                    .with_size(Gen3Options::sized(
                        self.width,
                        self.height,
                        self.resolution.as_deref(),
                    ))
                    .with_watermark(self.watermark)
                    .with_last_frame(self.last_frame),
            ),
        })
    }

    pub fn generation_settings(&self) -> Result<GenerationSettings> {
        Ok(GenerationSettings::new(self.model_kind()?)
            .with_explore_mode(self.explore)
            .with_folder(self.folder.clone().filter(|f| !f.trim().is_empty())))
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let wait = Duration::try_from_secs_f64(self.wait)
            .map_err(|e| anyhow!("invalid wait {}: {}", self.wait, e))?;
        Ok(ClientConfig::default()
            .with_min_interval(wait)
            .with_proxy(self.proxy.clone()))
    }

    pub fn chain_config(&self) -> ChainConfig {
        match &self.work_dir {
            Some(dir) => ChainConfig::default().with_work_dir(dir.clone()),
            None => ChainConfig::default(),
        }
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_deref().map(|p| p.to_string_lossy().into_owned())
}

fn apply_flags(builder: Builder, cli: &Cli) -> Result<Builder> {
    let mut builder = builder
        .set_override_option("token", cli.token.clone())?
        .set_override_option("wait", cli.wait)?
        .set_override_option("debug", cli.debug)?
        .set_override_option("proxy", cli.proxy.clone())?
        .set_override_option("work_dir", path_value(&cli.work_dir))?;

    match &cli.command {
        Command::Generate(args) => {
            builder = apply_model_flags(builder, &args.model)?
                .set_override_option("image", path_value(&args.image))?
                .set_override_option("text", args.text.clone())?
                .set_override_option("output", path_value(&args.output))?
                .set_override_option("extend", args.extend.map(|n| n as u64))?
                .set_override_option("width", args.width.map(u64::from))?
                .set_override_option("height", args.height.map(u64::from))?
                .set_override_option("resolution", args.resolution.clone())?
                .set_override_option("last_frame", args.last_frame)?;
        }
        Command::Extend(args) => {
            builder = apply_model_flags(builder, &args.model)?
                .set_override_option("input", path_value(&args.input))?
                .set_override_option("output", path_value(&args.output))?
                .set_override_option("n", args.n.map(|n| n as u64))?;
        }
        Command::Loop(args) => {
            builder = builder
                .set_override_option("input", path_value(&args.input))?
                .set_override_option("output", path_value(&args.output))?;
        }
        Command::Version => {}
    }
    Ok(builder)
}

fn apply_model_flags(builder: Builder, args: &ModelArgs) -> Result<Builder> {
    Ok(builder
        .set_override_option("model", args.model.clone())?
        .set_override_option("folder", args.folder.clone())?
        .set_override_option("explore", args.explore)?
        .set_override_option("interpolate", args.interpolate)?
        .set_override_option("upscale", args.upscale)?
        .set_override_option("watermark", args.watermark)?)
}

/// Require a path setting, naming the flag when it is missing.
pub fn required_path<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a Path> {
    value
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| anyhow!("{} is required", flag))
}
