//! Command-line front end for chained video generation.

pub mod cli;
pub mod commands;
pub mod settings;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use cli::{Cli, Command};
pub use settings::Settings;

/// Install the global subscriber. Logs go to stderr, command output to
/// stdout. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(debug: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let level = if debug { "debug" } else { "info" };
    let mut env_filter = EnvFilter::from_default_env();
    for crate_name in ["vchain", "vchain_client", "vchain_media", "vchain_pipeline"] {
        if let Ok(directive) = format!("{}={}", crate_name, level).parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
