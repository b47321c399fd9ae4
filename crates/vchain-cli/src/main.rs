//! vchain binary.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vchain_cli::{commands, init_tracing, Cli, Command, Settings};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();

    if matches!(cli.command, Command::Version) {
        return commands::run(&cli.command, &Settings::default(), CancellationToken::new(), &mut stdout)
            .await;
    }

    // Already installed is fine
    rustls::crypto::ring::default_provider().install_default().ok();
    dotenvy::dotenv().ok();

    let settings = Settings::load(&cli)?;
    init_tracing(settings.debug);
    debug!(model = %settings.model, wait = settings.wait, "Settings loaded");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling");
            signal_token.cancel();
        }
    });

    commands::run(&cli.command, &settings, cancel, &mut stdout).await
}
