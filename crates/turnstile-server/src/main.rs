mod args;

use std::process::ExitCode;

use args::Args;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use turnstile::prelude::*;

fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(false)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), TurnstileError> {
    // An inconsistent game set must never be served.
    let games = GameRegistry::load_dir(&args.games_dir)?;
    info!(
        count = games.len(),
        dir = %args.games_dir.display(),
        "game definitions loaded"
    );

    let server = TurnstileServer::builder()
        .bind(&args.bind_addr().to_string())
        .games(games)
        .build()
        .await?;
    server.run().await
}
