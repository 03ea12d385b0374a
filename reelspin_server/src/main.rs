use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reelspin_core::{random_server_seed, EngineParams, GameSession, ProvablyFairRng};

mod routes;

use routes::{create_router, AppState};

#[derive(Parser)]
#[command(name = "reelspin-server", about = "Serve one reelspin session over HTTP")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "127.0.0.1:8080")]
    bind: String,
    /// Secret server seed; a random one is generated when absent
    #[arg(long, env = "SERVER_SEED")]
    server_seed: Option<String>,
    #[arg(long, env = "CLIENT_SEED", default_value = "reelspin")]
    client_seed: String,
    /// Bearer token for /admin routes; the default is for local development only
    #[arg(long, env = "API_KEY", default_value = "dev-key")]
    api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let session =
        GameSession::new(EngineParams::default_3x3()).context("machine configuration")?;
    let server_seed = cli.server_seed.unwrap_or_else(random_server_seed);
    let rng = ProvablyFairRng::new(server_seed, cli.client_seed, 0);
    info!(server_seed_hash = %rng.server_seed_hash_hex(), "session ready");

    let state = Arc::new(AppState::new(session, rng, cli.api_key));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    info!("listening on {}", cli.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
