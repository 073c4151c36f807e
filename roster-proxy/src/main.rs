use std::{env, sync::Arc};

use anyhow::Context;
use tokio::{net::TcpListener, signal};

mod cache;
mod cli;
mod error;
mod planner;
mod routes;
mod rules_file;
mod store;
mod vision;

use cli::Credentials;
use planner::Planner;
use routes::AppState;
use rules_file::RulesFile;
use store::{EventStore, MemoryStore, SupabaseStore};
use vision::VisionClient;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "roster_proxy=info,roster_parser=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
    }
    log::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    setup_logging();

    let credentials = Credentials::from_env();

    let store: Arc<dyn EventStore> = match &credentials.supabase {
        Some((url, key)) => {
            log::info!("Storing events in Supabase at {url}");
            Arc::new(SupabaseStore::new(url, key.as_str()))
        }
        None => {
            log::warn!("Supabase is not configured, events only live in memory");
            Arc::new(MemoryStore::default())
        }
    };

    if credentials.openai_api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set, roster analysis will fail");
    }

    let state = AppState {
        vision: Arc::new(VisionClient::new(
            credentials.openai_api_key,
            &credentials.openai_base_url,
            args.model,
        )),
        planner: Arc::new(Planner::new(store)),
        rules: Arc::new(RulesFile::new(args.rules_file)),
        cache: Arc::new(cache::AnalysisCache::new(cache::Config {
            enabled: args.enable_cache,
            ttl: args.cache_ttl,
        })),
    };

    let router = routes::router(state, args.body_limit);

    let listener = TcpListener::bind(args.address)
        .await
        .with_context(|| format!("failed to bind {}", args.address))?;
    log::info!("Listening at http://{}", args.address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}
