mod commands;
mod config;
mod db;
mod dispatcher;
mod entities;
mod error;
mod models;
mod routes;
mod sort;
mod store;
mod templates;
mod tokenizer;

use std::sync::Arc;

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::{config::Config, dispatcher::Dispatcher, store::WatchlistStore};

pub struct AppState {
    pub dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,watchlist=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = WatchlistStore::new(db, config.store_timeout, config.rating_policy);
    let dispatcher =
        Dispatcher::new(store, config.command_prefix.clone(), config.contact_url.clone());

    let state = Arc::new(AppState { dispatcher });

    let app = Router::new()
        .route("/messages", post(routes::messages))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, prefix = %config.command_prefix, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
