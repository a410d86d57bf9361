use std::path::Path;

mod app;
mod auth;
mod config;
mod rpc;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userhub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Fatal when config or the database is unavailable.
    let state = state::AppState::init().await?;

    rpc::schema::emit(Path::new("schema.json"))?;
    tracing::info!("schema written to schema.json");

    let config = state.config.clone();
    let app = app::build_app(state);
    app::serve(app, &config).await
}
