use autoplaza::accounts::services::bootstrap_admin;
use autoplaza::app::{build_app, serve};
use autoplaza::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "autoplaza=debug,axum=info,tower_http=info".to_string());
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

    let state = AppState::init().await?;

    if let Err(e) = bootstrap_admin(&*state.store, &state.config).await {
        tracing::warn!(error = %e, "admin bootstrap failed; continuing");
    }

    let app = build_app(state);
    serve(app).await
}
