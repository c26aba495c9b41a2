mod app;
mod calories;
mod config;
mod drafts;
mod error;
mod home;
mod meals;
mod state;
mod storage;

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "meal_manager=debug,axum=info,tower_http=info".to_string());
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => subscriber.with_target(false).json().init(),
        _ => subscriber.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = state::AppState::init().await?;
    let addr = state.config.listen_addr()?;
    app::serve(app::build_app(state), addr).await
}
