use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use taskbox_server::api::{self, AppState};
use taskbox_server::settings::Settings;
use taskbox_server::store::Store;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // ── Logging ────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Settings + store ───────────────────────────────────────
    let settings = Settings::load().expect("Failed to load settings");

    let store = Store::open(&settings.database_path).expect("Failed to open database");

    if store
        .ensure_default_list()
        .expect("Failed to seed default list")
    {
        tracing::info!("Created default list \"Inbox\"");
    }

    // ── Router ─────────────────────────────────────────────────
    let app = api::router(Arc::new(AppState { store }))
        // Static files (the built frontend)
        .fallback_service(
            ServeDir::new(&settings.static_dir).append_index_html_on_directories(true),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // ── Start ──────────────────────────────────────────────────
    let ip: IpAddr = settings
        .bind_address
        .parse()
        .expect("Invalid bind_address in settings");
    let addr = SocketAddr::new(ip, settings.port);
    tracing::info!("Server running on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
