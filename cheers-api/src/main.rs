mod routes;

use cheers_app::{AppConfig, AppContext};
use tower_http::compression::CompressionLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env();

    let app_context = match AppContext::from_config(&config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Failed to initialize toast repository: {}", e);
            std::process::exit(1);
        }
    };

    let app = routes::router(app_context).layer(CompressionLayer::new());

    tracing::info!("Listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
