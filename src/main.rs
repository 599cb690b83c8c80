use actix_web::{web, App, HttpServer, middleware};

mod config;
mod error;
mod gemini;
mod handler;

use config::Config;
use gemini::GeminiClient;

pub struct AppState {
    pub config: Config,
    pub gemini: GeminiClient,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_image_proxy=debug,actix_web=info".into()),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::io::Error::other(e)
    })?;
    let port = config.port;

    tracing::info!("gemini-image-proxy starting");
    tracing::info!("  Upstream: {}", config.gemini_api_base);
    tracing::info!("  Model: {}", config.gemini_model);
    tracing::info!("  Max body: {} bytes", config.max_body_bytes);
    tracing::info!(
        "  Routes: {}, {}",
        handler::GENERATE_IMAGE_PATH,
        handler::NETLIFY_FUNCTION_PATH
    );
    if config.gemini_api_key.is_none() {
        tracing::warn!("  *** GEMINI_API_KEY is not set; every generate request will fail ***");
    }

    let gemini = GeminiClient::new(reqwest::Client::new(), &config);
    let state = web::Data::new(AppState { config, gemini });

    tracing::info!("Listening on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        let config = state.config.clone();
        App::new()
            .app_data(state.clone())
            .wrap(handler::cors_headers())
            .wrap(middleware::Logger::default())
            .configure(|cfg| handler::configure(cfg, &config))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    tracing::info!("Shutting down");
    Ok(())
}
