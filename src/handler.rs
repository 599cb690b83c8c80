use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::config::Config;
use crate::error::ProxyError;
use crate::gemini::GenerateContentRequest;

pub const GENERATE_IMAGE_PATH: &str = "/generate-image";
/// Path the browser front-ends of the serverless deployment already call.
pub const NETLIFY_FUNCTION_PATH: &str = "/.netlify/functions/generate-image";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    pub prompt: String,
    pub mime_type: String,
    pub image_data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateImageResponse {
    image_data: String,
}

/// Allow-origin on every response, including 405s and errors.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.app_data(web::PayloadConfig::new(config.max_body_bytes))
        .route("/health", web::get().to(health));

    for path in [GENERATE_IMAGE_PATH, NETLIFY_FUNCTION_PATH] {
        cfg.service(
            web::resource(path)
                .route(web::post().to(handle_generate_image))
                .route(web::method(Method::OPTIONS).to(handle_preflight))
                .default_service(web::to(handle_method_not_allowed)),
        );
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

async fn handle_preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type"))
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .finish()
}

async fn handle_method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .content_type("text/plain")
        .body("Method Not Allowed")
}

/// The body is taken as raw bytes so a malformed document becomes a JSON
/// error from this handler instead of the extractor's plain-text 400.
pub async fn handle_generate_image(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ProxyError> {
    let image_data = generate_image(&state, &body)
        .await
        .inspect_err(|e| tracing::error!("Server function error: {}", e))?;

    Ok(HttpResponse::Ok().json(GenerateImageResponse { image_data }))
}

async fn generate_image(state: &AppState, body: &[u8]) -> Result<String, ProxyError> {
    let request: GenerateImageRequest = serde_json::from_slice(body)?;

    let api_key = state
        .config
        .gemini_api_key
        .as_deref()
        .ok_or(ProxyError::MissingApiKey)?;

    tracing::info!(
        "Generating image with {} (prompt: {} chars, input: {}, {} base64 bytes)",
        state.gemini.model(),
        request.prompt.chars().count(),
        request.mime_type,
        request.image_data.len()
    );

    let upstream_request =
        GenerateContentRequest::image_edit(&request.prompt, &request.mime_type, &request.image_data);
    let image_data = state.gemini.generate_image(api_key, &upstream_request).await?;

    tracing::info!("Generated image ({} base64 bytes)", image_data.len());
    Ok(image_data)
}
