//! HTTP surface for the conversion service
//!
//! One substantive route: `GET /export`, guarded by basic auth, which runs
//! the whole fetch-transform-deliver pipeline for the annotation named in
//! the request headers. `GET /health` is an unauthenticated liveness probe.

use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use tracing::{info, info_span, Instrument as _};
use uuid::Uuid;

use docshape_core::{pipeline, CaptureClient, Upstream};

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: ServerConfig,
    pub upstream: Arc<dyn Upstream>,
}

/// The conversion service bound to its configuration.
pub struct ConversionServer {
    state: web::Data<AppState>,
}

impl ConversionServer {
    /// Build the server and its capture API client.
    pub fn new(config: ServerConfig) -> docshape_core::Result<Self> {
        let upstream = CaptureClient::new(config.capture.clone())?;
        Ok(Self {
            state: web::Data::new(AppState {
                config,
                upstream: Arc::new(upstream),
            }),
        })
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(self) -> std::io::Result<()> {
        let state = self.state;
        let bind_address = state.config.bind_address.clone();
        info!(%bind_address, "starting conversion server");

        HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
            .bind(&bind_address)?
            .run()
            .await
    }
}

/// Route table, shared between the server and the endpoint tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/export", web::get().to(export))
        .route("/health", web::get().to(health));
}

async fn export(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    verify_credentials(&req, &state.config)?;

    let annotation_id = required_header(&req, "annotation-id")?;
    let queue_id = required_header(&req, "queue-id")?;

    let request_id = Uuid::new_v4();
    let span = info_span!("export", %request_id, annotation_id, queue_id);
    pipeline::run_export(
        state.upstream.as_ref(),
        state.config.capture_token.as_deref(),
        queue_id,
        annotation_id,
    )
    .instrument(span)
    .await?;

    Ok(HttpResponse::Ok().json(json!({"success": true})))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Check the request's basic auth against the configured credentials.
fn verify_credentials(req: &HttpRequest, config: &ServerConfig) -> Result<(), ApiError> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::InvalidCredentials)?;

    let encoded = header
        .strip_prefix("Basic ")
        .ok_or(ApiError::InvalidCredentials)?;
    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(ApiError::InvalidCredentials)?;
    let (username, password) = decoded.split_once(':').ok_or(ApiError::InvalidCredentials)?;

    if username != config.basic_auth_username || password != config.basic_auth_password {
        return Err(ApiError::InvalidCredentials);
    }
    Ok(())
}

fn required_header<'a>(req: &'a HttpRequest, name: &'static str) -> Result<&'a str, ApiError> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::MissingHeader { header: name })
}
