use crate::assets::{AssetKind, AssetUpload, AssetUploader};
use crate::config::ApiConfig;
use crate::error::{AssetError, SequenceError};
use crate::pipeline::{SequenceIngestor, SequenceUpload};
use crate::response::{AssetResponse, PublicUrlResponse, SequenceResponse};
use anyhow::{Context, Result};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<SequenceIngestor>,
    pub assets: Arc<AssetUploader>,
    pub max_body_bytes: usize,
}

/// File part of a multipart form
#[derive(Debug)]
struct UploadedFile {
    file_name: Option<String>,
    data: Bytes,
}

/// Multipart form with one `file` part and any number of text fields
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "file" {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                form.file = Some(UploadedFile { file_name, data });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl From<MultipartError> for SequenceError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            SequenceError::PayloadTooLarge(err.body_text())
        } else if status.is_client_error() {
            SequenceError::MalformedRequest(err.body_text())
        } else {
            SequenceError::Unknown(err.body_text())
        }
    }
}

impl From<MultipartError> for AssetError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AssetError::PayloadTooLarge(err.body_text())
        } else if status.is_client_error() {
            AssetError::MalformedRequest(err.body_text())
        } else {
            AssetError::Unknown(err.body_text())
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/upload-sequence", post(upload_sequence))
        .route("/api/upload-asset", post(upload_asset))
        .route("/api/assets/cv", get(cv_url))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sequence-service"
    }))
}

/// Accept a zip of frames and store it as a device sequence
#[instrument(skip(state, multipart))]
async fn upload_sequence(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SequenceResponse>, SequenceError> {
    metrics::counter!("sequence.requests").increment(1);

    let form = match UploadForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            let err = SequenceError::from(e);
            warn!(error = %err, code = err.code(), "Unreadable sequence upload");
            metrics::counter!("sequence.requests.failed").increment(1);
            return Err(err);
        }
    };

    let (Some(file), Some(device_name)) = (form.file.as_ref(), form.field("deviceName")) else {
        warn!("Sequence upload without file or device name");
        return Err(SequenceError::MissingInput);
    };

    let upload = SequenceUpload {
        device_name: device_name.to_string(),
        archive: file.data.clone(),
    };

    match state.ingestor.ingest(upload).await {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => {
            warn!(error = %e, code = e.code(), "Sequence upload rejected");
            metrics::counter!("sequence.requests.failed").increment(1);
            Err(e)
        }
    }
}

/// Accept a single admin asset
#[instrument(skip(state, multipart))]
async fn upload_asset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AssetResponse>, AssetError> {
    let form = UploadForm::read(&mut multipart).await?;

    let (Some(file), Some(kind)) = (form.file, form.fields.get("kind")) else {
        return Err(AssetError::MissingInput);
    };

    let upload = AssetUpload {
        kind: kind.parse::<AssetKind>()?,
        file_name: file.file_name.unwrap_or_default(),
        data: file.data,
    };

    let stored = state.assets.upload(upload).await?;
    Ok(Json(stored.into()))
}

/// Public address of the current CV
async fn cv_url(State(state): State<AppState>) -> Json<PublicUrlResponse> {
    Json(PublicUrlResponse {
        public_url: state.assets.cv_url(),
    })
}

/// Start the upload API server
pub async fn start_api_server(
    state: AppState,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting upload API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}
