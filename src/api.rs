use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::{
    app_state::AppState,
    catalog,
    error::StoreError,
    ingest,
    models::{ModelWithAttributes, SavedQuery, SavedQueryListItem, StructuredQuery},
    transcode,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct ParseQueryPayload {
    query_string: String,
}

#[derive(Deserialize)]
pub struct SavedQueryPayload {
    name: String,
    #[serde(default)]
    query_string: String,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    id: i64,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/parse-query", post(parse_query_handler))
        .route("/load-schema", post(load_schema_handler))
        .route("/models", get(models_handler))
        .route("/queries", get(list_queries_handler).post(create_query_handler))
        .route(
            "/queries/:id",
            get(get_query_handler)
                .put(update_query_handler)
                .delete(delete_query_handler),
        )
        .route("/health", get(health_handler))
        .with_state(app_state)
}

/// Añade la interfaz estática como fallback si el directorio existe.
pub fn with_frontend(router: Router, frontend_dir: Option<&str>) -> Router {
    match frontend_dir {
        Some(dir) if std::path::Path::new(dir).is_dir() => {
            info!("Sirviendo la interfaz desde {}", dir);
            router.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            warn!("El directorio de la interfaz {} no existe; sólo se expone la API.", dir);
            router
        }
        None => router,
    }
}

// --- Utilidades de error ---

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        format!("Cuerpo de la petición inválido: {}", rejection.body_text()),
    )
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => api_error(StatusCode::NOT_FOUND, err.to_string()),
        StoreError::Conflict(_) => api_error(StatusCode::CONFLICT, err.to_string()),
        StoreError::Backend(_) => {
            error!("Error del almacén: {}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

// --- Handlers de transcodificación ---

#[axum::debug_handler]
async fn generate_handler(
    payload: Result<Json<StructuredQuery>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(query) = payload.map_err(invalid_body)?;

    let text = transcode::encode_to_text(&query).map_err(|e| {
        error!("Error generando el documento YAML: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error al generar el YAML: {}", e),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "application/x-yaml")], text))
}

#[axum::debug_handler]
async fn parse_query_handler(
    payload: Result<Json<ParseQueryPayload>, JsonRejection>,
) -> Result<Json<StructuredQuery>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;

    transcode::decode_text(&payload.query_string)
        .map(Json)
        .map_err(|e| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Error al interpretar el YAML: {}", e),
            )
        })
}

// --- Handlers del catálogo ---

#[axum::debug_handler]
async fn load_schema_handler(State(state): State<AppState>) -> Result<String, ApiError> {
    let path = &state.config.schema_path;
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        error!("No se pudo leer el esquema {}: {}", path, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("No se pudo leer el fichero de esquema: {}", e),
        )
    })?;

    let schema = ingest::parse_schema(&text).map_err(|e| {
        error!("Esquema inválido en {}: {}", path, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error al interpretar el esquema: {}", e),
        )
    })?;

    info!("Cargando esquema desde {} ({} modelos)...", path, schema.len());
    let summary = ingest::ingest_schema(state.catalog.as_ref(), &schema).await;
    Ok(summary.to_string())
}

#[axum::debug_handler]
async fn models_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModelWithAttributes>>, ApiError> {
    catalog::read_catalog(state.catalog.as_ref())
        .await
        .map(Json)
        .map_err(store_error)
}

// --- Handlers de consultas guardadas ---

#[axum::debug_handler]
async fn list_queries_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedQueryListItem>>, ApiError> {
    state.queries.list_queries().await.map(Json).map_err(store_error)
}

#[axum::debug_handler]
async fn get_query_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SavedQuery>, ApiError> {
    state.queries.get_query(id).await.map(Json).map_err(store_error)
}

#[axum::debug_handler]
async fn create_query_handler(
    State(state): State<AppState>,
    payload: Result<Json<SavedQueryPayload>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    if payload.name.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "El nombre de la consulta es obligatorio.",
        ));
    }

    let id = state
        .queries
        .create_query(&payload.name, &payload.query_string)
        .await
        .map_err(store_error)?;
    info!("Consulta '{}' guardada con id {}.", payload.name, id);
    Ok(Json(CreatedResponse { id }))
}

#[axum::debug_handler]
async fn update_query_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<SavedQueryPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    if payload.name.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "El nombre de la consulta es obligatorio.",
        ));
    }

    state
        .queries
        .update_query(id, &payload.name, &payload.query_string)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
async fn delete_query_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.queries.delete_query(id).await.map_err(store_error)?;
    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
