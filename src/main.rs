// Módulos de la aplicación
mod api;
mod app_state;
mod catalog;
mod config;
mod document;
mod error;
mod graph_store;
mod ingest;
mod models;
mod neo4j_client;
mod store;
mod transcode;

use std::sync::Arc;

use crate::app_state::AppState;
use crate::config::StoreBackend;
use crate::graph_store::Neo4jStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env()?;

    // 3. Preparar el almacén (Neo4j con esquema asegurado, o memoria)
    let app_state = match (&cfg.store_backend, &cfg.neo4j) {
        (StoreBackend::Neo4j, Some(neo4j_cfg)) => {
            let graph = neo4j_client::connect_from_config(neo4j_cfg).await?;
            neo4j_client::ensure_schema(&graph).await?;
            let store = Arc::new(Neo4jStore::new(Arc::new(graph)));
            AppState {
                config: cfg.clone(),
                catalog: store.clone(),
                queries: store,
            }
        }
        (StoreBackend::Neo4j, None) => {
            anyhow::bail!("Backend Neo4j seleccionado sin credenciales de conexión")
        }
        (StoreBackend::Memory, _) => {
            info!("Usando almacén en memoria; los datos se perderán al cerrar.");
            AppState::in_memory(cfg.clone())
        }
    };

    // 4. Configurar el router de la API y, si existe, la interfaz estática
    let app = api::with_frontend(api::create_router(app_state), cfg.frontend_dir.as_deref())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 5. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr).await?;
    info!("🚀 Servidor escuchando en http://{}", cfg.server_addr);

    // Apagado ordenado con Ctrl-C.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
