use std::sync::Arc;
use crate::{
    config::AppConfig,
    store::{CatalogStore, InMemoryStore, QueryStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<dyn CatalogStore>,
    pub queries: Arc<dyn QueryStore>,
}

impl AppState {
    /// Estado con un único almacén en memoria para catálogo y consultas.
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            config,
            catalog: store.clone(),
            queries: store,
        }
    }
}
