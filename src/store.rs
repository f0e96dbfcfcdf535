//! Interfaces de almacenamiento del catálogo y de las consultas guardadas,
//! más una implementación en memoria.
//!
//! API pública:
//!   - `CatalogStore` (upsert de modelos y atributos, filas modelo/atributo).
//!   - `QueryStore` (CRUD de consultas guardadas por id).
//!   - `InMemoryStore`, que implementa ambas.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::{Attribute, Model, SavedQuery, SavedQueryListItem},
};

/// Almacén del catálogo de modelos y atributos.
///
/// Los upserts son atómicos por fila; el orden de las filas devueltas no
/// está garantizado.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn upsert_model(&self, model: &Model) -> Result<(), StoreError>;

    async fn upsert_attribute(&self, attribute: &Attribute) -> Result<(), StoreError>;

    /// Pares (nombre de modelo, nombre de atributo) de todos los atributos
    /// cuyo modelo existe.
    async fn list_model_attribute_rows(&self) -> Result<Vec<(String, String)>, StoreError>;
}

/// Almacén de consultas guardadas.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Listado ordenado por nombre.
    async fn list_queries(&self) -> Result<Vec<SavedQueryListItem>, StoreError>;

    async fn get_query(&self, id: i64) -> Result<SavedQuery, StoreError>;

    /// Crea una consulta y devuelve su id. El nombre debe ser único.
    async fn create_query(&self, name: &str, query_string: &str) -> Result<i64, StoreError>;

    async fn update_query(&self, id: i64, name: &str, query_string: &str)
        -> Result<(), StoreError>;

    async fn delete_query(&self, id: i64) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryData {
    models: HashMap<String, Model>,
    // Clave: (model_id, attribute_id).
    attributes: HashMap<(String, String), Attribute>,
    queries: HashMap<i64, SavedQuery>,
    next_query_id: i64,
}

/// Almacén en memoria; los datos se pierden al terminar el proceso.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl InMemoryStore {
    pub async fn model_count(&self) -> usize {
        self.data.read().await.models.len()
    }

    pub async fn attribute_count(&self) -> usize {
        self.data.read().await.attributes.len()
    }
}

fn name_taken(data: &MemoryData, name: &str, except: Option<i64>) -> bool {
    data.queries
        .values()
        .any(|q| q.name == name && Some(q.id) != except)
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn upsert_model(&self, model: &Model) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.models.insert(model.id.clone(), model.clone());
        Ok(())
    }

    async fn upsert_attribute(&self, attribute: &Attribute) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.attributes.insert(
            (attribute.model_id.clone(), attribute.id.clone()),
            attribute.clone(),
        );
        Ok(())
    }

    async fn list_model_attribute_rows(&self) -> Result<Vec<(String, String)>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .attributes
            .values()
            .filter_map(|attr| {
                data.models
                    .get(&attr.model_id)
                    .map(|model| (model.name.clone(), attr.name.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl QueryStore for InMemoryStore {
    async fn list_queries(&self) -> Result<Vec<SavedQueryListItem>, StoreError> {
        let data = self.data.read().await;
        let mut items: Vec<SavedQueryListItem> = data
            .queries
            .values()
            .map(|q| SavedQueryListItem {
                id: q.id,
                name: q.name.clone(),
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_query(&self, id: i64) -> Result<SavedQuery, StoreError> {
        self.data
            .read()
            .await
            .queries
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("consulta {id}")))
    }

    async fn create_query(&self, name: &str, query_string: &str) -> Result<i64, StoreError> {
        let mut data = self.data.write().await;
        if name_taken(&data, name, None) {
            return Err(StoreError::Conflict(format!(
                "ya existe una consulta llamada '{name}'"
            )));
        }

        data.next_query_id += 1;
        let id = data.next_query_id;
        let now = Utc::now().to_rfc3339();
        data.queries.insert(
            id,
            SavedQuery {
                id,
                name: name.to_string(),
                query_string: query_string.to_string(),
                created_at: now.clone(),
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_query(
        &self,
        id: i64,
        name: &str,
        query_string: &str,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if !data.queries.contains_key(&id) {
            return Err(StoreError::NotFound(format!("consulta {id}")));
        }
        if name_taken(&data, name, Some(id)) {
            return Err(StoreError::Conflict(format!(
                "ya existe una consulta llamada '{name}'"
            )));
        }

        if let Some(query) = data.queries.get_mut(&id) {
            query.name = name.to_string();
            query.query_string = query_string.to_string();
            query.updated_at = Utc::now().to_rfc3339();
        }
        Ok(())
    }

    async fn delete_query(&self, id: i64) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.queries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("consulta {id}")))
    }
}
