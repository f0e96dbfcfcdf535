//! Almacén del catálogo y de las consultas guardadas sobre Neo4j.
//!
//! Grafo:
//!   (:Model {id, name})-[:HAS_ATTRIBUTE]->(:Attribute {id, model_id, name, original_key})
//!   (:SavedQuery {id, name, query_string, created_at, updated_at})
//!   (:Counter {name, value}) genera los ids numéricos de las consultas.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use neo4rs::{query, Graph, Query, Row};

use crate::{
    error::StoreError,
    models::{Attribute, Model, SavedQuery, SavedQueryListItem},
    store::{CatalogStore, QueryStore},
};

#[derive(Clone)]
pub struct Neo4jStore {
    graph: Arc<Graph>,
}

impl Neo4jStore {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Ejecuta una consulta y devuelve su primera fila, si la hay.
    async fn fetch_one(&self, q: Query) -> Result<Option<Row>, StoreError> {
        let mut cursor = self.graph.execute(q).await?;
        Ok(cursor.next().await?)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i64>) -> Result<(), StoreError> {
        let row = self
            .fetch_one(
                query(
                    "MATCH (q:SavedQuery {name: $name})
                     WHERE q.id <> $except
                     RETURN q.id AS id",
                )
                .param("name", name)
                .param("except", except.unwrap_or(-1)),
            )
            .await?;

        match row {
            Some(_) => Err(StoreError::Conflict(format!(
                "ya existe una consulta llamada '{name}'"
            ))),
            None => Ok(()),
        }
    }
}

/// Convierte un campo ausente de una fila en error del backend.
fn required<T>(value: Option<T>, field: &str) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::Backend(format!("Falta campo '{field}' en resultado de Neo4j")))
}

#[async_trait]
impl CatalogStore for Neo4jStore {
    async fn upsert_model(&self, model: &Model) -> Result<(), StoreError> {
        self.graph
            .run(
                query("MERGE (m:Model {id: $id}) SET m.name = $name")
                    .param("id", model.id.clone())
                    .param("name", model.name.clone()),
            )
            .await?;
        Ok(())
    }

    async fn upsert_attribute(&self, attribute: &Attribute) -> Result<(), StoreError> {
        self.graph
            .run(
                query(
                    "MERGE (a:Attribute {model_id: $model_id, id: $id})
                     SET a.name = $name, a.original_key = $original_key
                     WITH a MATCH (m:Model {id: $model_id}) MERGE (m)-[:HAS_ATTRIBUTE]->(a)",
                )
                .param("id", attribute.id.clone())
                .param("model_id", attribute.model_id.clone())
                .param("name", attribute.name.clone())
                .param("original_key", attribute.original_key.clone()),
            )
            .await?;
        Ok(())
    }

    async fn list_model_attribute_rows(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut cursor = self
            .graph
            .execute(query(
                "MATCH (m:Model)-[:HAS_ATTRIBUTE]->(a:Attribute)
                 RETURN m.name AS model, a.name AS attribute",
            ))
            .await?;

        let mut rows = Vec::new();
        while let Some(row) = cursor.next().await? {
            if let (Some(model), Some(attribute)) =
                (row.get::<String>("model"), row.get::<String>("attribute"))
            {
                rows.push((model, attribute));
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl QueryStore for Neo4jStore {
    async fn list_queries(&self) -> Result<Vec<SavedQueryListItem>, StoreError> {
        let mut cursor = self
            .graph
            .execute(query(
                "MATCH (q:SavedQuery) RETURN q.id AS id, q.name AS name ORDER BY name",
            ))
            .await?;

        let mut items = Vec::new();
        while let Some(row) = cursor.next().await? {
            items.push(SavedQueryListItem {
                id: required(row.get("id"), "id")?,
                name: required(row.get("name"), "name")?,
            });
        }
        Ok(items)
    }

    async fn get_query(&self, id: i64) -> Result<SavedQuery, StoreError> {
        let row = self
            .fetch_one(
                query(
                    "MATCH (q:SavedQuery {id: $id})
                     RETURN q.id AS id, q.name AS name, q.query_string AS query_string,
                            q.created_at AS created_at, q.updated_at AS updated_at",
                )
                .param("id", id),
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("consulta {id}")))?;

        Ok(SavedQuery {
            id: required(row.get("id"), "id")?,
            name: required(row.get("name"), "name")?,
            query_string: required(row.get("query_string"), "query_string")?,
            created_at: required(row.get("created_at"), "created_at")?,
            updated_at: required(row.get("updated_at"), "updated_at")?,
        })
    }

    async fn create_query(&self, name: &str, query_string: &str) -> Result<i64, StoreError> {
        self.ensure_name_free(name, None).await?;

        let now = Utc::now().to_rfc3339();
        let row = self
            .fetch_one(
                query(
                    "MERGE (c:Counter {name: 'saved_query'})
                     ON CREATE SET c.value = 0
                     SET c.value = c.value + 1
                     WITH c.value AS id
                     CREATE (q:SavedQuery {id: id, name: $name, query_string: $query_string,
                                           created_at: $now, updated_at: $now})
                     RETURN id",
                )
                .param("name", name)
                .param("query_string", query_string)
                .param("now", now),
            )
            .await?
            .ok_or_else(|| StoreError::Backend("La creación no devolvió id".to_string()))?;

        required(row.get("id"), "id")
    }

    async fn update_query(
        &self,
        id: i64,
        name: &str,
        query_string: &str,
    ) -> Result<(), StoreError> {
        self.ensure_name_free(name, Some(id)).await?;

        let row = self
            .fetch_one(
                query(
                    "MATCH (q:SavedQuery {id: $id})
                     SET q.name = $name, q.query_string = $query_string, q.updated_at = $now
                     RETURN q.id AS id",
                )
                .param("id", id)
                .param("name", name)
                .param("query_string", query_string)
                .param("now", Utc::now().to_rfc3339()),
            )
            .await?;

        row.map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("consulta {id}")))
    }

    async fn delete_query(&self, id: i64) -> Result<(), StoreError> {
        let row = self
            .fetch_one(
                query(
                    "MATCH (q:SavedQuery {id: $id})
                     WITH q, q.id AS id
                     DETACH DELETE q
                     RETURN id",
                )
                .param("id", id),
            )
            .await?;

        row.map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("consulta {id}")))
    }
}
