use crate::config::Neo4jConfig;
use anyhow::Result;
use neo4rs::{query, Graph};
use tracing::info;
use url::Url;

pub async fn connect_from_config(cfg: &Neo4jConfig) -> Result<Graph> {
    let url = Url::parse(&cfg.uri)?;
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(7687);
    let addr = format!("{host}:{port}");

    info!("Conectando a Neo4j en {addr}...");
    let graph = Graph::new(&addr, &cfg.user, &cfg.password).await?;
    info!("Conexión a Neo4j OK");
    Ok(graph)
}

/// Crea constraints e índices para las etiquetas usadas en el grafo:
/// :Model, :Attribute, :SavedQuery y :Counter
pub async fn ensure_schema(graph: &Graph) -> Result<()> {
    let statements = [
        // Model.id único
        "CREATE CONSTRAINT model_id IF NOT EXISTS
         FOR (m:Model)
         REQUIRE m.id IS UNIQUE",
        // Los atributos se identifican por (model_id, id)
        "CREATE INDEX attribute_key IF NOT EXISTS
         FOR (a:Attribute)
         ON (a.model_id, a.id)",
        // SavedQuery.id y SavedQuery.name únicos
        "CREATE CONSTRAINT saved_query_id IF NOT EXISTS
         FOR (q:SavedQuery)
         REQUIRE q.id IS UNIQUE",
        "CREATE CONSTRAINT saved_query_name IF NOT EXISTS
         FOR (q:SavedQuery)
         REQUIRE q.name IS UNIQUE",
        // Contadores de ids
        "CREATE CONSTRAINT counter_name IF NOT EXISTS
         FOR (c:Counter)
         REQUIRE c.name IS UNIQUE",
    ];

    for stmt in statements {
        graph.run(query(stmt)).await?;
    }

    info!("Esquema de Neo4j asegurado (constraints e índices creados).");
    Ok(())
}
