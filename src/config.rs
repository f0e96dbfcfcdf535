//! Carga y gestión de configuración de la aplicación (almacén + servidor).

use std::env;
use anyhow::{anyhow, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Neo4j,
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "memory" | "memoria" => Ok(Self::Memory),
            other => Err(anyhow!("Backend de almacenamiento no soportado: {other}")),
        }
    }
}

/// Credenciales de Neo4j; sólo existen cuando el backend es `neo4j`.
#[derive(Clone, Debug)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub neo4j: Option<Neo4jConfig>,
    pub server_addr: String,
    pub schema_path: String,
    /// Directorio de la interfaz estática; sin valor no se sirve ninguna.
    pub frontend_dir: Option<String>,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de variables.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend_str = lookup("STORE_BACKEND").unwrap_or_else(|| "neo4j".to_string());
        let store_backend = StoreBackend::from_str(&store_backend_str)?;

        let neo4j = match store_backend {
            StoreBackend::Neo4j => {
                let uri = lookup("NEO4J_URI")
                    .ok_or_else(|| anyhow!("Falta NEO4J_URI en el entorno"))?;
                let user = lookup("NEO4J_USER")
                    .ok_or_else(|| anyhow!("Falta NEO4J_USER en el entorno"))?;
                let password = lookup("NEO4J_PASSWORD")
                    .ok_or_else(|| anyhow!("Falta NEO4J_PASSWORD en el entorno"))?;
                Some(Neo4jConfig { uri, user, password })
            }
            StoreBackend::Memory => None,
        };

        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let schema_path =
            lookup("SCHEMA_PATH").unwrap_or_else(|| "sample/DBSchemaFile.cdm".to_string());
        let frontend_dir = lookup("FRONTEND_DIR").filter(|dir| !dir.trim().is_empty());

        Ok(Self {
            store_backend,
            neo4j,
            server_addr,
            schema_path,
            frontend_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn memory_backend_needs_no_neo4j_credentials() {
        let env = vars(&[("STORE_BACKEND", "memory")]);
        let cfg = AppConfig::from_vars(|k| env.get(k).cloned()).unwrap();

        assert_eq!(cfg.store_backend, StoreBackend::Memory);
        assert!(cfg.neo4j.is_none());
        assert_eq!(cfg.server_addr, "127.0.0.1:8080");
        assert_eq!(cfg.schema_path, "sample/DBSchemaFile.cdm");
        assert!(cfg.frontend_dir.is_none());
    }

    #[test]
    fn neo4j_is_the_default_and_requires_uri() {
        let env = vars(&[("NEO4J_USER", "neo4j"), ("NEO4J_PASSWORD", "secret")]);
        let err = AppConfig::from_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("NEO4J_URI"));
    }

    #[test]
    fn neo4j_credentials_and_overrides_are_read() {
        let env = vars(&[
            ("NEO4J_URI", "bolt://db:7687"),
            ("NEO4J_USER", "neo4j"),
            ("NEO4J_PASSWORD", "secret"),
            ("SERVER_ADDR", "0.0.0.0:9000"),
            ("SCHEMA_PATH", "/data/schema.cdm"),
            ("FRONTEND_DIR", "ui/dist"),
        ]);
        let cfg = AppConfig::from_vars(|k| env.get(k).cloned()).unwrap();

        assert_eq!(cfg.store_backend, StoreBackend::Neo4j);
        let neo4j = cfg.neo4j.unwrap();
        assert_eq!(neo4j.uri, "bolt://db:7687");
        assert_eq!(neo4j.password, "secret");
        assert_eq!(cfg.server_addr, "0.0.0.0:9000");
        assert_eq!(cfg.schema_path, "/data/schema.cdm");
        assert_eq!(cfg.frontend_dir.as_deref(), Some("ui/dist"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(StoreBackend::from_str("sqlite").is_err());
        assert_eq!(StoreBackend::from_str(" Memory ").unwrap(), StoreBackend::Memory);
    }
}
