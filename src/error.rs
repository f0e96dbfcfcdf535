//! Tipos de error de las costuras del sistema (almacén, documentos, esquema).

use thiserror::Error;

/// Errores de los almacenes de catálogo y de consultas guardadas.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no encontrado: {0}")]
    NotFound(String),

    #[error("conflicto: {0}")]
    Conflict(String),

    /// Fallo del backend subyacente (conexión, consulta Cypher, ...).
    #[error("error del backend: {0}")]
    Backend(String),
}

impl StoreError {
    /// Clasifica el mensaje de un fallo de Neo4j. Las violaciones de
    /// constraints de unicidad son conflictos; el resto, fallos del backend.
    pub fn from_neo4j_message(message: String) -> Self {
        if message.contains("ConstraintValidationFailed") || message.contains("already exists with") {
            StoreError::Conflict(message)
        } else {
            StoreError::Backend(message)
        }
    }
}

impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        StoreError::from_neo4j_message(err.to_string())
    }
}

/// Errores al interpretar el texto de un documento de consulta.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("YAML inválido: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("la raíz del documento no es un mapa")]
    NotAMapping,
}

/// Errores al interpretar un fichero de esquema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("esquema inválido: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
