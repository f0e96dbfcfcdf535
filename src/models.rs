//! Modelos de dominio (catálogo de modelos/atributos, filtros y consultas guardadas).

use serde::{Deserialize, Serialize};

/// Representa un modelo del catálogo, derivado de un fichero de esquema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: String,
    pub name: String,
}

/// Representa un atributo de un modelo.
/// `original_key` conserva la ruta con puntos de la que se derivó el nombre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: String,
    pub model_id: String,
    pub name: String,
    pub original_key: String,
}

/// Entrada del catálogo tal y como se expone a la interfaz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelWithAttributes {
    pub name: String,
    pub attributes: Vec<String>,
}

/// Un filtro del constructor: `atributo condición valor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub attribute: String,
    pub condition: String,
    pub condition_value: String,
}

/// Consulta estructurada: función, modelo y lista de filtros en conjunción.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// Consulta guardada completa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: i64,
    pub name: String,
    pub query_string: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Elemento del listado de consultas guardadas (sólo id y nombre).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQueryListItem {
    pub id: i64,
    pub name: String,
}
