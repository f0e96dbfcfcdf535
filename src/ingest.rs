//! Ingesta de un fichero de esquema en el catálogo.
//!
//! El esquema es un mapa `modelo → (atributo → ruta con puntos)`. De cada
//! ruta (`Atomiton.DBA.ShapeFile.enterpriseId`) se derivan el nombre del
//! modelo (penúltimo segmento) y el del atributo (último segmento).

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::{
    error::SchemaError,
    models::{Attribute, Model},
    store::CatalogStore,
};

/// Valor centinela: el atributo no tiene correspondencia concreta.
pub const NO_MAPPING: &str = "$ncm";

const PATH_SEPARATOR: char = '.';

/// Documento de esquema ya interpretado. Los mapas ordenados fijan el orden
/// de recorrido, y con él qué ruta da nombre a cada modelo.
pub type SchemaDocument = BTreeMap<String, BTreeMap<String, String>>;

/// Resumen de los resultados de una operación de ingesta.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub models_seen: usize,
    pub models_stored: usize,
    pub models_skipped: usize,
    pub models_failed: usize,
    pub attributes_processed: usize,
    pub attributes_skipped: usize,
    pub attributes_failed: usize,
}

/// Implementa cómo se mostrará el resumen como texto.
impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Esquema cargado. Procesados {} atributos. Resumen: {} modelos leídos, {} almacenados, {} omitidos, {} con error; {} atributos omitidos, {} con error.",
            self.attributes_processed,
            self.models_seen,
            self.models_stored,
            self.models_skipped,
            self.models_failed,
            self.attributes_skipped,
            self.attributes_failed
        )
    }
}

/// Modelo derivado del esquema junto con sus atributos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedModel {
    pub model: Model,
    pub attributes: Vec<Attribute>,
    /// Atributos descartados (centinela o nombre vacío).
    pub skipped_attributes: usize,
}

/// Catálogo normalizado, previo a su persistencia.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DerivedCatalog {
    pub models: Vec<DerivedModel>,
    /// Ids de modelos sin ninguna ruta utilizable.
    pub unresolved_models: Vec<String>,
}

/// Interpreta el texto de un esquema. Un texto vacío es un esquema vacío.
pub fn parse_schema(text: &str) -> Result<SchemaDocument, SchemaError> {
    if text.trim().is_empty() {
        return Ok(SchemaDocument::new());
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Nombre del modelo: penúltimo segmento de la primera ruta con al menos
/// dos segmentos, recorriendo los atributos por orden de id.
pub fn derive_model_name(attributes: &BTreeMap<String, String>) -> Option<String> {
    attributes
        .values()
        .filter(|path| path.as_str() != NO_MAPPING)
        .find_map(|path| {
            let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
            if segments.len() >= 2 {
                Some(segments[segments.len() - 2].to_string())
            } else {
                None
            }
        })
}

/// Nombre del atributo: último segmento de la ruta. `None` para el centinela.
/// Una ruta vacía o terminada en `.` produce un nombre vacío.
pub fn derive_attribute_name(path: &str) -> Option<&str> {
    if path == NO_MAPPING {
        return None;
    }
    path.rsplit(PATH_SEPARATOR).next()
}

/// Deriva el catálogo completo sin tocar ningún almacén.
pub fn derive_catalog(schema: &SchemaDocument) -> DerivedCatalog {
    let mut catalog = DerivedCatalog::default();

    for (model_id, attributes) in schema {
        let Some(model_name) = derive_model_name(attributes) else {
            catalog.unresolved_models.push(model_id.clone());
            continue;
        };

        let mut derived = DerivedModel {
            model: Model {
                id: model_id.clone(),
                name: model_name,
            },
            attributes: Vec::new(),
            skipped_attributes: 0,
        };

        for (attribute_id, path) in attributes {
            match derive_attribute_name(path) {
                Some(name) if !name.is_empty() => derived.attributes.push(Attribute {
                    id: attribute_id.clone(),
                    model_id: model_id.clone(),
                    name: name.to_string(),
                    original_key: path.clone(),
                }),
                _ => derived.skipped_attributes += 1,
            }
        }

        catalog.models.push(derived);
    }

    catalog
}

/// Deriva el catálogo del esquema y lo persiste con upserts.
///
/// Un fallo al guardar un modelo omite ese modelo y sus atributos; un fallo
/// al guardar un atributo sólo omite ese atributo. Ninguno aborta la ingesta.
pub async fn ingest_schema(store: &dyn CatalogStore, schema: &SchemaDocument) -> IngestionSummary {
    let catalog = derive_catalog(schema);
    let mut summary = IngestionSummary {
        models_seen: schema.len(),
        models_skipped: catalog.unresolved_models.len(),
        ..Default::default()
    };

    for model_id in &catalog.unresolved_models {
        info!("Modelo '{}' sin ruta utilizable; se omite.", model_id);
    }

    for derived in &catalog.models {
        if let Err(err) = store.upsert_model(&derived.model).await {
            error!("Error insertando el modelo {}: {}", derived.model.name, err);
            summary.models_failed += 1;
            continue;
        }
        summary.models_stored += 1;
        summary.attributes_skipped += derived.skipped_attributes;

        for attribute in &derived.attributes {
            match store.upsert_attribute(attribute).await {
                Ok(()) => summary.attributes_processed += 1,
                Err(err) => {
                    warn!("Error insertando el atributo {}: {}", attribute.name, err);
                    summary.attributes_failed += 1;
                }
            }
        }
    }

    info!("Ingesta de esquema terminada. {}", summary);
    summary
}
