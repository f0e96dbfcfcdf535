//! Lectura del catálogo para la interfaz: modelos con sus atributos.

use std::collections::{BTreeMap, BTreeSet};

use crate::{error::StoreError, models::ModelWithAttributes, store::CatalogStore};

/// Agrupa filas (modelo, atributo) por nombre de modelo, ordenando modelos y
/// atributos por nombre. El resultado no depende del orden de las filas.
pub fn build_catalog<I>(rows: I) -> Vec<ModelWithAttributes>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (model, attribute) in rows {
        grouped.entry(model).or_default().insert(attribute);
    }

    grouped
        .into_iter()
        .map(|(name, attributes)| ModelWithAttributes {
            name,
            attributes: attributes.into_iter().collect(),
        })
        .collect()
}

pub async fn read_catalog(store: &dyn CatalogStore) -> Result<Vec<ModelWithAttributes>, StoreError> {
    let rows = store.list_model_attribute_rows().await?;
    Ok(build_catalog(rows))
}
