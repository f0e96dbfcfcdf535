//! Transcodificación entre la consulta estructurada (lista plana de filtros)
//! y el documento anidado `función → modelo → atributo → condición: valor`.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    document::{self, DocNode},
    error::DocumentError,
    models::{Filter, StructuredQuery},
};

/// Construye el documento anidado a partir de una consulta estructurada.
///
/// Los filtros que repiten atributo se pisan: sobrevive el último.
pub fn encode(query: &StructuredQuery) -> BTreeMap<String, DocNode> {
    let mut attributes = BTreeMap::new();
    for filter in &query.filters {
        let mut condition = BTreeMap::new();
        condition.insert(
            filter.condition.clone(),
            DocNode::scalar(filter.condition_value.clone()),
        );
        if attributes
            .insert(filter.attribute.clone(), DocNode::Mapping(condition))
            .is_some()
        {
            warn!(
                "Atributo '{}' repetido en la consulta; se conserva el último filtro.",
                filter.attribute
            );
        }
    }

    let mut models = BTreeMap::new();
    models.insert(query.model.clone(), DocNode::Mapping(attributes));

    let mut root = BTreeMap::new();
    root.insert(query.function.clone(), DocNode::Mapping(models));
    root
}

/// Codifica la consulta como texto de documento (con la línea marcador).
pub fn encode_to_text(query: &StructuredQuery) -> Result<String, DocumentError> {
    document::render_document(&encode(query))
}

/// Recupera la consulta estructurada de un documento anidado.
///
/// Es tolerante: un nivel que no sea un mapa simplemente no aporta filtros.
/// Si hay varias funciones (o varios modelos bajo la función elegida) se toma
/// la clave lexicográficamente menor y el resto se ignora.
pub fn decode(root: &BTreeMap<String, DocNode>) -> StructuredQuery {
    let mut query = StructuredQuery::default();

    let Some((function, models)) = root.iter().next() else {
        return query;
    };
    if root.len() > 1 {
        warn!(
            "El documento tiene {} funciones; se usa '{}' y se ignoran las demás.",
            root.len(),
            function
        );
    }
    query.function = function.clone();

    let Some(models) = models.as_mapping() else {
        return query;
    };
    let Some((model, attributes)) = models.iter().next() else {
        return query;
    };
    if models.len() > 1 {
        warn!(
            "La función '{}' tiene {} modelos; se usa '{}' y se ignoran los demás.",
            function,
            models.len(),
            model
        );
    }
    query.model = model.clone();

    let Some(attributes) = attributes.as_mapping() else {
        return query;
    };
    for (attribute, conditions) in attributes {
        let Some(conditions) = conditions.as_mapping() else {
            continue;
        };
        for (condition, value) in conditions {
            query.filters.push(Filter {
                attribute: attribute.clone(),
                condition: condition.clone(),
                condition_value: value.to_text(),
            });
        }
    }

    query
}

/// Interpreta el texto de un documento (con o sin marcador) y lo decodifica.
pub fn decode_text(text: &str) -> Result<StructuredQuery, DocumentError> {
    let root = document::parse_document(text)?;
    Ok(decode(&root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(attribute: &str, condition: &str, value: &str) -> Filter {
        Filter {
            attribute: attribute.to_string(),
            condition: condition.to_string(),
            condition_value: value.to_string(),
        }
    }

    fn sorted(mut filters: Vec<Filter>) -> Vec<Filter> {
        filters.sort_by(|a, b| {
            (&a.attribute, &a.condition).cmp(&(&b.attribute, &b.condition))
        });
        filters
    }

    #[test]
    fn encode_then_decode_recovers_the_query() {
        let query = StructuredQuery {
            function: "avg".into(),
            model: "Person".into(),
            filters: vec![filter("age", "gt", "30")],
        };

        let text = encode_to_text(&query).unwrap();
        assert!(text.starts_with("#\n"));
        assert_eq!(decode_text(&text).unwrap(), query);
    }

    #[test]
    fn decode_returns_the_same_filter_set_in_any_order() {
        let query = StructuredQuery {
            function: "find".into(),
            model: "ShapeFile".into(),
            filters: vec![
                filter("zone", "eq", "north"),
                filter("enterpriseId", "ne", "7"),
                filter("area", "le", "12.5"),
            ],
        };

        let decoded = decode_text(&encode_to_text(&query).unwrap()).unwrap();
        assert_eq!(decoded.function, "find");
        assert_eq!(decoded.model, "ShapeFile");
        assert_eq!(sorted(decoded.filters), sorted(query.filters));
    }

    #[test]
    fn encoded_document_has_four_levels() {
        let query = StructuredQuery {
            function: "avg".into(),
            model: "Person".into(),
            filters: vec![filter("age", "gt", "30")],
        };

        let root = encode(&query);
        let value = root["avg"].as_mapping().unwrap()["Person"].as_mapping().unwrap()["age"]
            .as_mapping()
            .unwrap()["gt"]
            .clone();
        assert_eq!(value, DocNode::scalar("30"));
    }

    #[test]
    fn duplicate_attributes_collapse_to_the_last_filter() {
        let query = StructuredQuery {
            function: "count".into(),
            model: "Person".into(),
            filters: vec![filter("age", "gt", "30"), filter("age", "lt", "65")],
        };

        let decoded = decode(&encode(&query));
        assert_eq!(decoded.filters, vec![filter("age", "lt", "65")]);
    }

    #[test]
    fn query_without_filters_keeps_function_and_model() {
        let query = StructuredQuery {
            function: "count".into(),
            model: "Person".into(),
            filters: vec![],
        };

        assert_eq!(decode_text(&encode_to_text(&query).unwrap()).unwrap(), query);
    }

    #[test]
    fn marker_line_is_optional() {
        let body = "avg:\n  Person:\n    age:\n      gt: 30\n";
        let with_marker = format!("#\n{body}");

        assert_eq!(decode_text(body).unwrap(), decode_text(&with_marker).unwrap());
        assert_eq!(
            decode_text(&format!("\n  {with_marker}  \n")).unwrap(),
            decode_text(body).unwrap()
        );
    }

    #[test]
    fn marker_glued_to_the_document_still_decodes() {
        let expected = StructuredQuery {
            function: "avg".into(),
            model: "Person".into(),
            filters: vec![filter("age", "gt", "30")],
        };

        assert_eq!(
            decode_text("#avg:\n  Person:\n    age:\n      gt: 30\n").unwrap(),
            expected
        );
        assert_eq!(
            decode_text("#{avg: {Person: {age: {gt: 30}}}}").unwrap(),
            expected
        );
        assert_eq!(
            decode_text("# consulta guardada\navg:\n  Person:\n    age:\n      gt: 30\n").unwrap(),
            expected
        );
    }

    #[test]
    fn numeric_values_are_coerced_to_text() {
        let decoded = decode_text("#\nsum:\n  Order:\n    total:\n      ge: 100\n    paid:\n      eq: true\n").unwrap();
        assert_eq!(
            decoded.filters,
            vec![filter("paid", "eq", "true"), filter("total", "ge", "100")]
        );
    }

    #[test]
    fn attribute_with_several_conditions_yields_several_filters() {
        let decoded = decode_text("avg:\n  Person:\n    age:\n      gt: 18\n      lt: 65\n").unwrap();
        assert_eq!(
            decoded.filters,
            vec![filter("age", "gt", "18"), filter("age", "lt", "65")]
        );
    }

    #[test]
    fn shape_mismatches_produce_fewer_filters() {
        let decoded = decode_text("avg:\n  Person:\n    age: 30\n    name:\n      eq: Ana\n").unwrap();
        assert_eq!(decoded.model, "Person");
        assert_eq!(decoded.filters, vec![filter("name", "eq", "Ana")]);

        let decoded = decode_text("avg: Person").unwrap();
        assert_eq!(decoded.function, "avg");
        assert_eq!(decoded.model, "");
        assert!(decoded.filters.is_empty());

        let decoded = decode_text("avg:\n  Person: 3").unwrap();
        assert_eq!(decoded.model, "Person");
        assert!(decoded.filters.is_empty());
    }

    #[test]
    fn multiple_functions_resolve_to_the_smallest_key() {
        let text = "max:\n  B:\n    x:\n      eq: 1\navg:\n  Z:\n    y:\n      eq: 2\n  A:\n    z:\n      eq: 3\n";
        let decoded = decode_text(text).unwrap();

        assert_eq!(decoded.function, "avg");
        assert_eq!(decoded.model, "A");
        assert_eq!(decoded.filters, vec![filter("z", "eq", "3")]);
    }

    #[test]
    fn empty_document_decodes_to_empty_query() {
        assert_eq!(decode_text("#\n").unwrap(), StructuredQuery::default());
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(decode_text("avg: [Person").is_err());
        assert!(decode_text("- avg").is_err());
    }
}
