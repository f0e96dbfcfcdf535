//! Documento de consulta: árbol clave/valor etiquetado y su encuadre textual.
//!
//! El texto de un documento es YAML precedido por una línea marcador `#`.
//! Cualquier valor YAML se reduce a dos formas: escalar (texto) o mapa.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_yaml::Value;

use crate::error::DocumentError;

/// Línea que identifica un documento de consulta.
pub const DOCUMENT_MARKER: &str = "#";

/// Nodo del documento. Los mapas se guardan ordenados por clave, así que
/// cualquier recorrido es determinista.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocNode {
    Scalar(String),
    Mapping(BTreeMap<String, DocNode>),
}

impl DocNode {
    pub fn scalar(text: impl Into<String>) -> Self {
        DocNode::Scalar(text.into())
    }

    /// Devuelve el mapa si el nodo tiene esa forma; `None` en otro caso.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, DocNode>> {
        match self {
            DocNode::Mapping(map) => Some(map),
            DocNode::Scalar(_) => None,
        }
    }

    /// Representación textual del nodo. Los mapas se vuelcan como JSON.
    pub fn to_text(&self) -> String {
        match self {
            DocNode::Scalar(text) => text.clone(),
            DocNode::Mapping(_) => serde_json::to_string(&self).unwrap_or_default(),
        }
    }
}

impl From<Value> for DocNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Mapping(mapping) => DocNode::Mapping(
                mapping
                    .into_iter()
                    .map(|(key, value)| (scalar_text(key), DocNode::from(value)))
                    .collect(),
            ),
            other => DocNode::Scalar(scalar_text(other)),
        }
    }
}

impl Serialize for DocNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocNode::Scalar(text) => serializer.serialize_str(text),
            DocNode::Mapping(map) => serializer.collect_map(map),
        }
    }
}

/// Convierte cualquier valor YAML en texto, sea cual sea su tipo original.
fn scalar_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        Value::Tagged(tagged) => scalar_text(tagged.value),
        // Secuencias y mapas usados como escalares: JSON compacto.
        other => serde_json::to_string(&other).unwrap_or_default(),
    }
}

/// Elimina espacios y el marcador inicial, si existe.
///
/// Una línea marcador sola (`#`) o de comentario (`# texto`) se descarta
/// entera. Si el contenido va pegado al marcador (`#avg:`), sólo se quita
/// el carácter `#`.
pub fn strip_marker(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(DOCUMENT_MARKER) else {
        return trimmed;
    };

    let (first_line, remainder) = rest.split_once('\n').unwrap_or((rest, ""));
    if first_line.trim().is_empty() || first_line.starts_with(char::is_whitespace) {
        remainder.trim()
    } else {
        rest.trim()
    }
}

/// Interpreta el texto de un documento y devuelve su mapa raíz.
///
/// Un documento vacío (o nulo) produce un mapa vacío; una raíz escalar o
/// secuencia es un documento mal formado.
pub fn parse_document(text: &str) -> Result<BTreeMap<String, DocNode>, DocumentError> {
    let body = strip_marker(text);
    if body.is_empty() {
        return Ok(BTreeMap::new());
    }

    let value: Value = serde_yaml::from_str(body)?;
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Mapping(_) => match DocNode::from(value) {
            DocNode::Mapping(map) => Ok(map),
            DocNode::Scalar(_) => Err(DocumentError::NotAMapping),
        },
        _ => Err(DocumentError::NotAMapping),
    }
}

/// Genera el texto del documento: línea marcador seguida del YAML.
pub fn render_document(root: &BTreeMap<String, DocNode>) -> Result<String, DocumentError> {
    let body = serde_yaml::to_string(root)?;
    Ok(format!("{DOCUMENT_MARKER}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_marker_handles_presence_and_absence() {
        assert_eq!(strip_marker("#\navg:\n  P: {}\n"), "avg:\n  P: {}");
        assert_eq!(strip_marker("  avg:\n  P: {}  "), "avg:\n  P: {}");
        assert_eq!(strip_marker("\n\n#\n"), "");
        assert_eq!(strip_marker("#"), "");
    }

    #[test]
    fn strip_marker_drops_the_whole_marker_line() {
        assert_eq!(strip_marker("# consulta guardada\nsum: {}"), "sum: {}");
    }

    #[test]
    fn content_glued_to_the_marker_is_kept() {
        assert_eq!(
            strip_marker("#avg:\n  Person: {}\n"),
            "avg:\n  Person: {}"
        );
        assert_eq!(strip_marker("#{avg: {}}"), "{avg: {}}");
        assert_eq!(strip_marker("#\r\navg: {}"), "avg: {}");
    }

    #[test]
    fn scalars_of_any_type_become_text() {
        let root = parse_document("f:\n  m:\n    a: {n: 30, b: true, x: 1.5, z: ~, l: [1, 2]}").unwrap();
        let conditions = root["f"].as_mapping().unwrap()["m"].as_mapping().unwrap()["a"]
            .as_mapping()
            .unwrap();

        assert_eq!(conditions["n"], DocNode::scalar("30"));
        assert_eq!(conditions["b"], DocNode::scalar("true"));
        assert_eq!(conditions["x"], DocNode::scalar("1.5"));
        assert_eq!(conditions["z"], DocNode::scalar(""));
        assert_eq!(conditions["l"], DocNode::scalar("[1,2]"));
    }

    #[test]
    fn non_string_keys_are_coerced() {
        let root = parse_document("1:\n  true: x").unwrap();
        assert_eq!(root["1"].as_mapping().unwrap()["true"], DocNode::scalar("x"));
    }

    #[test]
    fn empty_text_is_an_empty_document() {
        assert!(parse_document("").unwrap().is_empty());
        assert!(parse_document("#\n").unwrap().is_empty());
        assert!(parse_document("~").unwrap().is_empty());
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        assert!(matches!(
            parse_document("- a\n- b"),
            Err(DocumentError::NotAMapping)
        ));
        assert!(matches!(
            parse_document("solo texto"),
            Err(DocumentError::NotAMapping)
        ));
    }

    #[test]
    fn broken_yaml_is_rejected() {
        assert!(matches!(
            parse_document("avg: {Person: [1, 2"),
            Err(DocumentError::Yaml(_))
        ));
    }

    #[test]
    fn rendered_text_starts_with_marker_and_parses_back() {
        let mut conditions = BTreeMap::new();
        conditions.insert("eq".to_string(), DocNode::scalar("42"));
        let mut root = BTreeMap::new();
        root.insert("count".to_string(), DocNode::Mapping(conditions));

        let text = render_document(&root).unwrap();
        assert!(text.starts_with("#\n"));
        assert_eq!(parse_document(&text).unwrap(), root);
    }
}
