//! Arbre XML du document KML et requêtes par espace de noms

use roxmltree::{Document, Node, ParsingOptions};

use crate::KmzError;

/// Espace de noms KML 2.2 (OGC)
pub const KML_NS: &str = "http://www.opengis.net/kml/2.2";

/// Espaces de noms acceptés comme équivalents
const KML_NS_ALIASES: &[&str] = &[
    KML_NS,
    "http://earth.google.com/kml/2.2",
    "http://earth.google.com/kml/2.1",
    "http://earth.google.com/kml/2.0",
];

/// Décode le contenu brut en UTF-8 (BOM ignoré)
pub fn decode(bytes: &[u8]) -> Result<&str, KmzError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| KmzError::markup(format!("invalid UTF-8: {e}")))
}

/// Parse le texte KML en arbre d'éléments
pub fn parse_document(text: &str) -> Result<Document<'_>, KmzError> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, opts)
        .map_err(|e| KmzError::markup(format!("XML parse error: {e}")))
}

/// Vrai si `node` est l'élément KML `name`
pub fn is_kml(node: Node<'_, '_>, name: &str) -> bool {
    if !node.is_element() || node.tag_name().name() != name {
        return false;
    }
    match node.tag_name().namespace() {
        None => true,
        Some(ns) => KML_NS_ALIASES.contains(&ns),
    }
}

/// Premier enfant direct nommé `name`
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_kml(*n, name))
}

/// Texte trimé du premier enfant direct nommé `name`
///
/// Renvoie `Some("")` si l'élément existe mais est vide.
pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).map(|n| n.text().unwrap_or("").trim())
}

/// Premier descendant (hors `node` lui-même) nommé `name`
pub fn first_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| is_kml(*n, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_query() {
        let text = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document><name> Survey </name><Folder/></Document></kml>"#;
        let doc = parse_document(text).unwrap();
        let document = child(doc.root_element(), "Document").unwrap();
        assert_eq!(child_text(document, "name"), Some("Survey"));
        assert!(child(document, "Folder").is_some());
        assert!(child(document, "Placemark").is_none());
    }

    #[test]
    fn test_foreign_namespace_is_ignored() {
        let text = r#"<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:x="urn:other"><x:Folder/></kml>"#;
        let doc = parse_document(text).unwrap();
        assert!(child(doc.root_element(), "Folder").is_none());
    }

    #[test]
    fn test_no_namespace_accepted() {
        let doc = parse_document("<kml><Folder/></kml>").unwrap();
        assert!(child(doc.root_element(), "Folder").is_some());
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse_document("<kml><Folder></kml>");
        assert!(matches!(result, Err(KmzError::MarkupParse(_))));
    }

    #[test]
    fn test_decode_strips_bom() {
        assert_eq!(decode(b"\xEF\xBB\xBF<kml/>").unwrap(), "<kml/>");
        assert!(decode(&[0xff, 0xfe, 0x00]).is_err());
    }
}
