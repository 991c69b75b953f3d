//! Schema detection and dispatch.
//!
//! A document is classified once, up front, by its root element; each
//! supported shape then has its own reader.

mod diagram;
mod dictionary;
mod tree;

use crate::{parse_document, Element, ParseError, ParseResult};
use cctm_core::ClassificationTree;

pub use diagram::read_diagram;
pub use dictionary::read_dictionary;
pub use tree::{read_single, read_versions};

/// The supported classification-tree document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `<classificationTrees><treeVersion><useCase>...`
    VersionedTree,
    /// `<classificationTree><useCase>...`
    SingleTree,
    /// `<DataDictionary><Variable>...`
    LegacyDictionary,
    /// draw.io `<mxfile>` / `<mxGraphModel>`
    Diagram,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::VersionedTree,
        SchemaKind::SingleTree,
        SchemaKind::LegacyDictionary,
        SchemaKind::Diagram,
    ];

    /// First structural match wins.
    pub fn detect(root: &Element) -> Option<SchemaKind> {
        match root.name.as_str() {
            "classificationTrees" if root.has_child("treeVersion") => Some(SchemaKind::VersionedTree),
            "classificationTree" if root.has_child("useCase") => Some(SchemaKind::SingleTree),
            "DataDictionary" if root.has_child("Variable") => Some(SchemaKind::LegacyDictionary),
            "mxfile" | "mxGraphModel" => Some(SchemaKind::Diagram),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SchemaKind::VersionedTree => "classificationTrees/treeVersion",
            SchemaKind::SingleTree => "classificationTree/useCase",
            SchemaKind::LegacyDictionary => "DataDictionary/Variable",
            SchemaKind::Diagram => "mxfile/mxGraphModel",
        }
    }
}

fn detect_or_fail(root: &Element) -> ParseResult<SchemaKind> {
    SchemaKind::detect(root).ok_or_else(|| {
        let supported: Vec<&str> = SchemaKind::ALL.iter().map(|k| k.describe()).collect();
        ParseError::unrecognized_root(root.span, &root.name, &supported)
    })
}

/// Parse any supported document into one tree. Versioned documents yield
/// their last version.
pub fn parse(xml: &str) -> ParseResult<ClassificationTree> {
    let root = parse_document(xml)?;
    let kind = detect_or_fail(&root)?;
    tracing::debug!(schema = kind.describe(), "detected document schema");
    match kind {
        SchemaKind::VersionedTree => {
            let mut versions = read_versions(&root);
            Ok(versions.pop().unwrap_or_default())
        }
        SchemaKind::SingleTree => Ok(read_single(&root)),
        SchemaKind::LegacyDictionary => Ok(read_dictionary(&root)),
        SchemaKind::Diagram => read_diagram(&root),
    }
}

/// Every version held by a document, oldest first. Non-versioned shapes
/// yield exactly one tree.
pub fn parse_versions(xml: &str) -> ParseResult<Vec<ClassificationTree>> {
    let root = parse_document(xml)?;
    match detect_or_fail(&root)? {
        SchemaKind::VersionedTree => Ok(read_versions(&root)),
        SchemaKind::SingleTree => Ok(vec![read_single(&root)]),
        SchemaKind::LegacyDictionary => Ok(vec![read_dictionary(&root)]),
        SchemaKind::Diagram => Ok(vec![read_diagram(&root)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_order() {
        let root = parse_document("<classificationTrees><treeVersion/></classificationTrees>").unwrap();
        assert_eq!(SchemaKind::detect(&root), Some(SchemaKind::VersionedTree));
        let root = parse_document("<classificationTree><useCase/></classificationTree>").unwrap();
        assert_eq!(SchemaKind::detect(&root), Some(SchemaKind::SingleTree));
        let root = parse_document("<DataDictionary><Variable/></DataDictionary>").unwrap();
        assert_eq!(SchemaKind::detect(&root), Some(SchemaKind::LegacyDictionary));
        let root = parse_document("<classificationTree/>").unwrap();
        assert_eq!(SchemaKind::detect(&root), None);
    }

    #[test]
    fn test_unknown_root_is_parse_error() {
        let err = parse("<inventory><item/></inventory>").unwrap_err();
        assert!(err.message.contains("<inventory>"));
        assert_eq!(err.expected.as_ref().map(|e| e.len()), Some(4));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        assert!(parse("<classificationTree><useCase>").is_err());
    }
}
