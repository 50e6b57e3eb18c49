//! Structural content fingerprints.
//!
//! A fingerprint is spatially independent: line shifts, whitespace and
//! pure reformatting do not change it. Source files in the TS/JS family
//! are projected to their top-level declaration shapes and hashed; every
//! other input falls back to a raw content hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tree_sitter::{Node, Tree};

/// Extensions handled by the structural parser, case-folded.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// How a fingerprint was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMethod {
    /// Position-free projection of top-level declarations.
    Ast,
    /// SHA-256 of the literal bytes.
    Raw,
}

/// A content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// `"<method>-sha256:<hex>"`.
    pub hash: String,
    /// Method that produced the hash.
    pub method: HashMethod,
    /// Number of top-level nodes in the projection; 0 for raw.
    pub node_count: usize,
}

/// Position-free projection of one top-level declaration.
///
/// Field order is the canonical serialization order; position, range,
/// comment and token information never enter this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct FingerprintNode {
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    param_count: Option<usize>,
    exported: bool,
    children: Vec<String>,
}

/// Computes the raw content hash, `"raw-sha256:<hex>"`.
#[must_use]
pub fn raw_hash(content: &str) -> String {
    format!("raw-sha256:{:x}", Sha256::digest(content.as_bytes()))
}

/// Computes the fingerprint for a file's content.
///
/// Falls back to the raw hash when the extension is unsupported or the
/// content does not parse cleanly.
#[must_use]
pub fn fingerprint_content(path: &Path, content: &str) -> Fingerprint {
    if let Some(tree) = parse_source(path, content) {
        let nodes = project_top_level(&tree, content);
        // serde_json emits no whitespace and fixed struct field order,
        // which is the canonical form the hash is defined over.
        if let Ok(serialized) = serde_json::to_string(&nodes) {
            return Fingerprint {
                hash: format!("ast-sha256:{:x}", Sha256::digest(serialized.as_bytes())),
                method: HashMethod::Ast,
                node_count: nodes.len(),
            };
        }
    }

    Fingerprint {
        hash: raw_hash(content),
        method: HashMethod::Raw,
        node_count: 0,
    }
}

/// Parses supported source content, or `None` to signal raw fallback.
///
/// A tree containing syntax errors counts as a parse failure.
pub(crate) fn parse_source(path: &Path, content: &str) -> Option<Tree> {
    let language = language_for(path)?;
    let mut parser = tree_sitter::Parser::new();
    if parser.set_language(&language).is_err() {
        tracing::warn!(path = %path.display(), "parser unavailable; falling back to raw hash");
        return None;
    }

    let tree = parser.parse(content, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    Some(tree)
}

fn language_for(path: &Path) -> Option<tree_sitter::Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "tsx" | "jsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "ts" | "js" | "mts" | "cts" | "mjs" | "cjs" => {
            Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        }
        _ => None,
    }
}

/// Maps a tree-sitter node kind to its fingerprint type tag.
pub(crate) fn tag_for_kind(kind: &str) -> String {
    match kind {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            "fn".to_string()
        }
        "class_declaration" | "abstract_class_declaration" => "class".to_string(),
        "interface_declaration" => "interface".to_string(),
        "type_alias_declaration" => "type-alias".to_string(),
        "lexical_declaration" | "variable_declaration" => "var".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn node_text(node: Node<'_>, content: &str) -> String {
    node.utf8_text(content.as_bytes())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn field_text(node: Node<'_>, field: &str, content: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| node_text(child, content))
}

pub(crate) fn param_count(node: Node<'_>) -> Option<usize> {
    node.child_by_field_name("parameters")
        .map(|params| params.named_child_count())
}

fn named_child_kinds(node: Node<'_>) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .map(|child| child.kind().to_string())
        .collect()
}

/// Returns true when the export statement carries the `default` keyword.
pub(crate) fn is_default_export(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|child| child.kind() == "default");
    result
}

fn project_top_level(tree: &Tree, content: &str) -> Vec<FingerprintNode> {
    let root = tree.root_node();
    let mut cursor = root.walk();
    let mut nodes = Vec::new();

    for child in root.named_children(&mut cursor) {
        if child.kind() == "export_statement" {
            project_export(child, content, &mut nodes);
        } else {
            project_declaration(child, content, false, &mut nodes);
        }
    }

    nodes
}

fn project_export(node: Node<'_>, content: &str, out: &mut Vec<FingerprintNode>) {
    if is_default_export(node) {
        let name = node
            .child_by_field_name("declaration")
            .or_else(|| node.child_by_field_name("value"))
            .map(|inner| {
                field_text(inner, "name", content)
                    .unwrap_or_else(|| tag_for_kind(inner.kind()))
            })
            .unwrap_or_else(|| "default".to_string());

        out.push(FingerprintNode {
            type_tag: "export-default".to_string(),
            name: Some(name),
            param_count: None,
            exported: true,
            children: Vec::new(),
        });
        return;
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        project_declaration(declaration, content, true, out);
        return;
    }

    // Re-export specifier list: `export { a, b as c }`.
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut spec_cursor = child.walk();
        for spec in child.named_children(&mut spec_cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let exported_name = field_text(spec, "alias", content)
                .or_else(|| field_text(spec, "name", content))
                .unwrap_or_default();
            out.push(FingerprintNode {
                type_tag: "export-ref".to_string(),
                name: Some(exported_name),
                param_count: None,
                exported: true,
                children: Vec::new(),
            });
        }
    }
}

fn project_declaration(
    node: Node<'_>,
    content: &str,
    exported: bool,
    out: &mut Vec<FingerprintNode>,
) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            let children = node
                .child_by_field_name("body")
                .map(named_child_kinds)
                .unwrap_or_default();
            out.push(FingerprintNode {
                type_tag: "fn".to_string(),
                name: field_text(node, "name", content),
                param_count: param_count(node),
                exported,
                children,
            });
        }
        "class_declaration" | "abstract_class_declaration" => {
            let children = node
                .child_by_field_name("body")
                .map(named_child_kinds)
                .unwrap_or_default();
            out.push(FingerprintNode {
                type_tag: "class".to_string(),
                name: field_text(node, "name", content),
                param_count: None,
                exported,
                children,
            });
        }
        "interface_declaration" => {
            let children = node
                .child_by_field_name("body")
                .map(named_child_kinds)
                .unwrap_or_default();
            out.push(FingerprintNode {
                type_tag: "interface".to_string(),
                name: field_text(node, "name", content),
                param_count: None,
                exported,
                children,
            });
        }
        "type_alias_declaration" => {
            out.push(FingerprintNode {
                type_tag: "type-alias".to_string(),
                name: field_text(node, "name", content),
                param_count: None,
                exported,
                children: Vec::new(),
            });
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let init_tag = declarator
                    .child_by_field_name("value")
                    .map_or_else(|| "unknown".to_string(), |v| v.kind().to_string());
                out.push(FingerprintNode {
                    type_tag: "var".to_string(),
                    name: field_text(declarator, "name", content),
                    param_count: None,
                    exported,
                    children: vec![init_tag],
                });
            }
        }
        // Imports, bare expressions and the rest do not contribute.
        _ => {}
    }
}
