//! Mutation classification - exported-surface diff between two versions.
//!
//! A mutation is an `AST_REFACTOR` when the exported API surface is
//! unchanged, an `INTENT_EVOLUTION` when exports were added, removed or
//! re-shaped, and `UNKNOWN` when neither side yields a comparable surface.

use crate::core::fingerprint::{
    field_text, is_default_export, node_text, param_count, parse_source, tag_for_kind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Machine-computed mutation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationClass {
    /// Exported surface unchanged; internal restructuring only.
    AstRefactor,
    /// Exported surface changed; the contract evolved.
    IntentEvolution,
    /// No comparable surface on either side.
    Unknown,
}

impl std::fmt::Display for MutationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AstRefactor => "AST_REFACTOR",
            Self::IntentEvolution => "INTENT_EVOLUTION",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Kind of an exported declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigKind {
    Fn,
    Class,
    Interface,
    Type,
    Var,
    Ref,
    Default,
}

impl std::fmt::Display for SigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Fn => "fn",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Var => "var",
            Self::Ref => "ref",
            Self::Default => "default",
        };
        write!(f, "{s}")
    }
}

/// One exported declaration, as matched across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSignature {
    pub kind: SigKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_count: Option<usize>,
}

impl ExportSignature {
    fn new(kind: SigKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            param_count: None,
        }
    }

    /// Renders `fn:<name>:<arity>` for functions, `<kind>:<name>` otherwise.
    #[must_use]
    pub fn render(&self) -> String {
        match self.kind {
            SigKind::Fn => format!("fn:{}:{}", self.name, self.param_count.unwrap_or(0)),
            kind => format!("{kind}:{}", self.name),
        }
    }
}

/// Outcome of classifying one old/new content pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub mutation_class: MutationClass,
    pub reason: String,
    pub added: Vec<ExportSignature>,
    pub removed: Vec<ExportSignature>,
    /// Arity changes, rendered `old → new`.
    pub changed: Vec<String>,
}

impl Classification {
    fn unknown(reason: impl Into<String>) -> Self {
        Self {
            mutation_class: MutationClass::Unknown,
            reason: reason.into(),
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

/// Extracts the export signatures of supported source content.
///
/// Returns an empty sequence for non-source content or parse failures;
/// whitespace, comments and declaration order never affect the result.
#[must_use]
pub fn extract_exports(path: &Path, content: &str) -> Vec<ExportSignature> {
    let Some(tree) = parse_source(path, content) else {
        return Vec::new();
    };

    let root = tree.root_node();
    let mut cursor = root.walk();
    let mut signatures = Vec::new();

    for node in root.named_children(&mut cursor) {
        if node.kind() != "export_statement" {
            continue;
        }

        if is_default_export(node) {
            let name = node
                .child_by_field_name("declaration")
                .or_else(|| node.child_by_field_name("value"))
                .map(|inner| {
                    field_text(inner, "name", content)
                        .unwrap_or_else(|| tag_for_kind(inner.kind()))
                })
                .unwrap_or_else(|| "default".to_string());
            signatures.push(ExportSignature::new(SigKind::Default, name));
            continue;
        }

        if let Some(declaration) = node.child_by_field_name("declaration") {
            collect_declaration(declaration, content, &mut signatures);
            continue;
        }

        let mut clause_cursor = node.walk();
        for child in node.named_children(&mut clause_cursor) {
            if child.kind() != "export_clause" {
                continue;
            }
            let mut spec_cursor = child.walk();
            for spec in child.named_children(&mut spec_cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let name = field_text(spec, "alias", content)
                    .or_else(|| field_text(spec, "name", content))
                    .unwrap_or_default();
                signatures.push(ExportSignature::new(SigKind::Ref, name));
            }
        }
    }

    signatures
}

fn collect_declaration(
    node: tree_sitter::Node<'_>,
    content: &str,
    out: &mut Vec<ExportSignature>,
) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            let name = field_text(node, "name", content).unwrap_or_default();
            out.push(ExportSignature {
                kind: SigKind::Fn,
                name,
                param_count: param_count(node),
            });
        }
        "class_declaration" | "abstract_class_declaration" => {
            let name = field_text(node, "name", content).unwrap_or_default();
            out.push(ExportSignature::new(SigKind::Class, name));
        }
        "interface_declaration" => {
            let name = field_text(node, "name", content).unwrap_or_default();
            out.push(ExportSignature::new(SigKind::Interface, name));
        }
        "type_alias_declaration" => {
            let name = field_text(node, "name", content).unwrap_or_default();
            out.push(ExportSignature::new(SigKind::Type, name));
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let name = declarator
                    .child_by_field_name("name")
                    .map(|n| node_text(n, content))
                    .unwrap_or_default();
                out.push(ExportSignature::new(SigKind::Var, name));
            }
        }
        _ => {}
    }
}

/// Classifies a mutation from old content to new content.
#[must_use]
pub fn classify(old_content: &str, new_content: &str, path: &Path) -> Classification {
    let old_sigs = extract_exports(path, old_content);
    let new_sigs = extract_exports(path, new_content);

    if old_sigs.is_empty() && new_sigs.is_empty() {
        return Classification::unknown(
            "Non-source content or parse failure; exported surface not comparable",
        );
    }

    let old_map: BTreeMap<(SigKind, String), ExportSignature> = old_sigs
        .into_iter()
        .map(|s| ((s.kind, s.name.clone()), s))
        .collect();
    let new_map: BTreeMap<(SigKind, String), ExportSignature> = new_sigs
        .into_iter()
        .map(|s| ((s.kind, s.name.clone()), s))
        .collect();

    let added: Vec<ExportSignature> = new_map
        .iter()
        .filter(|(key, _)| !old_map.contains_key(*key))
        .map(|(_, sig)| sig.clone())
        .collect();
    let removed: Vec<ExportSignature> = old_map
        .iter()
        .filter(|(key, _)| !new_map.contains_key(*key))
        .map(|(_, sig)| sig.clone())
        .collect();
    let changed: Vec<String> = old_map
        .iter()
        .filter_map(|(key, old_sig)| {
            let new_sig = new_map.get(key)?;
            if old_sig.kind == SigKind::Fn && old_sig.param_count != new_sig.param_count {
                Some(format!("{} → {}", old_sig.render(), new_sig.render()))
            } else {
                None
            }
        })
        .collect();

    if added.is_empty() && removed.is_empty() && changed.is_empty() {
        return Classification {
            mutation_class: MutationClass::AstRefactor,
            reason: "Exported API surface unchanged — internal refactor only".to_string(),
            added,
            removed,
            changed,
        };
    }

    let mut parts = Vec::new();
    if !added.is_empty() {
        let rendered: Vec<String> = added.iter().map(ExportSignature::render).collect();
        parts.push(format!("{} added ({})", added.len(), rendered.join(", ")));
    }
    if !removed.is_empty() {
        let rendered: Vec<String> = removed.iter().map(ExportSignature::render).collect();
        parts.push(format!("{} removed ({})", removed.len(), rendered.join(", ")));
    }
    if !changed.is_empty() {
        parts.push(format!("{} changed ({})", changed.len(), changed.join(", ")));
    }

    Classification {
        mutation_class: MutationClass::IntentEvolution,
        reason: format!("Exported API surface changed: {}", parts.join("; ")),
        added,
        removed,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ts() -> PathBuf {
        PathBuf::from("mod.ts")
    }

    #[test]
    fn unchanged_surface_is_refactor() {
        let old = "export function f(a) { return a + 1; }";
        let new = "export function f(a) {\n    const out = a + 1;\n    return out;\n}";

        let result = classify(old, new, &ts());
        assert_eq!(result.mutation_class, MutationClass::AstRefactor);
        assert!(result.added.is_empty());
        assert!(result.changed.is_empty());
    }

    #[test]
    fn arity_change_is_evolution() {
        let result = classify(
            "export function f(a){}",
            "export function f(a,b){}",
            &ts(),
        );

        assert_eq!(result.mutation_class, MutationClass::IntentEvolution);
        assert_eq!(result.changed, vec!["fn:f:1 → fn:f:2".to_string()]);
        assert!(result.reason.contains("fn:f:1"));
    }

    #[test]
    fn added_export_is_evolution() {
        let result = classify(
            "export function f(a){}",
            "export function f(a){}\nexport const limit = 10;",
            &ts(),
        );

        assert_eq!(result.mutation_class, MutationClass::IntentEvolution);
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].render(), "var:limit");
    }

    #[test]
    fn removed_export_is_evolution() {
        let result = classify(
            "export function f(a){}\nexport type Shape = string;",
            "export function f(a){}",
            &ts(),
        );

        assert_eq!(result.mutation_class, MutationClass::IntentEvolution);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].render(), "type:Shape");
    }

    #[test]
    fn kind_change_surfaces_as_remove_plus_add() {
        let result = classify(
            "export function thing(a){}",
            "export const thing = (a) => a;",
            &ts(),
        );

        assert_eq!(result.mutation_class, MutationClass::IntentEvolution);
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.removed.len(), 1);
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let result = classify(
            "export function a(){}\nexport function b(x){}",
            "export function b(x){}\nexport function a(){}",
            &ts(),
        );
        assert_eq!(result.mutation_class, MutationClass::AstRefactor);
    }

    #[test]
    fn non_source_is_unknown() {
        let result = classify("plain text", "other text", &PathBuf::from("notes.txt"));
        assert_eq!(result.mutation_class, MutationClass::Unknown);
        assert!(result.reason.contains("parse failure") || result.reason.contains("Non-source"));
    }

    #[test]
    fn internal_only_exports_unchanged() {
        let old = "const secret = 1;\nexport function api(){}";
        let new = "const secret = 2;\nconst extra = 3;\nexport function api(){}";
        let result = classify(old, new, &ts());
        assert_eq!(result.mutation_class, MutationClass::AstRefactor);
    }

    #[test]
    fn reexport_and_default_render() {
        let sigs = extract_exports(
            &ts(),
            "export { inner as outer } from './impl';\nexport default function main(){}",
        );

        let rendered: Vec<String> = sigs.iter().map(ExportSignature::render).collect();
        assert!(rendered.contains(&"ref:outer".to_string()));
        assert!(rendered.contains(&"default:main".to_string()));
    }

    #[test]
    fn wire_format_is_screaming_case() {
        let json = serde_json::to_string(&MutationClass::IntentEvolution).unwrap();
        assert_eq!(json, "\"INTENT_EVOLUTION\"");
    }
}
