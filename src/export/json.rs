//! JSON export implementation.
//!
//! Writes the full graph (nodes, positions, edges and colors) for
//! machine-readable output.

use super::{ExportData, Exporter};
use crate::graph::LinkKind;
use serde::Serialize;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonBackReference<'a> {
    field: &'a str,
    category: &'a str,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    position: [f64; 2],
    is_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'static str>,
    color: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    back_references: Vec<JsonBackReference<'a>>,
}

#[derive(Serialize)]
struct JsonEdge<'a> {
    from: &'a str,
    to: &'a str,
    kind: &'static str,
    color: String,
}

/// Per-kind link counts.
#[derive(Serialize)]
struct JsonSummary {
    nodes: usize,
    links: usize,
    hard: usize,
    hard_editor_only: usize,
    soft: usize,
    soft_editor_only: usize,
}

/// Root JSON export structure.
#[derive(Serialize)]
struct JsonExport<'a> {
    root: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    status: &'a str,
    summary: JsonSummary,
    nodes: Vec<JsonNode<'a>>,
    edges: Vec<JsonEdge<'a>>,
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let nodes = data
            .nodes
            .iter()
            .map(|n| JsonNode {
                id: &n.id,
                title: &n.title,
                type_name: &n.type_name,
                kind: n.kind.label(),
                comment: n.comment.as_deref(),
                position: [n.x, n.y],
                is_root: n.is_root,
                link: n.link.map(|kind| kind.name()),
                color: n.color.to_hex(),
                back_references: n
                    .back_references
                    .iter()
                    .map(|r| JsonBackReference {
                        field: &r.field,
                        category: &r.category,
                    })
                    .collect(),
            })
            .collect();

        let edges = data
            .edges
            .iter()
            .map(|e| JsonEdge {
                from: &e.from,
                to: &e.to,
                kind: e.kind.name(),
                color: e.color.to_hex(),
            })
            .collect();

        let export = JsonExport {
            root: &data.root,
            status: &data.status,
            summary: JsonSummary {
                nodes: data.nodes.len(),
                links: data.edges.len(),
                hard: data.link_count(LinkKind::Hard),
                hard_editor_only: data.link_count(LinkKind::HardEditorOnly),
                soft: data.link_count(LinkKind::Soft),
                soft_editor_only: data.link_count(LinkKind::SoftEditorOnly),
            },
            nodes,
            edges,
        };

        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::create_test_data;

    fn export_value(data: &ExportData) -> serde_json::Value {
        let mut output = Vec::new();
        JsonExporter.export(data, &mut output).unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn test_json_export_summary() {
        let parsed = export_value(&create_test_data());

        assert_eq!(parsed["root"], "/Game/Props/Crate");
        assert_eq!(parsed["summary"]["nodes"], 3);
        assert_eq!(parsed["summary"]["links"], 2);
        assert_eq!(parsed["summary"]["hard"], 1);
        assert_eq!(parsed["summary"]["soft_editor_only"], 1);
        assert!(parsed.get("status").is_none());
    }

    #[test]
    fn test_json_export_nodes() {
        let parsed = export_value(&create_test_data());
        let nodes = parsed["nodes"].as_array().unwrap();

        assert_eq!(nodes[0]["is_root"], true);
        assert!(nodes[0].get("link").is_none());
        assert_eq!(nodes[0]["color"], "#33CC33");

        assert_eq!(nodes[1]["title"], "Arena");
        assert_eq!(nodes[1]["type"], "World");
        assert_eq!(nodes[1]["kind"], "package");
        assert_eq!(nodes[1]["link"], "Hard");
        assert_eq!(nodes[1]["comment"], "/Game/Maps/Arena");
        assert_eq!(nodes[1]["position"].as_array().unwrap().len(), 2);

        assert_eq!(nodes[2]["back_references"][0]["field"], "Template");
        assert_eq!(nodes[2]["back_references"][0]["category"], "Spawning");
    }

    #[test]
    fn test_json_export_edges() {
        let parsed = export_value(&create_test_data());
        let edges = parsed["edges"].as_array().unwrap();

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0]["from"], "/Game/Props/Crate");
        assert_eq!(edges[0]["to"], "/Game/Maps/Arena");
        assert_eq!(edges[0]["kind"], "Hard");
        assert_eq!(edges[1]["kind"], "SoftEditorOnly");
        assert_eq!(edges[1]["color"], "#49213A");
    }
}
