//! Export functionality for reference graphs.
//!
//! This module provides exporters that write a built [`ReferenceGraph`] in
//! various formats (JSON, CSV and Markdown), and the plain-text hard/soft
//! reference listings in [`listing`].

pub mod csv;
pub mod json;
pub mod listing;
pub mod markdown;

use crate::config::{Rgb, StyleConfig};
use crate::graph::{BackReference, LinkKind, NodeKind, ReferenceGraph};
use std::io::{self, Write};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format - machine-readable, full data
    Json,
    /// CSV format - one row per node
    Csv,
    /// Markdown format - documentation/reporting
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: json, csv, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// One visual node, flattened for export.
#[derive(Debug, Clone)]
pub struct ExportNode {
    /// Identifier in its textual form
    pub id: String,
    /// Node title
    pub title: String,
    /// Type line under the title
    pub type_name: String,
    /// Kind of node
    pub kind: NodeKind,
    /// Package name for package nodes
    pub comment: Option<String>,
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Whether this is the root
    pub is_root: bool,
    /// Link from the parent, `None` for the root
    pub link: Option<LinkKind>,
    /// Title color
    pub color: Rgb,
    /// Fields pointing back at the root
    pub back_references: Vec<BackReference>,
}

/// One visual edge, flattened for export.
#[derive(Debug, Clone)]
pub struct ExportEdge {
    /// Parent identifier
    pub from: String,
    /// Child identifier
    pub to: String,
    /// Link kind
    pub kind: LinkKind,
    /// Wire color
    pub color: Rgb,
}

/// Data container for export operations.
///
/// Holds a snapshot of a built graph with the colors resolved.
#[derive(Debug, Clone)]
pub struct ExportData {
    /// Root identifier, empty when nothing was built
    pub root: String,
    /// Nodes in creation order (root first)
    pub nodes: Vec<ExportNode>,
    /// Edges in creation order
    pub edges: Vec<ExportEdge>,
    /// Explorer status line at export time
    pub status: String,
}

impl ExportData {
    /// Flattens a built graph.
    pub fn from_graph(graph: &ReferenceGraph, style: &StyleConfig, status: impl Into<String>) -> Self {
        let mut incoming = std::collections::HashMap::new();
        let edges: Vec<ExportEdge> = graph
            .edges()
            .into_iter()
            .filter_map(|(from, to, category)| {
                let parent = graph.node(from)?;
                let child = graph.node(to)?;
                let kind = category.kind();
                incoming.entry(to).or_insert(kind);
                Some(ExportEdge {
                    from: parent.id.to_string(),
                    to: child.id.to_string(),
                    kind,
                    color: style.link_color(kind),
                })
            })
            .collect();

        let nodes = graph
            .nodes()
            .map(|(index, node)| ExportNode {
                id: node.id.to_string(),
                title: node.display.title.clone(),
                type_name: node.display.type_name.clone(),
                kind: node.display.kind,
                comment: node.display.comment.clone(),
                x: node.position.x,
                y: node.position.y,
                is_root: node.is_root,
                link: if node.is_root { None } else { incoming.get(&index).copied() },
                color: style.title_color(node.display.kind, node.is_root),
                back_references: node.back_references.clone(),
            })
            .collect();

        Self {
            root: graph.root().map(|r| r.to_string()).unwrap_or_default(),
            nodes,
            edges,
            status: status.into(),
        }
    }

    /// Number of edges of the given kind.
    pub fn link_count(&self, kind: LinkKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    /// Nodes other than the root.
    pub fn referencers(&self) -> impl Iterator<Item = &ExportNode> {
        self.nodes.iter().filter(|n| !n.is_root)
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the data to the given writer.
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()>;
}

/// Export data in the specified format.
pub fn export<W: Write>(
    format: ExportFormat,
    data: &ExportData,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter.export(data, writer),
        ExportFormat::Csv => csv::CsvExporter.export(data, writer),
        ExportFormat::Markdown => markdown::MarkdownExporter.export(data, writer),
    }
}

/// Export data to a string.
pub fn export_to_string(format: ExportFormat, data: &ExportData) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, data, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
