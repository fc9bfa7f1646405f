//! Markdown export implementation.
//!
//! Writes a referencer report for documentation and reviews.

use super::{ExportData, ExportNode, Exporter};
use crate::graph::LinkKind;
use std::io::{self, Write};

/// Markdown exporter implementation.
pub struct MarkdownExporter;

fn write_section<W: Write>(writer: &mut W, kind: LinkKind, nodes: &[&ExportNode]) -> io::Result<()> {
    writeln!(writer, "### {} ({})", kind, nodes.len())?;
    writeln!(writer)?;
    writeln!(writer, "| Asset | Type | Package | Fields |")?;
    writeln!(writer, "|-------|------|---------|--------|")?;
    for node in nodes {
        let fields: Vec<String> = node
            .back_references
            .iter()
            .map(|r| format!("{} ({})", r.field, r.category))
            .collect();
        writeln!(
            writer,
            "| {} | {} | {} | {} |",
            node.title,
            node.type_name,
            node.comment.as_deref().unwrap_or("-"),
            if fields.is_empty() { "-".to_string() } else { fields.join(", ") }
        )?;
    }
    writeln!(writer)
}

impl Exporter for MarkdownExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "# Reference Report")?;
        writeln!(writer)?;
        if data.root.is_empty() {
            writeln!(writer, "*No graph has been built.*")?;
            return Ok(());
        }
        writeln!(writer, "**Root:** `{}`", data.root)?;
        writeln!(writer)?;
        if !data.status.is_empty() {
            writeln!(writer, "> {}", data.status)?;
            writeln!(writer)?;
        }

        writeln!(writer, "## Summary")?;
        writeln!(writer)?;
        writeln!(writer, "| Link | Count |")?;
        writeln!(writer, "|------|-------|")?;
        writeln!(writer, "| Total Referencers | {} |", data.referencers().count())?;
        for kind in LinkKind::ALL {
            let count = data.link_count(kind);
            if count > 0 {
                writeln!(writer, "| {} | {} |", kind, count)?;
            }
        }
        writeln!(writer)?;

        writeln!(writer, "## Referencers")?;
        writeln!(writer)?;
        for kind in LinkKind::ALL {
            let nodes: Vec<&ExportNode> = data
                .referencers()
                .filter(|n| n.link == Some(kind))
                .collect();
            if !nodes.is_empty() {
                write_section(writer, kind, &nodes)?;
            }
        }

        writeln!(writer, "---")?;
        writeln!(writer, "*Generated by refscope*")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::create_test_data;

    fn export_string(data: &ExportData) -> String {
        let mut output = Vec::new();
        MarkdownExporter.export(data, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_markdown_export_summary() {
        let md = export_string(&create_test_data());

        assert!(md.starts_with("# Reference Report"));
        assert!(md.contains("**Root:** `/Game/Props/Crate`"));
        assert!(md.contains("| Total Referencers | 2 |"));
        assert!(md.contains("| Hard | 1 |"));
        assert!(md.contains("| SoftEditorOnly | 1 |"));
        assert!(!md.contains("| Soft | "));
        assert!(md.ends_with("*Generated by refscope*\n"));
    }

    #[test]
    fn test_markdown_export_sections() {
        let md = export_string(&create_test_data());

        assert!(md.contains("### Hard (1)"));
        assert!(md.contains("| Arena | World | /Game/Maps/Arena | - |"));
        assert!(md.contains("### SoftEditorOnly (1)"));
        assert!(md.contains("| Spawner, Large | Blueprint | /Game/BP/Spawner | Template (Spawning) |"));
        assert!(!md.contains("### Passive"));
    }

    #[test]
    fn test_markdown_export_status_and_empty() {
        let mut data = create_test_data();
        data.status = "Saved references changed, refresh for update".to_string();
        assert!(export_string(&data).contains("> Saved references changed, refresh for update"));

        data.root.clear();
        assert!(export_string(&data).contains("*No graph has been built.*"));
    }
}
