//! CSV export implementation.
//!
//! One row per node, for spreadsheet use.

use super::{ExportData, Exporter};
use std::io::{self, Write};

/// CSV exporter implementation.
pub struct CsvExporter;

impl CsvExporter {
    /// Escape a field value for CSV format.
    ///
    /// Wraps the value in quotes if it contains commas, quotes, or newlines.
    fn escape_field(value: &str) -> String {
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }
}

impl Exporter for CsvExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "id,title,type,kind,link,x,y,back_references")?;

        for node in &data.nodes {
            let link = if node.is_root {
                "root"
            } else {
                node.link.map_or("", |kind| kind.name())
            };
            let fields: Vec<&str> = node.back_references.iter().map(|r| r.field.as_str()).collect();

            writeln!(
                writer,
                "{},{},{},{},{},{:.1},{:.1},{}",
                Self::escape_field(&node.id),
                Self::escape_field(&node.title),
                Self::escape_field(&node.type_name),
                node.kind.label(),
                link,
                node.x,
                node.y,
                Self::escape_field(&fields.join(";"))
            )?;
        }

        Ok(())
    }
}
