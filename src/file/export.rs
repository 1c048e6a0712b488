// src/file/export.rs
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use crate::analysis::{format_amount, FlowGraph};

/// Writes the flow table as `Source,Target,Value` rows.
pub fn write_flows_csv<W: Write>(writer: W, flows: &FlowGraph) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(["Source", "Target", "Value"])?;
    for edge in &flows.edges {
        writer.write_record([
            edge.source.as_str(),
            edge.target.as_str(),
            format_amount(edge.value).as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_flows_csv(path: &Path, flows: &FlowGraph) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_flows_csv(file, flows)
        .with_context(|| format!("Failed to write flows to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::flow::derive_flows;
    use crate::config::PlTable;

    #[test]
    fn writes_header_and_three_flows() {
        let flows = derive_flows(&PlTable::from_values("1000", "300", "200"));
        let mut out = Vec::new();
        write_flows_csv(&mut out, &flows).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Source,Target,Value\n\
             Revenue,COGs,300\n\
             Revenue,Operating Expenses,200\n\
             Revenue,Net Profit,500\n"
        );
    }

    #[test]
    fn saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flows.csv");
        save_flows_csv(&path, &derive_flows(&PlTable::empty())).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("Revenue,Net Profit,0\n"));
    }
}
