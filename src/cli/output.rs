//! Terminal output for command results

use crate::phylo::supermatrix::PartitionMap;
use crate::pipeline::orchestrator::PipelineReport;
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color as TableColor, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg.green());
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg.yellow());
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold).fg(TableColor::Cyan))
        .collect()
}

/// Per-stage counts and timings
pub fn stage_table(report: &PipelineReport) -> Table {
    let mut table = styled_table();
    table.set_header(header(&["Stage", "Items", "Succeeded", "Failed", "Time (s)"]));

    for summary in &report.stages {
        let failed = Cell::new(summary.failed).set_alignment(CellAlignment::Right);
        let failed = if summary.failed > 0 {
            failed.fg(TableColor::Red)
        } else {
            failed
        };
        table.add_row(vec![
            Cell::new(summary.stage.name()),
            Cell::new(summary.attempted).set_alignment(CellAlignment::Right),
            Cell::new(summary.succeeded)
                .set_alignment(CellAlignment::Right)
                .fg(TableColor::Green),
            failed,
            Cell::new(format!("{:.2}", summary.duration.as_secs_f64()))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Gene column ranges
pub fn partition_table(partitions: &PartitionMap) -> Table {
    let mut table = styled_table();
    table.set_header(header(&["Gene", "Start", "End", "Length"]));
    for p in partitions.partitions() {
        table.add_row(vec![
            Cell::new(&p.gene),
            Cell::new(p.start).set_alignment(CellAlignment::Right),
            Cell::new(p.end).set_alignment(CellAlignment::Right),
            Cell::new(p.len()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn print_report(report: &PipelineReport) {
    println!("\n{}", stage_table(report));

    if let Some(partitions) = &report.partitions {
        println!("{}", partition_table(partitions));
    }
    if let Some(supermatrix) = &report.supermatrix {
        println!("{} {}", "Supermatrix:".bold(), supermatrix.display());
    }
    if let Some(tree) = &report.tree {
        println!("{} {}", "Tree:".bold(), tree.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_table_lists_every_gene() {
        let map = PartitionMap::from_lengths([("COI", 10), ("CYTB", 8)]);
        let rendered = partition_table(&map).to_string();
        assert!(rendered.contains("COI"));
        assert!(rendered.contains("CYTB"));
        assert!(rendered.contains("18"));
    }
}
