//! Run summary table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::RunOutcome;

pub fn print_summary(outcome: &RunOutcome) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    table.add_row(vec![
        Cell::new("Steps"),
        Cell::new(outcome.steps.join(" -> ")),
    ]);
    table.add_row(vec![
        Cell::new("Input rows"),
        Cell::new(outcome.rows_in),
    ]);
    table.add_row(vec![
        Cell::new("Output rows"),
        Cell::new(outcome.rows_out),
    ]);

    let kept = if outcome.rows_in == 0 {
        100.0
    } else {
        outcome.rows_out as f64 / outcome.rows_in as f64 * 100.0
    };
    let kept_cell = Cell::new(format!("{kept:.1}%"));
    let kept_cell = if kept < 100.0 {
        kept_cell.fg(Color::Yellow)
    } else {
        kept_cell.fg(Color::Green)
    };
    table.add_row(vec![Cell::new("Rows kept"), kept_cell]);

    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{:.2}s", outcome.duration.as_secs_f64())),
    ]);
    if let Some(destination) = &outcome.destination {
        let label = if outcome.dry_run {
            "Destination (dry run)"
        } else {
            "Destination"
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(destination.display().to_string()),
        ]);
    }
    if let Some(report) = &outcome.report {
        table.add_row(vec![
            Cell::new("Report"),
            Cell::new(report.display().to_string()),
        ]);
    }

    println!("{table}");
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
