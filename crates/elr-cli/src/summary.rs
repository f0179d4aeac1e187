use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use elr_cli::records::{MapTotals, MappedRow};
use elr_history::{ConsolidatedActionLog, Destination, DetailedSubmissionHistory};
use elr_map::Schema;
use elr_model::ActionLogLevel;
use elr_tables::LoadSummary;

pub fn print_load_summary(summary: &LoadSummary) {
    println!("Metadata: {}", summary.metadata_dir.display());
    println!(
        "Files: {} ({} digests verified)",
        summary.file_count, summary.verified_digests
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Columns"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total_rows = 0usize;
    for entry in &summary.tables {
        total_rows += entry.rows;
        table.add_row(vec![
            Cell::new(&entry.name).fg(Color::Blue),
            Cell::new(entry.columns),
            Cell::new(entry.rows),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_name_list("Schemas", &summary.schemas);
    print_name_list("Senders", &summary.senders);
}

fn print_name_list(label: &str, names: &[String]) {
    if names.is_empty() {
        println!("{label}: none");
    } else {
        println!("{label}: {}", names.join(", "));
    }
}

pub fn print_values(column: &str, values: &[String]) {
    if values.is_empty() {
        eprintln!("no match for {column}");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell(column)]);
    apply_table_style(&mut table);
    for value in values {
        table.add_row(vec![Cell::new(value)]);
    }
    println!("{table}");
}

pub fn print_mapped_rows(schema: &Schema<'_>, rows: &[MappedRow], totals: MapTotals) {
    println!("Schema: {}", schema.name());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Element"),
        header_cell("HL7"),
        header_cell("Value"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for row in rows {
        for (name, value) in &row.record.values {
            let hl7 = schema
                .element(name)
                .and_then(|element| element.hl7_field.as_deref());
            table.add_row(vec![
                Cell::new(row.index),
                Cell::new(name),
                hl7.map_or_else(|| dim_cell("-"), Cell::new),
                Cell::new(value),
            ]);
        }
    }
    println!("{table}");

    let mut issues = Table::new();
    issues.set_header(vec![
        header_cell("Row"),
        header_cell("Level"),
        header_cell("Field"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut issues);
    align_column(&mut issues, 0, CellAlignment::Right);
    align_column(&mut issues, 1, CellAlignment::Center);
    let mut issue_count = 0usize;
    for row in rows {
        for log in &row.record.logs {
            issue_count += 1;
            issues.add_row(vec![
                Cell::new(row.index),
                level_cell(log.level),
                Cell::new(&log.field),
                Cell::new(&log.message),
            ]);
        }
    }
    if issue_count > 0 {
        println!();
        println!("Issues:");
        println!("{issues}");
    }
    println!(
        "Rows: {}  Errors: {}  Warnings: {}",
        totals.rows, totals.errors, totals.warnings
    );
}

pub fn print_history(history: &DetailedSubmissionHistory) {
    println!("Submission: {}", history.submission_id);
    if let Some(id) = &history.id {
        println!("Report: {id}");
    }
    println!("Sender: {}", history.sender);
    println!("Received: {}", history.timestamp.to_rfc3339());
    println!("Status: {}", history.overall_status.label());
    if let Some(at) = history.actual_completion_at {
        println!("Delivered: {}", at.to_rfc3339());
    } else if let Some(at) = history.planned_completion_at {
        println!("Planned delivery: {}", at.to_rfc3339());
    }

    if !history.destinations.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Destination"),
            header_cell("Items"),
            header_cell("Before filtering"),
            header_cell("Filtered"),
            header_cell("Sent"),
            header_cell("Downloaded"),
        ]);
        apply_table_style(&mut table);
        for index in 1..=5 {
            align_column(&mut table, index, CellAlignment::Right);
        }
        for destination in &history.destinations {
            table.add_row(destination_row(destination));
        }
        println!("{table}");
    }

    print_log_table("Errors", history.error_logs(), Color::Red);
    print_log_table("Warnings", history.warning_logs(), Color::Yellow);
}

fn destination_row(destination: &Destination) -> Vec<Cell> {
    let sent: usize = destination.sent_reports.iter().map(|r| r.item_count).sum();
    let downloaded: usize = destination
        .downloaded_reports
        .iter()
        .map(|r| r.item_count)
        .sum();
    let name = if destination.is_finished() {
        Cell::new(destination.name()).fg(Color::Green)
    } else {
        Cell::new(destination.name())
    };
    vec![
        name,
        Cell::new(destination.item_count),
        destination
            .item_count_before_qual_filter
            .map_or_else(|| dim_cell("-"), Cell::new),
        count_cell(destination.filtered_report_items.len(), Color::Yellow),
        count_cell(sent, Color::Green),
        count_cell(downloaded, Color::Green),
    ]
}

fn print_log_table(label: &str, logs: &[ConsolidatedActionLog], color: Color) {
    if logs.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Scope"),
        header_cell("Items"),
        header_cell("Field"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for log in logs {
        let items = match &log.indices {
            Some(_) => Cell::new(log.item_count()).fg(color),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(format!("{:?}", log.scope).to_uppercase()),
            items,
            log.field.as_deref().map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&log.message),
        ]);
    }
    println!();
    println!("{label}:");
    println!("{table}");
}

fn level_cell(level: ActionLogLevel) -> Cell {
    match level {
        ActionLogLevel::Error => Cell::new("ERROR").fg(Color::Red),
        ActionLogLevel::Warning => Cell::new("WARN").fg(Color::Yellow),
        ActionLogLevel::Filter => Cell::new("FILTER").fg(Color::Blue),
        ActionLogLevel::Info => dim_cell("INFO"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
