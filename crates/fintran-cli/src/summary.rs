use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use fintran_model::{IrField, SeverityFilter, ValidationReport, ValidationResult};
use serde_json::Value;

/// Outcome of a `convert` run, for display.
#[derive(Debug)]
pub struct ConversionSummary<'a> {
    pub input: &'a Path,
    /// `None` for a dry run.
    pub output: Option<&'a Path>,
    pub rows: usize,
    pub columns: Vec<String>,
    pub report_file: Option<&'a Path>,
}

pub fn print_conversion(summary: &ConversionSummary<'_>, reports: &[ValidationReport]) {
    println!("Input: {}", summary.input.display());
    match summary.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: (dry run, nothing written)"),
    }
    println!("Rows: {}", summary.rows);
    println!("Columns: {}", summary.columns.join(", "));
    if let Some(path) = summary.report_file {
        println!("Validation report: {}", path.display());
    }
    for report in reports {
        println!();
        print_report(report, None);
    }
}

pub fn print_report(report: &ValidationReport, filter: Option<SeverityFilter>) {
    println!("{}", report.summary());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Validator"),
        header_cell("Status"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    let shown: Vec<&ValidationResult> = report
        .results()
        .iter()
        .filter(|result| match filter {
            Some(SeverityFilter::Errors) => result.has_errors(),
            Some(SeverityFilter::Warnings) => result.has_warnings(),
            None => true,
        })
        .collect();
    for result in &shown {
        table.add_row(vec![
            Cell::new(result.validator_name()).add_attribute(Attribute::Bold),
            status_cell(result),
            count_cell(result.errors().len(), Color::Red),
            count_cell(result.warnings().len(), Color::Yellow),
        ]);
    }
    println!("{table}");

    for result in shown {
        for error in result.errors() {
            println!("  [ERROR] {}: {error}", result.validator_name());
        }
        for warning in result.warnings() {
            println!("  [WARN]  {}: {warning}", result.validator_name());
        }
    }
}

pub fn print_schema(fields: &[IrField]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Required"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for field in fields {
        table.add_row(vec![
            Cell::new(field.name).add_attribute(Attribute::Bold),
            Cell::new(field.ty.as_str()),
            if field.required {
                Cell::new("yes").fg(Color::Green)
            } else {
                dim_cell("no")
            },
        ]);
    }
    println!("{table}");
}

/// Lists validator types with their canonical names, then the full document schema.
pub fn print_rules(types: &[(&str, &str)], schema: &Value) -> serde_json::Result<()> {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Type"), header_cell("Runs as")]);
    apply_table_style(&mut table);
    for (name, canonical) in types {
        let runs_as = if name == canonical {
            dim_cell("-")
        } else {
            Cell::new(canonical)
        };
        table.add_row(vec![Cell::new(name).add_attribute(Attribute::Bold), runs_as]);
    }
    println!("{table}");
    println!("{}", serde_json::to_string_pretty(schema)?);
    Ok(())
}

fn status_cell(result: &ValidationResult) -> Cell {
    if result.has_errors() {
        Cell::new("FAIL").fg(Color::Red).add_attribute(Attribute::Bold)
    } else if result.has_warnings() {
        Cell::new("WARN").fg(Color::Yellow)
    } else {
        Cell::new("PASS").fg(Color::Green)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .add_attribute(Attribute::Bold)
        .fg(Color::Cyan)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).add_attribute(Attribute::Dim)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    }
}

fn apply_table_style(table: &mut Table) {
    table.load_preset(UTF8_FULL_CONDENSED);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(120);
    if let Some(column) = table.column_mut(0) {
        column.set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(12)));
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
