//! Table rendering for dataset summaries and processing results.

use asdp_model::{DatasetSummary, Estimate, ProcessingResult, User};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Print the summary of an uploaded dataset.
pub fn print_summary(summary: &DatasetSummary) {
    println!("Rows: {}", summary.rows);
    println!("Columns: {}", summary.columns);
    println!("{}", summary_table(summary));

    let numeric = summary.numeric_columns();
    if numeric.is_empty() {
        println!("Numeric columns: none");
    } else {
        println!("Numeric columns: {}", numeric.join(", "));
    }
}

/// Print the cleaning log, estimates and plot names of a run.
pub fn print_result(result: &ProcessingResult) {
    if !result.cleaning_log.is_empty() {
        println!("Cleaning log:");
        for entry in &result.cleaning_log {
            println!("- {entry}");
        }
    }

    if result.has_estimates() {
        println!();
        println!("Estimates:");
        println!("{}", estimates_table(result));
    }

    if !result.plots.is_empty() {
        println!();
        println!(
            "Plots: {}",
            result.plots.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    }
}

/// Print the signed-in user.
pub fn print_user(user: &User) {
    println!("Signed in as {}", user.username);
    if let Some(role) = &user.role {
        println!("Role: {role}");
    }
    if let Some(email) = &user.email {
        println!("Email: {email}");
    }
}

/// One row per column: name, type, whether numeric, whether it has gaps.
#[must_use]
pub fn summary_table(summary: &DatasetSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Numeric"),
        header_cell("Missing"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Center);

    let missing: Vec<&str> = summary.missing_columns().collect();
    for column in &summary.column_names {
        let data_type = summary.data_type(column).unwrap_or("-");
        table.add_row(vec![
            Cell::new(column).add_attribute(Attribute::Bold),
            Cell::new(data_type),
            flag_cell(asdp_model::is_numeric_type(data_type), Color::Green),
            flag_cell(missing.contains(&column.as_str()), Color::Yellow),
        ]);
    }
    table
}

/// One row per estimated variable, preferring the weighted estimate.
#[must_use]
pub fn estimates_table(result: &ProcessingResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Basis"),
        header_cell("Mean"),
        header_cell("Std"),
        header_cell("SE"),
        header_cell("95% CI"),
    ]);
    apply_table_style(&mut table);
    for index in 2..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for (variable, estimates) in &result.estimates {
        let Some(estimate) = estimates.preferred() else {
            table.add_row(vec![
                Cell::new(variable),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
            ]);
            continue;
        };
        let basis = if estimates.weighted.is_some() {
            Cell::new("weighted").fg(Color::Blue)
        } else {
            dim_cell("unweighted")
        };
        table.add_row(vec![
            Cell::new(variable).add_attribute(Attribute::Bold),
            basis,
            Cell::new(format_value(estimate.mean)),
            Cell::new(format_value(estimate.std)),
            Cell::new(format_value(estimate.se)),
            Cell::new(format_interval(estimate)),
        ]);
    }
    table
}

fn format_value(value: f64) -> String {
    format!("{value:.4}")
}

fn format_interval(estimate: &Estimate) -> String {
    format!(
        "[{}, {}]",
        format_value(estimate.ci_95_lower),
        format_value(estimate.ci_95_upper)
    )
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
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

fn flag_cell(flag: bool, color: Color) -> Cell {
    if flag {
        Cell::new("yes").fg(color)
    } else {
        dim_cell("-")
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
