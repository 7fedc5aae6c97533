//! Plain-text rendering of a table snapshot.

use audit_core::{format_timestamp, ColumnSet, TableRow, TableSnapshot};
use shared::domain::{RecordField, SortOrder};

const COLUMN_GAP: &str = "  ";

pub fn render_table(snapshot: &TableSnapshot, columns: &ColumnSet) -> String {
    let mut out = String::new();

    if snapshot.loading {
        out.push_str("Loading users...\n");
    }
    if let Some(error) = &snapshot.error {
        out.push_str(&format!("ERROR: {error}\n"));
    }
    out.push_str(&format!(
        "Page {} of {} ({} matched)",
        snapshot.current_page, snapshot.page_count, snapshot.total_matched
    ));
    if !snapshot.search.is_empty() {
        out.push_str(&format!(" | search: \"{}\"", snapshot.search));
    }
    out.push_str(&format!(" | time: {}\n", snapshot.time_format));

    let header: Vec<String> = columns
        .columns()
        .iter()
        .map(|column| {
            let marker = match (snapshot.sort.field, column.field) {
                (Some(active), Some(field)) if active == field => match snapshot.sort.order {
                    SortOrder::Asc => " ^",
                    SortOrder::Desc => " v",
                },
                _ => "",
            };
            format!("{}{marker}", column.name)
        })
        .collect();

    let body: Vec<Vec<String>> = snapshot
        .rows
        .iter()
        .map(|row| {
            columns
                .columns()
                .iter()
                .map(|column| cell(row, column.field, snapshot))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .filter_map(|cells| cells.get(i))
                .chain(header.get(i))
                .map(|text| text.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    out.push_str(&line(&header, &widths));
    out.push_str(&line(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    ));
    for cells in &body {
        out.push_str(&line(cells, &widths));
    }
    if snapshot.rows.is_empty() && snapshot.error.is_none() {
        out.push_str("(no rows)\n");
    }
    out
}

fn cell(row: &TableRow, field: Option<RecordField>, snapshot: &TableSnapshot) -> String {
    match field {
        Some(RecordField::CreatedDate) => {
            format_timestamp(&row.record.created_date, snapshot.time_format)
        }
        Some(field) => row.record.field(field).to_string(),
        None => delete_cell(row),
    }
}

fn delete_cell(row: &TableRow) -> String {
    if row.status.deleting {
        "Deleting...".to_string()
    } else if let Some(reason) = &row.status.delete_error {
        format!("ERROR: {reason}")
    } else {
        "[delete]".to_string()
    }
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(text, &width)| format!("{text:<width$}"))
        .collect();
    format!("{}\n", padded.join(COLUMN_GAP).trim_end())
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
