use std::fmt::Write as _;

use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use vault_core::filter::{FilterOptions, SELECT_ALL};
use vault_core::perks::PerkSlotDiagnostic;
use vault_core::table::{Cell, Table};

const INDEX_HEADER: &str = "#";
const COLUMN_GAP: &str = "  ";
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRenderOptions {
    /// Cells wider than this are cut and end in `...`.
    pub max_column_width: usize,
    /// Prefix every row with its 1-based position.
    pub row_index: bool,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            row_index: true,
        }
    }
}

/// One JSON object per row, keys in column order.
pub fn render_table_json(table: &Table) -> JsonValue {
    JsonValue::Array(
        table
            .rows()
            .map(|row| {
                let mut out = JsonMap::new();
                for (column, cell) in table.columns().iter().zip(row.cells()) {
                    out.insert(column.clone(), cell_to_json(cell));
                }
                JsonValue::Object(out)
            })
            .collect(),
    )
}

pub fn cell_to_json(cell: &Cell) -> JsonValue {
    match cell {
        Cell::Empty => JsonValue::Null,
        Cell::Bool(v) => JsonValue::Bool(*v),
        Cell::Int(v) => JsonValue::from(*v),
        Cell::Float(v) => JsonNumber::from_f64(*v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Cell::Text(s) => JsonValue::String(s.clone()),
    }
}

pub fn render_table_text(table: &Table) -> String {
    render_table_text_with_options(table, TextRenderOptions::default())
}

/// Aligned grid with a header line. Numbers are right-aligned, everything
/// else left-aligned.
pub fn render_table_text_with_options(table: &Table, options: TextRenderOptions) -> String {
    let headers: Vec<String> = table
        .columns()
        .iter()
        .map(|c| fit_column(c, options.max_column_width))
        .collect();
    let body: Vec<Vec<(String, bool)>> = table
        .rows()
        .map(|row| {
            row.cells()
                .iter()
                .map(|cell| {
                    let numeric = matches!(cell, Cell::Int(_) | Cell::Float(_));
                    (fit_column(&cell.to_string(), options.max_column_width), numeric)
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, (value, _)) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }
    let index_width = if options.row_index {
        INDEX_HEADER.len().max(body.len().to_string().len())
    } else {
        0
    };

    let mut out = String::new();
    let mut line = String::new();
    if options.row_index {
        write!(line, "{:>index_width$}{COLUMN_GAP}", INDEX_HEADER)
            .expect("writing to String cannot fail");
    }
    for (header, width) in headers.iter().zip(&widths) {
        write!(line, "{:<width$}{COLUMN_GAP}", header).expect("writing to String cannot fail");
    }
    writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");

    for (position, row) in body.iter().enumerate() {
        line.clear();
        if options.row_index {
            write!(line, "{:>index_width$}{COLUMN_GAP}", position + 1)
                .expect("writing to String cannot fail");
        }
        for ((value, numeric), width) in row.iter().zip(&widths) {
            let written = if *numeric {
                write!(line, "{:>width$}{COLUMN_GAP}", value)
            } else {
                write!(line, "{:<width$}{COLUMN_GAP}", value)
            };
            written.expect("writing to String cannot fail");
        }
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }

    if body.is_empty() {
        writeln!(out, "(no rows)").expect("writing to String cannot fail");
    }
    out
}

pub fn render_options_json(options: &FilterOptions) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("tiers".to_string(), strings_to_json(&options.tiers));
    out.insert("types".to_string(), strings_to_json(&options.types));
    out.insert("archetypes".to_string(), strings_to_json(&options.archetypes));
    out.insert("slots".to_string(), strings_to_json(&options.slots));
    out.insert("elements".to_string(), strings_to_json(&options.elements));
    JsonValue::Object(out)
}

/// Picker contents as a presentation layer offers them: single-selects lead
/// with the "no restriction" sentinel.
pub fn render_options_text(options: &FilterOptions) -> String {
    let mut out = String::new();
    writeln!(out, "Tiers: {}", options.tiers.join(", ")).expect("writing to String cannot fail");
    for (label, values) in [
        ("Types", &options.types),
        ("Archetypes", &options.archetypes),
        ("Slots", &options.slots),
        ("Elements", &options.elements),
    ] {
        let offered: Vec<&str> = std::iter::once(SELECT_ALL)
            .chain(values.iter().map(String::as_str))
            .collect();
        writeln!(out, "{label}: {}", offered.join(", ")).expect("writing to String cannot fail");
    }
    out
}

pub fn render_diagnostics_text(diagnostics: &[PerkSlotDiagnostic]) -> String {
    let mut out = String::new();
    for d in diagnostics {
        let weapon = d.weapon_name.as_deref().unwrap_or("?");
        let written = if d.is_unmatched() {
            writeln!(
                out,
                "{weapon} [{}]: '{}' matches no slot option",
                d.instance_id, d.perk
            )
        } else {
            writeln!(
                out,
                "{weapon} [{}]: '{}' matches {}",
                d.instance_id,
                d.perk,
                d.candidates.join(", ")
            )
        };
        written.expect("writing to String cannot fail");
    }
    out
}

fn strings_to_json(values: &[String]) -> JsonValue {
    JsonValue::Array(values.iter().cloned().map(JsonValue::String).collect())
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out: String = value.chars().take(width - 3).collect();
    out.push_str("...");
    out
}
