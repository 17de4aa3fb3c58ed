//! Normalization of heterogeneous extraction results.
//!
//! The vision service answers with one of a few loosely specified JSON
//! shapes. Everything funnels into [`InvoiceRecord`], and normalization
//! is total: no shape, however malformed, produces an error — at worst
//! the record has zero items.

use serde_json::Value;
use tracing::debug;

use crate::models::record::{InvoiceRecord, LineItem};

/// Raw result shapes observed from the extraction service, detected
/// structurally by key presence rather than a discriminant field.
#[derive(Debug, Clone, PartialEq)]
pub enum RawShape {
    /// `{date, items: [{品名, 数量, 单价, 金额}, ...]}`.
    FlatItems {
        /// Optional date label.
        date: Option<String>,
        /// Item objects, possibly with missing sub-fields.
        items: Vec<Value>,
    },
    /// `{rows: [[cell, ...], ...]}` free-form table.
    RowsTable {
        /// Rows of arbitrary width.
        rows: Vec<Value>,
    },
    /// Anything else; normalizes to a record with zero items.
    Unrecognized,
}

impl RawShape {
    /// Classify a raw extraction value by structure: an `items` array
    /// wins over a `rows` array, anything else is unrecognized.
    pub fn classify(raw: &Value) -> Self {
        if let Some(items) = raw.get("items").and_then(|v| v.as_array()) {
            return RawShape::FlatItems {
                date: raw
                    .get("date")
                    .and_then(|d| d.as_str())
                    .map(|s| s.to_string()),
                items: items.clone(),
            };
        }

        if let Some(rows) = raw.get("rows").and_then(|v| v.as_array()) {
            return RawShape::RowsTable { rows: rows.clone() };
        }

        RawShape::Unrecognized
    }
}

/// Convert one extraction result into a canonical invoice record.
///
/// `sequence_index` is the 1-based position among the batch's
/// successes; the caller assigns it in upload order.
pub fn normalize(raw: &Value, filename: &str, sequence_index: usize) -> InvoiceRecord {
    let shape = RawShape::classify(raw);

    let (date, items) = match shape {
        RawShape::FlatItems { date, items } => {
            let items = items.iter().map(item_from_object).collect();
            (date, items)
        }
        RawShape::RowsTable { rows } => {
            let items = rows.iter().filter_map(item_from_row).collect();
            (None, items)
        }
        RawShape::Unrecognized => {
            debug!("unrecognized extraction shape for {}", filename);
            (None, Vec::new())
        }
    };

    let date = match date {
        Some(d) if !d.trim().is_empty() => d,
        _ => filename.to_string(),
    };

    InvoiceRecord {
        source_filename: filename.to_string(),
        sequence_index,
        date,
        items,
    }
}

/// Render any JSON cell as a display string.
fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn field(obj: &Value, key: &str) -> String {
    obj.get(key).map(cell_to_string).unwrap_or_default()
}

/// Map one flat-shape item object; missing sub-fields become empty
/// strings, never null.
fn item_from_object(obj: &Value) -> LineItem {
    LineItem {
        name: field(obj, "品名"),
        quantity: field(obj, "数量"),
        unit_price: field(obj, "单价"),
        amount: field(obj, "金额"),
    }
}

/// Map one table row to an item. Rows are never dropped silently:
/// - exactly 4 cells map positionally to the 4 fields;
/// - narrower rows are kept verbatim in the name column;
/// - wider rows keep the first three cells positional and fold the
///   rest into the amount column.
/// Only rows with zero cells (no content at all) produce nothing.
fn item_from_row(row: &Value) -> Option<LineItem> {
    let cells: Vec<String> = match row.as_array() {
        Some(cells) => cells.iter().map(cell_to_string).collect(),
        // A non-array "row" is still content; keep it in the name column.
        None => vec![cell_to_string(row)],
    };

    match cells.len() {
        0 => None,
        4 => Some(LineItem {
            name: cells[0].clone(),
            quantity: cells[1].clone(),
            unit_price: cells[2].clone(),
            amount: cells[3].clone(),
        }),
        n if n < 4 => Some(LineItem {
            name: cells.join(" "),
            ..LineItem::default()
        }),
        _ => Some(LineItem {
            name: cells[0].clone(),
            quantity: cells[1].clone(),
            unit_price: cells[2].clone(),
            amount: cells[3..].join(" "),
        }),
    }
}
