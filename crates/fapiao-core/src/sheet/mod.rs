//! Spreadsheet assembly: one xlsx from all records of a batch.

use chrono::Local;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use tracing::debug;

use crate::error::SheetError;
use crate::models::record::InvoiceRecord;

/// Result type for sheet operations.
pub type Result<T> = std::result::Result<T, SheetError>;

/// Worksheet name for the combined output.
pub const SHEET_NAME: &str = "所有发票";

/// Fixed header row: name, quantity, unit price, amount.
pub const HEADER: [&str; 4] = ["品名", "数量", "单价", "金额"];

/// Column widths: wide name column, narrow numeric-looking columns.
const COLUMN_WIDTHS: [f64; 4] = [25.0, 12.0, 12.0, 12.0];

/// Full-width divider between invoice blocks.
const DIVIDER_WIDTH: usize = 60;

/// Lay out the data rows (everything below the header) for the given
/// records, in sequence order.
///
/// This stage is pure: the same ordered records always produce the
/// same rows, which is what makes assembly deterministic and
/// idempotent.
pub fn layout_rows(records: &[InvoiceRecord]) -> Vec<[String; 4]> {
    let blank = <[String; 4]>::default;
    let mut rows = Vec::new();

    for record in records {
        rows.push([
            format!("=== 发票 {} ===", record.sequence_index),
            String::new(),
            String::new(),
            record.date.clone(),
        ]);
        rows.push(blank());

        for item in &record.items {
            rows.push([
                item.name.clone(),
                item.quantity.clone(),
                item.unit_price.clone(),
                item.amount.clone(),
            ]);
        }

        rows.push(blank());
        rows.push(["=".repeat(DIVIDER_WIDTH), String::new(), String::new(), String::new()]);
        rows.push(blank());
    }

    rows
}

/// Render the records into a single xlsx workbook, in memory.
///
/// Layout: bold centered header row, then one block per record
/// (separator row carrying the sequence index and date, the item rows
/// verbatim, and a divider). All data cells are center-aligned.
pub fn assemble(records: &[InvoiceRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold().set_align(FormatAlign::Center);
    let cell_format = Format::new().set_align(FormatAlign::Center);

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (col, header) in HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    let rows = layout_rows(records);
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string_with_format(
                (row_idx + 1) as u32,
                col as u16,
                value,
                &cell_format,
            )?;
        }
    }

    debug!("assembled {} records into {} rows", records.len(), rows.len());

    let bytes = workbook.save_to_buffer()?;
    Ok(bytes)
}

/// Suggested download filename: `所有发票_<YYYYMMDD_HHMMSS>.xlsx`.
pub fn suggested_filename() -> String {
    format!("所有发票_{}.xlsx", Local::now().format("%Y%m%d_%H%M%S"))
}
