//! Invoice record models carried through the pipeline.

use serde::{Deserialize, Serialize};

/// Media type of an uploaded file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Raster image (png/jpg/jpeg).
    Image,
    /// PDF document.
    Pdf,
}

impl MediaType {
    /// Classify a filename against the allow-set {png, jpg, jpeg, pdf}.
    ///
    /// Returns `None` for anything outside the allow-set, including
    /// filenames without an extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" => Some(MediaType::Image),
            "pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }
}

/// One uploaded file, owned by a single batch run.
///
/// Consumed by value during processing; the content buffer is dropped
/// as soon as the file's extraction attempt completes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename, used for display and as the default date.
    pub filename: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file from a filename and its bytes.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    /// Media type from the filename, `None` if disallowed.
    pub fn media_type(&self) -> Option<MediaType> {
        MediaType::from_filename(&self.filename)
    }
}

/// One line of an invoice.
///
/// All four fields are display strings, never numbers: quantities may
/// be fractional, prices may carry currency formatting. The JSON field
/// names match what the vision service is prompted to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service name.
    #[serde(rename = "品名", default)]
    pub name: String,

    /// Quantity.
    #[serde(rename = "数量", default)]
    pub quantity: String,

    /// Unit price.
    #[serde(rename = "单价", default)]
    pub unit_price: String,

    /// Total amount.
    #[serde(rename = "金额", default)]
    pub amount: String,
}

impl LineItem {
    /// Create a line item from its four display fields.
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
            amount: amount.into(),
        }
    }
}

/// Canonical normalized representation of one invoice.
///
/// Created once after successful normalization, never mutated, and
/// consumed exactly once by the spreadsheet assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Filename the record came from.
    pub source_filename: String,

    /// 1-based position among the batch's successes, in upload order.
    /// Failed files do not consume an index.
    pub sequence_index: usize,

    /// Best-effort date label; the source filename when the extraction
    /// result carried no date.
    pub date: String,

    /// Ordered line items, possibly empty.
    pub items: Vec<LineItem>,
}

/// A file that was skipped during a batch run, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    /// Filename as submitted.
    pub filename: String,
    /// Human-readable skip reason.
    pub reason: String,
}
