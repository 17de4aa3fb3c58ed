//! Error types for the fapiao-core library.

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// Vision extraction error.
    #[error("vision error: {0}")]
    Vision(#[from] VisionError),

    /// Batch processing error.
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Spreadsheet assembly error.
    #[error("sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the external vision extraction service.
///
/// All variants are per-file and non-fatal to a batch: the failing
/// file is skipped and remaining files continue.
#[derive(Error, Debug)]
pub enum VisionError {
    /// Network failure or timeout talking to the service.
    #[error("network failure: {0}")]
    Network(String),

    /// The service reported an API-level error.
    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response carried no text content.
    #[error("response has no content")]
    MissingContent,

    /// The response text was not valid JSON after fence stripping.
    #[error("unparseable response: {0}")]
    MalformedJson(String),
}

/// Errors that reject or terminate a whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    /// More files submitted than the configured maximum.
    #[error("too many files: {count} submitted, limit is {max}")]
    TooManyFiles { count: usize, max: usize },

    /// Total upload size exceeds the configured cap.
    #[error("upload too large: {bytes} bytes, limit is {max}")]
    PayloadTooLarge { bytes: usize, max: usize },

    /// Every file failed extraction or was disallowed.
    #[error("no invoices could be processed")]
    NoInvoicesProcessed,
}

/// Errors from spreadsheet construction. Fatal to the batch.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The xlsx writer failed.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
