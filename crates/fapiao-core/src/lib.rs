//! Core library for invoice batch aggregation.
//!
//! This crate provides:
//! - Vision-based extraction of invoice line items via an external
//!   multimodal service (behind the [`VisionClient`] trait)
//! - Normalization of heterogeneous extraction results into canonical
//!   per-invoice records
//! - Sequential batch orchestration with upload limits and per-file
//!   failure accounting
//! - Assembly of all records into a single xlsx spreadsheet

pub mod batch;
pub mod error;
pub mod models;
pub mod normalize;
pub mod sheet;
pub mod vision;

pub use error::{BatchError, FapiaoError, Result, SheetError, VisionError};
pub use models::config::{BatchLimits, FapiaoConfig, ImageConfig, VisionConfig};
pub use models::record::{InvoiceRecord, LineItem, MediaType, SkippedFile, UploadedFile};
pub use batch::{BatchAggregator, BatchReport};
pub use normalize::{normalize, RawShape};
pub use sheet::{assemble, layout_rows, suggested_filename};
pub use vision::{HttpVisionClient, ImagePreparer, PromptVariant, VisionClient};
