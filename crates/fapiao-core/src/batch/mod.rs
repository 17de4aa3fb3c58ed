//! Batch orchestration: sequential per-file extraction with limits.

use tracing::{debug, info, warn};

use crate::error::BatchError;
use crate::models::config::{BatchLimits, ImageConfig};
use crate::models::record::{InvoiceRecord, MediaType, SkippedFile, UploadedFile};
use crate::normalize::normalize;
use crate::vision::{ImagePreparer, PromptVariant, VisionClient};

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Outcome of one batch run: ordered records plus skip accounting.
#[derive(Debug)]
pub struct BatchReport {
    /// Canonical records for every successful file, in upload order,
    /// with contiguous 1-based sequence indices.
    pub records: Vec<InvoiceRecord>,

    /// Files that were skipped, with reasons, in upload order.
    pub skipped: Vec<SkippedFile>,
}

/// Orchestrates one batch run over an ordered list of uploads.
///
/// Files are processed strictly one at a time; each file's buffer is
/// dropped before the next file starts, so peak memory stays bounded
/// by a single file's footprint regardless of batch size. One
/// aggregator instance per run; nothing is shared across runs.
pub struct BatchAggregator<C: VisionClient> {
    client: C,
    limits: BatchLimits,
    preparer: ImagePreparer,
    prompt: PromptVariant,
}

impl<C: VisionClient> BatchAggregator<C> {
    /// Create an aggregator with default limits and image settings.
    pub fn new(client: C) -> Self {
        Self {
            client,
            limits: BatchLimits::default(),
            preparer: ImagePreparer::default(),
            prompt: PromptVariant::default(),
        }
    }

    /// Set batch limits.
    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set image preparation settings.
    pub fn with_image_config(mut self, config: &ImageConfig) -> Self {
        self.preparer = ImagePreparer::new(config);
        self
    }

    /// Set the extraction prompt variant.
    pub fn with_prompt(mut self, prompt: PromptVariant) -> Self {
        self.prompt = prompt;
        self
    }

    /// Run the batch over the uploaded files, in order.
    ///
    /// Rejects the whole batch before touching any file when the count
    /// or total size exceeds the limits. Per-file failures are logged,
    /// recorded in the report, and never abort the run; a failed file
    /// does not consume a sequence index. If nothing succeeds the run
    /// terminates with [`BatchError::NoInvoicesProcessed`].
    pub fn run(&self, files: Vec<UploadedFile>) -> Result<BatchReport> {
        if files.len() > self.limits.max_files {
            return Err(BatchError::TooManyFiles {
                count: files.len(),
                max: self.limits.max_files,
            });
        }

        let total_bytes: usize = files.iter().map(|f| f.content.len()).sum();
        if total_bytes > self.limits.max_total_bytes {
            return Err(BatchError::PayloadTooLarge {
                bytes: total_bytes,
                max: self.limits.max_total_bytes,
            });
        }

        let count = files.len();
        let mut records: Vec<InvoiceRecord> = Vec::new();
        let mut skipped: Vec<SkippedFile> = Vec::new();

        for (idx, file) in files.into_iter().enumerate() {
            info!("[{}/{}] processing {}", idx + 1, count, file.filename);
            match self.process_file(&file, records.len() + 1) {
                Ok(record) => {
                    debug!(
                        "extracted {} item(s) from {}",
                        record.items.len(),
                        file.filename
                    );
                    records.push(record);
                }
                Err(reason) => {
                    warn!("skipping {}: {}", file.filename, reason);
                    skipped.push(SkippedFile {
                        filename: file.filename.clone(),
                        reason,
                    });
                }
            }
            // `file` drops here, releasing its buffer before the next
            // iteration begins.
        }

        if records.is_empty() {
            return Err(BatchError::NoInvoicesProcessed);
        }

        Ok(BatchReport { records, skipped })
    }

    /// Validate, prepare, extract and normalize one file. The error is
    /// a human-readable skip reason; it never propagates past the run
    /// loop.
    fn process_file(
        &self,
        file: &UploadedFile,
        sequence_index: usize,
    ) -> std::result::Result<InvoiceRecord, String> {
        let media_type = file
            .media_type()
            .ok_or_else(|| "disallowed file type".to_string())?;

        // PDFs pass through unprepared; the preparer also falls back to
        // the original bytes when decoding fails.
        let payload = match media_type {
            MediaType::Image => self.preparer.prepare(&file.content),
            MediaType::Pdf => file.content.clone(),
        };

        let raw = self
            .client
            .extract(&payload, self.prompt)
            .map_err(|e| e.to_string())?;

        Ok(normalize(&raw, &file.filename, sequence_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use crate::models::record::LineItem;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// Scripted client: pops one canned response per call and counts
    /// how many calls were made.
    struct ScriptedClient {
        responses: RefCell<Vec<std::result::Result<serde_json::Value, VisionError>>>,
        calls: Cell<usize>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<std::result::Result<serde_json::Value, VisionError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                calls: Cell::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.get()
        }
    }

    impl VisionClient for &ScriptedClient {
        fn extract(
            &self,
            _image: &[u8],
            _prompt: PromptVariant,
        ) -> std::result::Result<serde_json::Value, VisionError> {
            self.calls.set(self.calls.get() + 1);
            self.responses.borrow_mut().remove(0)
        }
    }

    fn jpg(name: &str) -> UploadedFile {
        UploadedFile::new(name, vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    fn flat(date: &str, items: Vec<serde_json::Value>) -> serde_json::Value {
        json!({"date": date, "items": items})
    }

    #[test]
    fn test_all_successes_in_order() {
        let client = ScriptedClient::new(vec![
            Ok(flat("d1", vec![])),
            Ok(flat("d2", vec![])),
        ]);
        let report = BatchAggregator::new(&client)
            .run(vec![jpg("a.jpg"), jpg("b.jpg")])
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].sequence_index, 1);
        assert_eq!(report.records[0].source_filename, "a.jpg");
        assert_eq!(report.records[1].sequence_index, 2);
        assert_eq!(report.records[1].source_filename, "b.jpg");
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_too_many_files_rejected_before_any_call() {
        let client = ScriptedClient::new(vec![]);
        let files: Vec<_> = (0..3).map(|i| jpg(&format!("{}.jpg", i))).collect();
        let err = BatchAggregator::new(&client)
            .with_limits(BatchLimits {
                max_files: 2,
                max_total_bytes: 1024,
            })
            .run(files)
            .unwrap_err();
        assert!(matches!(
            err,
            BatchError::TooManyFiles { count: 3, max: 2 }
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_payload_too_large_rejected_before_any_call() {
        let client = ScriptedClient::new(vec![]);
        let files = vec![
            UploadedFile::new("a.jpg", vec![0u8; 600]),
            UploadedFile::new("b.jpg", vec![0u8; 600]),
        ];
        let err = BatchAggregator::new(&client)
            .with_limits(BatchLimits {
                max_files: 10,
                max_total_bytes: 1000,
            })
            .run(files)
            .unwrap_err();
        assert!(matches!(
            err,
            BatchError::PayloadTooLarge { bytes: 1200, max: 1000 }
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_failed_files_skip_without_consuming_index() {
        let client = ScriptedClient::new(vec![
            Ok(flat("d1", vec![])),
            Err(VisionError::Network("connection reset".to_string())),
            Ok(flat("d3", vec![])),
        ]);
        let report = BatchAggregator::new(&client)
            .run(vec![jpg("a.jpg"), jpg("b.jpg"), jpg("c.jpg")])
            .unwrap();
        // Successes are re-numbered contiguously in original order
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].source_filename, "a.jpg");
        assert_eq!(report.records[0].sequence_index, 1);
        assert_eq!(report.records[1].source_filename, "c.jpg");
        assert_eq!(report.records[1].sequence_index, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].filename, "b.jpg");
    }

    #[test]
    fn test_disallowed_extension_skipped_without_call() {
        let client = ScriptedClient::new(vec![Ok(flat("d", vec![]))]);
        let report = BatchAggregator::new(&client)
            .run(vec![UploadedFile::new("notes.txt", vec![1, 2]), jpg("a.jpg")])
            .unwrap();
        assert_eq!(client.call_count(), 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].source_filename, "a.jpg");
        assert_eq!(report.skipped[0].filename, "notes.txt");
    }

    #[test]
    fn test_all_failures_terminate_with_no_invoices() {
        let client = ScriptedClient::new(vec![
            Err(VisionError::MissingContent),
            Err(VisionError::MalformedJson("not json".to_string())),
        ]);
        let err = BatchAggregator::new(&client)
            .run(vec![jpg("a.jpg"), jpg("b.jpg")])
            .unwrap_err();
        assert!(matches!(err, BatchError::NoInvoicesProcessed));
    }

    #[test]
    fn test_scenario_partial_failure_record_content() {
        let client = ScriptedClient::new(vec![
            Ok(json!({
                "date": "2020.10.1",
                "items": [{"品名": "海带丝", "数量": "1", "单价": "5.00", "金额": "5.00"}]
            })),
            Err(VisionError::Network("timeout".to_string())),
        ]);
        let report = BatchAggregator::new(&client)
            .run(vec![jpg("a.jpg"), jpg("b.jpg")])
            .unwrap();
        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.sequence_index, 1);
        assert_eq!(record.date, "2020.10.1");
        assert_eq!(
            record.items,
            vec![LineItem::new("海带丝", "1", "5.00", "5.00")]
        );
    }

    #[test]
    fn test_independent_runs_share_nothing() {
        let client = ScriptedClient::new(vec![Ok(flat("d1", vec![])), Ok(flat("d2", vec![]))]);
        let aggregator = BatchAggregator::new(&client);
        let first = aggregator.run(vec![jpg("a.jpg")]).unwrap();
        let second = aggregator.run(vec![jpg("b.jpg")]).unwrap();
        // Sequence numbering restarts per run
        assert_eq!(first.records[0].sequence_index, 1);
        assert_eq!(second.records[0].sequence_index, 1);
    }
}
