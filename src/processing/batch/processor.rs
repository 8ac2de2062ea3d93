use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::{
    BatchProgress, DestinationSettings, DestinationType, ImageProcessingOptions, ImageStatus,
    ImageTask, ProcessedImage, ProcessedImageUpdate, ProgressEvent, ProgressType, ResultLedger,
};
use crate::processing::converter::{ConvertRequest, ImageConverter};
use crate::processing::destination::{resolve_destination, update_file_extension};
use crate::utils::{
    ConverterError, ConverterResult, FileHost, ImageFormat, is_accepted_content_type, validate_options,
};
use super::config::BatchConfig;
use super::metrics::{BatchReport, SaveFailure, SkippedFile};

/// Output bytes or the reason the item failed
type ItemOutcome = Result<Vec<u8>, String>;

/// Marks a batch as running until dropped
struct BatchGuard<'a>(&'a AtomicBool);

impl<'a> BatchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ConverterResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ConverterError::BatchInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs batches of conversions with bounded concurrency.
///
/// The coordinating task is the only writer of the ledger and the progress
/// counter; workers just run the converter and hand back `(id, outcome)`.
/// A conversion holds a permit until the converter returns, so one that
/// outlived its timeout still counts against the limit.
pub struct BatchProcessor {
    converter: Arc<dyn ImageConverter>,
    host: Arc<dyn FileHost>,
    config: BatchConfig,
    running: AtomicBool,
    progress: watch::Sender<BatchProgress>,
    permits: Arc<Semaphore>,
}

impl BatchProcessor {
    pub fn new(converter: Arc<dyn ImageConverter>, host: Arc<dyn FileHost>, config: BatchConfig) -> Self {
        debug!(
            "Creating BatchProcessor (concurrency {}, timeout {:?})",
            config.effective_concurrency(),
            config.item_timeout
        );
        let (progress, _) = watch::channel(BatchProgress::default());
        Self {
            converter,
            host,
            config,
            running: AtomicBool::new(false),
            progress,
            permits: Arc::new(Semaphore::new(config.effective_concurrency())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Current counter; `{0, 0}` while idle
    pub fn progress(&self) -> BatchProgress {
        *self.progress.borrow()
    }

    /// Processes `tasks` with one set of `options`.
    ///
    /// Individual failures end up as `error` records; only invalid options or
    /// an already running batch fail the whole call.
    pub async fn process_batch<F>(
        &self,
        ledger: &Mutex<ResultLedger>,
        tasks: Vec<ImageTask>,
        options: &ImageProcessingOptions,
        destination: &DestinationSettings,
        mut on_progress: F,
    ) -> ConverterResult<BatchReport>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        validate_options(options)?;
        let _guard = BatchGuard::acquire(&self.running)?;

        let mut report = BatchReport::default();
        let mut queue = VecDeque::with_capacity(tasks.len());
        for task in tasks {
            if is_accepted_content_type(&task.content_type) {
                queue.push_back(task);
            } else {
                let reason = format!("unsupported type: {}", task.content_type);
                warn!("Skipping {}: {}", task.file_name, reason);
                report.skipped.push(SkippedFile {
                    file_name: task.file_name,
                    reason,
                });
            }
        }

        let total = queue.len();
        let mut progress = BatchProgress::new(total);
        self.progress.send_replace(progress);
        info!(
            "Processing batch of {} images as {} ({} skipped)",
            total,
            options.summary(),
            report.skipped.len()
        );
        on_progress(&ProgressEvent::new(ProgressType::Start, progress));

        let concurrency = self.config.effective_concurrency();
        let mut workers: JoinSet<(String, ItemOutcome)> = JoinSet::new();
        let mut pending: HashSet<String> = HashSet::new();

        loop {
            while workers.len() < concurrency {
                let Some(task) = queue.pop_front() else { break };

                let record = ProcessedImage::start(&task, options);
                let id = record.id.clone();
                let (record_format, record_options) = (record.format, record.options.clone());
                let event = ProgressEvent::for_record(ProgressType::ItemStarted, progress, &record);
                ledger.lock().await.add(record);
                report.record_ids.push(id.clone());
                pending.insert(id.clone());
                on_progress(&event);

                let request = ConvertRequest {
                    image_data: task.data,
                    file_name: task.file_name,
                    format: record_format,
                    options: record_options,
                };
                let converter = Arc::clone(&self.converter);
                let permits = Arc::clone(&self.permits);
                let limit = self.config.item_timeout;
                workers.spawn(async move {
                    let outcome = run_conversion(converter, permits, request, limit).await;
                    (id, outcome)
                });
            }

            let Some(joined) = workers.join_next().await else { break };
            match joined {
                Ok((id, outcome)) => {
                    pending.remove(&id);
                    self.finish_item(ledger, &id, outcome, &mut progress, destination, &mut report, &mut on_progress)
                        .await;
                }
                Err(e) => warn!("Worker task lost: {}", e),
            }
        }

        // items whose worker vanished still have to end up terminal
        for id in pending {
            let outcome = Err("Worker task was lost".to_string());
            self.finish_item(ledger, &id, outcome, &mut progress, destination, &mut report, &mut on_progress)
                .await;
        }

        on_progress(&ProgressEvent::new(ProgressType::Complete, progress));
        self.progress.send_modify(BatchProgress::reset);
        report.log_summary();
        Ok(report)
    }

    /// Applies one terminal outcome, then auto-saves when the policy asks for it.
    #[allow(clippy::too_many_arguments)]
    async fn finish_item<F>(
        &self,
        ledger: &Mutex<ResultLedger>,
        id: &str,
        outcome: ItemOutcome,
        progress: &mut BatchProgress,
        destination: &DestinationSettings,
        report: &mut BatchReport,
        on_progress: &mut F,
    ) where
        F: FnMut(&ProgressEvent) + Send,
    {
        progress.current += 1;

        let auto_save = destination.destination_type != DestinationType::Same;
        let (event, to_save) = {
            let mut ledger = ledger.lock().await;
            let update = match outcome {
                Ok(data) => match ledger.get(id).and_then(|record| keep_original(record, &data)) {
                    Some(update) => update,
                    None => ProcessedImageUpdate::completed(data),
                },
                Err(error) => ProcessedImageUpdate::failed(error),
            };
            ledger.update(id, update);
            // count and record change together
            self.progress.send_replace(*progress);
            match ledger.get(id) {
                Some(record) => {
                    report.record(record);
                    let to_save = (auto_save && record.status == ImageStatus::Completed).then(|| {
                        (record.file_name.clone(), record.format, record.processed_data.clone())
                    });
                    (ProgressEvent::for_record(ProgressType::Progress, *progress, record), to_save)
                }
                None => {
                    // removed from the ledger mid-batch
                    debug!("Record {} no longer in ledger", id);
                    (ProgressEvent::new(ProgressType::Progress, *progress), None)
                }
            }
        };

        if event.status == Some(ImageStatus::Error) {
            warn!("{}", event.message());
        } else {
            debug!("{}", event.message());
        }
        on_progress(&event);

        let Some((file_name, format, data)) = to_save else { return };
        let saved = async {
            let path = resolve_destination(
                destination.destination_type,
                &file_name,
                format,
                &destination.custom_destination_path,
                self.host.downloads_dir().as_deref(),
            )?
            .into_path(None)
            .ok_or_else(|| ConverterError::destination("No output folder"))?;
            self.write_output(path.clone(), data).await?;
            Ok::<_, ConverterError>(path)
        }
        .await;

        match saved {
            Ok(path) => {
                ledger.lock().await.update(id, ProcessedImageUpdate::saved(path.clone()));
                report.saved.push(path);
            }
            Err(e) => {
                warn!("Failed to save {}: {}", file_name, e);
                report.save_failures.push(SaveFailure {
                    record_id: id.to_string(),
                    file_name,
                    path: None,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Writes a completed record's output.
    ///
    /// `dir_override` wins over the destination policy; for the `same` policy
    /// the record's source folder is used.
    pub async fn save_processed(
        &self,
        ledger: &Mutex<ResultLedger>,
        id: &str,
        destination: &DestinationSettings,
        dir_override: Option<&Path>,
    ) -> ConverterResult<PathBuf> {
        let (file_name, format, source_dir, data) = {
            let ledger = ledger.lock().await;
            let record = ledger
                .get(id)
                .ok_or_else(|| ConverterError::not_found(format!("No processed image with id {}", id)))?;
            if record.status != ImageStatus::Completed {
                return Err(ConverterError::processing(format!(
                    "{} has no converted output to save",
                    record.file_name
                )));
            }
            (
                record.file_name.clone(),
                record.format,
                record.source_dir.clone(),
                record.processed_data.clone(),
            )
        };

        let path = match dir_override {
            Some(dir) => dir.join(update_file_extension(&file_name, format.as_str())),
            None => resolve_destination(
                destination.destination_type,
                &file_name,
                format,
                &destination.custom_destination_path,
                self.host.downloads_dir().as_deref(),
            )?
            .into_path(source_dir.as_deref())
            .ok_or_else(|| {
                ConverterError::destination(format!("Source folder of {} is unknown", file_name))
            })?,
        };

        self.write_output(path.clone(), data).await?;
        ledger.lock().await.update(id, ProcessedImageUpdate::saved(path.clone()));
        info!("Saved {} to {}", file_name, path.display());
        Ok(path)
    }

    async fn write_output(&self, path: PathBuf, data: Vec<u8>) -> ConverterResult<()> {
        let host = Arc::clone(&self.host);
        tokio::task::spawn_blocking(move || host.write_file(&path, &data))
            .await
            .map_err(|e| ConverterError::io(format!("Write task failed: {}", e)))?
    }
}

/// The input bytes as the result when the conversion made the file bigger.
fn keep_original(record: &ProcessedImage, output: &[u8]) -> Option<ProcessedImageUpdate> {
    if !record.options.keep_original_if_larger || output.len() as u64 <= record.original_size {
        return None;
    }
    let format = ImageFormat::from_content_type(&record.content_type)?;
    info!(
        "Converted {} is larger ({} > {} bytes); keeping the original",
        record.file_name,
        output.len(),
        record.original_size
    );
    Some(ProcessedImageUpdate::kept_original(record.original_data.clone(), format))
}

/// Runs the converter on the blocking pool, turning panics and timeouts into errors.
///
/// The timeout only abandons the wait: the blocking call runs to the end and
/// keeps its permit until then.
async fn run_conversion(
    converter: Arc<dyn ImageConverter>,
    permits: Arc<Semaphore>,
    request: ConvertRequest,
    limit: Option<Duration>,
) -> ItemOutcome {
    let file_name = request.file_name.clone();
    let permit = permits
        .acquire_owned()
        .await
        .map_err(|e| format!("Conversion slots closed: {}", e))?;
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        converter.convert(&request)
    });

    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => return Err(format!("Timed out after {:?}", limit)),
        },
        None => handle.await,
    };

    match joined {
        Ok(response) => response.into_output(),
        Err(e) if e.is_panic() => Err(format!("Converter panicked while processing {}", file_name)),
        Err(e) => Err(format!("Conversion task failed: {}", e)),
    }
}
