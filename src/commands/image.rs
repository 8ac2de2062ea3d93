//! `convert` command handler.

use std::path::{Path, PathBuf};
use anyhow::{Context, bail};
use clap::Args;
use tracing::{debug, info, warn};
use crate::core::{AppState, DestinationType, ImageStatus, ImageTask, ProgressEvent, ProgressType};
use crate::processing::BatchReport;
use crate::utils::format_size;
use super::options::{DestinationArgs, OptionArgs};

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Files or folders to convert
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Start from a saved preset (id or name) instead of the current options
    #[arg(short, long)]
    pub preset: Option<String>,

    #[command(flatten)]
    pub options: OptionArgs,

    #[command(flatten)]
    pub destination: DestinationArgs,

    /// Remember the effective options and destination as the new defaults
    #[arg(long)]
    pub save_settings: bool,
}

/// Converts every input with one set of options.
///
/// Fails when any image fails, after all of them have been attempted.
pub async fn convert(state: &AppState, args: ConvertArgs) -> anyhow::Result<BatchReport> {
    let base = match &args.preset {
        Some(key) => state
            .find_preset(key)
            .await
            .map(|preset| preset.options)
            .with_context(|| format!("No preset named or with id '{}'", key))?,
        None => state.options().await,
    };
    let options = args.options.apply_to(base);
    let destination = args.destination.apply_to(state.destination().await);

    let tasks = collect_tasks(&args.inputs).await?;
    if tasks.is_empty() {
        bail!("No input files found");
    }
    debug!("Collected {} input files", tasks.len());

    let mut report = state
        .process_batch_with(tasks, &options, &destination, print_event)
        .await?;

    // only settings that started a batch become the defaults
    if args.save_settings {
        state.set_options(options.clone()).await?;
        state.set_destination(destination.clone()).await?;
        info!("Saved {} as the default options", options.summary());
    }

    // the batch only auto-saves to folders; "same" writes beside each source here
    if destination.destination_type == DestinationType::Same {
        for id in &report.record_ids {
            let Some(record) = state.record(id).await else { continue };
            if record.status != ImageStatus::Completed {
                continue;
            }
            match state.save_processed(id, record.source_dir.as_deref()).await {
                Ok(path) => report.saved.push(path),
                Err(e) => warn!("Failed to save {}: {}", record.file_name, e),
            }
        }
    }

    print_report(&report);

    if report.failed > 0 {
        bail!("{} of {} images failed", report.failed, report.total());
    }
    Ok(report)
}

/// Expands folders (one level) and reads every file into a task
async fn collect_tasks(inputs: &[PathBuf]) -> anyhow::Result<Vec<ImageTask>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(list_files(input).await?);
        } else {
            paths.push(input.clone());
        }
    }

    let mut tasks = Vec::with_capacity(paths.len());
    for path in paths {
        tasks.push(ImageTask::from_path(&path).await?);
    }
    Ok(tasks)
}

async fn list_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Cannot read folder {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn print_event(event: &ProgressEvent) {
    if event.progress_type == ProgressType::Progress {
        println!("{}", event.message());
    }
}

fn print_report(report: &BatchReport) {
    for skipped in &report.skipped {
        println!("Skipped {} ({})", skipped.file_name, skipped.reason);
    }
    for failure in &report.save_failures {
        println!("Not saved: {} ({})", failure.file_name, failure.error);
    }
    for path in &report.saved {
        println!("Saved {}", path.display());
    }
    if report.kept_original > 0 {
        println!("{} kept as the original (conversion was larger)", report.kept_original);
    }
    println!(
        "{} converted, {} failed: {} → {} ({:.1}% smaller)",
        report.completed,
        report.failed,
        format_size(report.original_bytes),
        format_size(report.processed_bytes),
        report.compression_ratio()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::presets::MemoryStore;
    use crate::processing::BatchConfig;
    use crate::processing::converter::tests::MockConverter;
    use crate::utils::{ImageFormat, LocalFileHost};

    fn state(downloads: &Path, converter: MockConverter) -> AppState {
        AppState::new(
            Arc::new(converter),
            Arc::new(LocalFileHost::with_downloads_dir(downloads)),
            Arc::new(MemoryStore::new()),
            BatchConfig::default(),
        )
        .unwrap()
    }

    fn args(inputs: Vec<PathBuf>) -> ConvertArgs {
        ConvertArgs {
            inputs,
            preset: None,
            options: OptionArgs::default(),
            destination: DestinationArgs::default(),
            save_settings: false,
        }
    }

    #[tokio::test]
    async fn folder_input_converts_images_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("cat.png"), vec![0u8; 400]).unwrap();
        std::fs::write(src.join("notes.txt"), b"hi").unwrap();
        let out = tmp.path().join("out");

        let state = state(tmp.path(), MockConverter::shrinking());
        let mut args = args(vec![src]);
        args.options.format = Some(ImageFormat::Webp.into());
        args.destination.output = Some(out.clone());

        let report = convert(&state, args).await.unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(out.join("cat.webp").exists());
        // one-off overrides are not persisted
        assert_eq!(state.options().await.format, ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn same_destination_writes_beside_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("photo.jpg");
        std::fs::write(&input, vec![0u8; 100]).unwrap();

        let state = state(tmp.path(), MockConverter::shrinking());
        let mut args = args(vec![input]);
        args.options.format = Some(ImageFormat::Png.into());
        args.destination.destination = Some(DestinationType::Same);
        args.save_settings = true;

        let report = convert(&state, args).await.unwrap();

        assert_eq!(report.saved, vec![tmp.path().join("photo.png")]);
        assert_eq!(state.options().await.format, ImageFormat::Png);
        assert_eq!(state.destination().await.destination_type, DestinationType::Same);
    }

    #[tokio::test]
    async fn settings_are_not_saved_when_nothing_runs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = state(tmp.path(), MockConverter::shrinking());

        let mut missing = args(vec![tmp.path().join("missing.png")]);
        missing.options.format = Some(ImageFormat::Webp.into());
        missing.save_settings = true;
        assert!(convert(&state, missing).await.is_err());

        let mut invalid = args(vec![tmp.path().to_path_buf()]);
        std::fs::write(tmp.path().join("cat.png"), vec![0u8; 40]).unwrap();
        invalid.options.quality = Some(0);
        invalid.save_settings = true;
        assert!(convert(&state, invalid).await.is_err());

        assert_eq!(state.options().await, crate::core::ImageProcessingOptions::default());
        assert_eq!(state.destination().await, crate::core::DestinationSettings::default());
    }

    #[tokio::test]
    async fn failures_fail_the_command() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("broken.png");
        std::fs::write(&input, vec![0u8; 10]).unwrap();

        let state = state(tmp.path(), MockConverter::shrinking().failing_on("broken.png"));
        let err = convert(&state, args(vec![input])).await.unwrap_err();

        assert!(err.to_string().contains("1 of 1 images failed"));
        assert_eq!(state.records().await[0].status, ImageStatus::Error);
    }

    #[tokio::test]
    async fn unknown_preset_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = state(tmp.path(), MockConverter::shrinking());
        let mut args = args(vec![tmp.path().join("x.png")]);
        args.preset = Some("Nope".into());

        let err = convert(&state, args).await.unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }
}
