//! Example fetching the URLs given on the command line with live progress bars.
//!
//! ```text
//! RUST_LOG=fetchq=debug cargo run --example fetch -- https://example.com/a.mp4 https://example.com/b.zip
//! ```

use color_eyre::{eyre::eyre, Result};
use comfy_table::Table;
use fetchq::download::TaskStatus;
use fetchq::settings::JsonFileStore;
use fetchq::DownloaderBuilder;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

const TEMPLATE_PIP: &str =
    "{bar:40.green/black} {bytes:>11.green}/{total_bytes:<11.green} {bytes_per_sec:>13.red} {msg}";
const CHARS_LINE: &str = "━╾╴─";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        return Err(eyre!("usage: fetch <url>..."));
    }

    let downloader = DownloaderBuilder::new()
        .settings_store(JsonFileStore::default())
        .build()?;

    let queued = downloader.bulk_enqueue(&urls).await?;
    println!("Queued {} of {} URLs", queued.count, urls.len());

    // Draw one bar per task from the status stream.
    let style = ProgressStyle::with_template(TEMPLATE_PIP)?.progress_chars(CHARS_LINE);
    let multi = MultiProgress::new();
    let mut bars: HashMap<String, ProgressBar> = HashMap::new();
    let mut status = downloader.subscribe_status();

    while let Some(snapshot) = status.next().await {
        for (id, task) in &snapshot {
            let bar = bars.entry(id.clone()).or_insert_with(|| {
                let bar = multi.add(ProgressBar::new(0));
                bar.set_style(style.clone());
                bar
            });
            if let Some(total) = task.total() {
                bar.set_length(total);
            }
            bar.set_position(task.downloaded_bytes);
            bar.set_message(task.status.to_string());
            if task.status.is_terminal() && !bar.is_finished() {
                bar.finish();
            }
        }

        if snapshot.values().all(|task| task.status.is_terminal()) {
            break;
        }
    }

    let mut table = Table::new();
    table.set_header(vec!["URL", "Status", "File", "Size", "Retries", "Error"]);
    for id in &queued.task_ids {
        let Some(task) = downloader.task(id) else {
            continue;
        };
        table.add_row(vec![
            task.url.clone(),
            task.status.to_string(),
            task.filename
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            task.downloaded_bytes.to_string(),
            task.retry_count.to_string(),
            task.error.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");

    let failed = queued
        .task_ids
        .iter()
        .filter_map(|id| downloader.task(id))
        .filter(|task| task.status == TaskStatus::Error)
        .count();
    let folder = downloader.settings().download_folder.clone();
    let size = downloader.inspect_directory_size(&folder).await;
    println!("{} bytes in {}", size, folder.display());

    downloader.shutdown().await;
    if failed > 0 {
        return Err(eyre!("{} downloads failed", failed));
    }
    Ok(())
}
