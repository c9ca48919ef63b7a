//! Bounded backfill replay from a JSONL file.
//!
//! One `FatMessage` JSON object per line. Malformed lines are logged and
//! skipped; the replay is not transactional and relies on the store's
//! duplicate rejection when re-run over the same file.

use super::should_stop;
use crate::config::SourceConfig;
use crate::model::FatMessage;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

pub async fn run(
    config: SourceConfig,
    tx: mpsc::Sender<FatMessage>,
    stop: watch::Receiver<bool>,
) {
    let path = match config.path.as_deref() {
        Some(path) => path.to_string(),
        None => {
            tracing::error!("jsonl source requires source.path in the configuration");
            return;
        }
    };

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path, error = %e, "cannot open backfill file");
            return;
        }
    };

    let mut lines = BufReader::new(file).lines();
    let mut line_number = 0usize;
    let mut sent = 0usize;
    let mut skipped = 0usize;

    loop {
        if should_stop(&stop) {
            break;
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(path, error = %e, "read failure during backfill");
                break;
            }
        };
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<FatMessage>(&line) {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    tracing::info!(sent, "pipeline closed; backfill stopped");
                    return;
                }
                sent += 1;
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!(path, line_number, error = %e, "skipping malformed line");
            }
        }
    }

    tracing::info!(path, sent, skipped, "backfill replay finished");
}
