//! Source adapters: external collaborators that feed the pipeline.
//!
//! Push (live NATS feed) and pull (JSONL backfill, local fixtures) sources
//! are uniform from the pipeline's point of view: each one is a task that
//! sends [`FatMessage`](crate::model::FatMessage)s into the inbound channel
//! until it is exhausted or told to stop.

pub mod jsonl;
pub mod local;
pub mod nats;

pub use nats::{ChatMessageEnvelope, NatsPublisher};

use crate::config::{SourceConfig, SourceKind};
use crate::model::FatMessage;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Spawn the source adapter selected by the configuration.
///
/// The returned task finishes when the source is exhausted, the stop signal
/// fires, or the pipeline's inbound channel closes. Adapter errors are logged,
/// not propagated; a dead source simply stops feeding the pipeline.
pub fn spawn_source(
    config: SourceConfig,
    tx: mpsc::Sender<FatMessage>,
    stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    match config.kind {
        SourceKind::LocalTest => tokio::spawn(local::run(config, tx, stop)),
        SourceKind::Jsonl => tokio::spawn(jsonl::run(config, tx, stop)),
        SourceKind::Nats => tokio::spawn(nats::run(config, tx, stop)),
    }
}

/// True when the stop signal has fired.
pub(crate) fn should_stop(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow()
}
