//! Ingestion pipeline: fan-out topology from one message source to the
//! extraction stages, the durable store, and the realtime aggregator.
//!
//! Every inbound message is broadcast across stage *types* and load-balanced
//! (round-robin) within each stage's worker pool. No ordering is guaranteed
//! across workers or stages. Delivery is at-least-once: a redelivered message
//! produces duplicate records, which the store's identity-tuple rejection
//! absorbs; the realtime view is allowed to double-count.
//!
//! Shutdown is a cascade of channel closures: when the source sender drops,
//! the dispatcher drains and exits, which closes the stage queues; workers
//! drain and exit, which closes the sink queue; the sink drains and exits.
//! In-flight work is never rolled back, only not-yet-dispatched messages are
//! dropped.

use crate::extraction::ExtractionStage;
use crate::error::StoreError;
use crate::mention::MentionRecord;
use crate::model::FatMessage;
use crate::realtime::RealtimeAggregator;
use crate::store::MentionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_PERSIST_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Worker count per extraction stage (clamped to at least 1).
    pub stage_parallelism: usize,
    /// Bound of every internal queue.
    pub queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_parallelism: 2,
            queue_depth: 256,
        }
    }
}

/// Handle to a running pipeline topology.
pub struct Pipeline {
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Spawn the topology: dispatcher, per-stage worker pools, and the
    /// store/realtime sink. The pipeline runs until `source_rx` closes.
    pub fn spawn(
        source_rx: mpsc::Receiver<FatMessage>,
        stages: Vec<Arc<dyn ExtractionStage>>,
        store: Arc<MentionStore>,
        realtime: Arc<RealtimeAggregator>,
        config: PipelineConfig,
    ) -> Self {
        let parallelism = config.stage_parallelism.max(1);
        let queue_depth = config.queue_depth.max(1);

        let (sink_tx, sink_rx) = mpsc::channel::<MentionRecord>(queue_depth);
        let mut handles = Vec::new();
        let mut stage_pools: Vec<Vec<mpsc::Sender<FatMessage>>> = Vec::new();

        for stage in stages {
            let mut pool = Vec::with_capacity(parallelism);
            for worker_id in 0..parallelism {
                let (tx, rx) = mpsc::channel::<FatMessage>(queue_depth);
                pool.push(tx);
                handles.push(tokio::spawn(stage_worker(
                    Arc::clone(&stage),
                    worker_id,
                    rx,
                    sink_tx.clone(),
                )));
            }
            stage_pools.push(pool);
        }
        // The workers hold the only remaining sink senders.
        drop(sink_tx);

        handles.push(tokio::spawn(dispatch(source_rx, stage_pools)));
        handles.push(tokio::spawn(sink(sink_rx, store, realtime)));

        Self { handles }
    }

    /// Wait for the topology to drain and every task to finish.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "pipeline task panicked");
            }
        }
    }
}

/// Broadcast each message across stage types; round-robin within each pool.
async fn dispatch(
    mut source_rx: mpsc::Receiver<FatMessage>,
    stage_pools: Vec<Vec<mpsc::Sender<FatMessage>>>,
) {
    let mut cursors = vec![0usize; stage_pools.len()];
    while let Some(message) = source_rx.recv().await {
        for (pool, cursor) in stage_pools.iter().zip(cursors.iter_mut()) {
            let index = *cursor % pool.len();
            *cursor = cursor.wrapping_add(1);
            if pool[index].send(message.clone()).await.is_err() {
                tracing::warn!("stage worker queue closed; message dropped for that stage");
            }
        }
    }
    tracing::debug!("source channel closed; dispatcher exiting");
}

async fn stage_worker(
    stage: Arc<dyn ExtractionStage>,
    worker_id: usize,
    mut rx: mpsc::Receiver<FatMessage>,
    sink_tx: mpsc::Sender<MentionRecord>,
) {
    while let Some(message) = rx.recv().await {
        match stage.extract(&message) {
            Ok(records) => {
                for record in records {
                    if sink_tx.send(record).await.is_err() {
                        tracing::debug!(stage = stage.name(), worker_id, "sink closed; worker exiting");
                        return;
                    }
                }
            }
            // Skips the message for this stage only; other stages still run.
            Err(e) => {
                tracing::warn!(stage = stage.name(), worker_id, error = %e, "message skipped")
            }
        }
    }
}

/// Multiplex extraction results into the durable store and the realtime view.
async fn sink(
    mut rx: mpsc::Receiver<MentionRecord>,
    store: Arc<MentionStore>,
    realtime: Arc<RealtimeAggregator>,
) {
    while let Some(record) = rx.recv().await {
        persist_with_retry(&store, &record).await;
        realtime.record(&record);
    }
    tracing::debug!("sink drained; pipeline write path closed");
}

/// Persist one record, retrying transient store faults with exponential
/// backoff. Duplicates are dropped quietly: that is the idempotency mechanism
/// that makes at-least-once redelivery safe.
async fn persist_with_retry(store: &Arc<MentionStore>, record: &MentionRecord) {
    let mut backoff = INITIAL_BACKOFF;
    for attempt in 1..=MAX_PERSIST_ATTEMPTS {
        let store = Arc::clone(store);
        let owned = record.clone();
        let result =
            tokio::task::spawn_blocking(move || store.persist_record(&owned)).await;

        match result {
            Ok(Ok(())) => return,
            Ok(Err(StoreError::Duplicate(detail))) => {
                tracing::debug!(detail, "duplicate record dropped (redelivery)");
                return;
            }
            Ok(Err(StoreError::Unavailable(detail))) => {
                tracing::warn!(attempt, detail, "store unavailable; backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Ok(Err(other)) => {
                tracing::error!(error = %other, "unexpected store error; record dropped");
                return;
            }
            Err(join_error) => {
                tracing::error!(error = %join_error, "persist task failed; record dropped");
                return;
            }
        }
    }
    tracing::error!(record = ?record, "record not persisted after retries");
}
