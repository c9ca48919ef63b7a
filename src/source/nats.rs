//! Live message feed over NATS JetStream.
//!
//! Connectors publish [`ChatMessageEnvelope`]s onto a JetStream stream; this
//! adapter consumes them through a durable pull consumer and acks each message
//! only after it has been handed to the pipeline. A crash between hand-off and
//! ack redelivers the message. Delivery is at-least-once; the store's
//! duplicate rejection makes that safe.

use super::should_stop;
use crate::config::SourceConfig;
use crate::model::FatMessage;
use async_nats::jetstream::{self, consumer};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

const SUBJECT_PREFIX: &str = "chat.messages";
const CONSUMER_NAME: &str = "chatstats-ingest";

/// Wire envelope around one resolved chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageEnvelope {
    /// Unique message ID for tracking.
    pub message_id: Uuid,

    /// Timestamp when the connector received the message.
    pub received_at: DateTime<Utc>,

    /// Redelivery count, maintained by the connector.
    #[serde(default)]
    pub retry_count: u32,

    pub message: FatMessage,
}

impl ChatMessageEnvelope {
    pub fn new(message: FatMessage) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            received_at: Utc::now(),
            retry_count: 0,
            message,
        }
    }
}

pub async fn run(
    config: SourceConfig,
    tx: mpsc::Sender<FatMessage>,
    stop: watch::Receiver<bool>,
) {
    let url = config
        .nats_url
        .clone()
        .unwrap_or_else(|| "nats://localhost:4222".to_string());

    if let Err(e) = consume(&url, &config.stream_name, tx, stop).await {
        tracing::error!(url, error = %e, "nats source failed");
    }
}

async fn consume(
    url: &str,
    stream_name: &str,
    tx: mpsc::Sender<FatMessage>,
    mut stop: watch::Receiver<bool>,
) -> Result<(), async_nats::Error> {
    let client = async_nats::connect(url).await?;
    tracing::info!(url, "connected to NATS");

    let jetstream = jetstream::new(client);
    let stream = jetstream
        .get_or_create_stream(jetstream::stream::Config {
            name: stream_name.to_string(),
            subjects: vec![format!("{}.>", SUBJECT_PREFIX)],
            max_age: Duration::from_secs(24 * 60 * 60),
            storage: jetstream::stream::StorageType::File,
            num_replicas: 1,
            ..Default::default()
        })
        .await?;
    tracing::info!(stream_name, "JetStream stream ready");

    let consumer = stream
        .get_or_create_consumer(
            CONSUMER_NAME,
            consumer::pull::Config {
                durable_name: Some(CONSUMER_NAME.to_string()),
                ..Default::default()
            },
        )
        .await?;

    let mut messages = consumer.messages().await?;

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || should_stop(&stop) {
                    tracing::info!("nats source stopping");
                    return Ok(());
                }
            }
            next = messages.next() => {
                let message = match next {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "consumer stream error");
                        continue;
                    }
                    None => {
                        tracing::info!("consumer stream closed");
                        return Ok(());
                    }
                };

                match serde_json::from_slice::<ChatMessageEnvelope>(&message.payload) {
                    Ok(envelope) => {
                        if tx.send(envelope.message).await.is_err() {
                            // Pipeline gone; leave the message unacked for the
                            // next consumer instance.
                            tracing::info!("pipeline closed; nats source stopping");
                            return Ok(());
                        }
                        if let Err(e) = message.ack().await {
                            tracing::warn!(error = %e, "ack failed; message may be redelivered");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed envelope dropped");
                        if let Err(e) = message.ack().await {
                            tracing::warn!(error = %e, "ack failed for malformed envelope");
                        }
                    }
                }
            }
        }
    }
}

/// Publishing side of the feed, used by connectors and the CLI `publish`
/// command to enqueue messages durably.
#[derive(Clone)]
pub struct NatsPublisher {
    jetstream: jetstream::Context,
}

impl NatsPublisher {
    /// Connect and ensure the stream exists.
    pub async fn connect(url: &str, stream_name: &str) -> Result<Self, async_nats::Error> {
        let client = async_nats::connect(url).await?;
        let jetstream = jetstream::new(client);

        jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: stream_name.to_string(),
                subjects: vec![format!("{}.>", SUBJECT_PREFIX)],
                max_age: Duration::from_secs(24 * 60 * 60),
                storage: jetstream::stream::StorageType::File,
                num_replicas: 1,
                ..Default::default()
            })
            .await?;

        Ok(Self { jetstream })
    }

    /// Publish one envelope and wait for the JetStream acknowledgment.
    pub async fn publish(&self, envelope: &ChatMessageEnvelope) -> Result<(), async_nats::Error> {
        let subject = format!("{}.ingest", SUBJECT_PREFIX);
        let payload = serde_json::to_vec(envelope)?;

        let ack = self.jetstream.publish(subject, payload.into()).await?;
        ack.await?;

        tracing::debug!(message_id = %envelope.message_id, "message published to JetStream");
        Ok(())
    }
}
