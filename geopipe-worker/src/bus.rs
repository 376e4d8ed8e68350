//! Zenoh-backed message bus: the same session/`put` shape the webcam-mode
//! agent uses, generalized into a subscribe/publish pair keyed off
//! configured topics instead of one hardcoded key. Left as free functions
//! over a borrowed `Session` (rather than a struct owning a `Subscriber`)
//! so the session and its subscriber share one obvious lifetime in `main`.

use anyhow::{Context, Result};
use flume::Receiver;
use geopipe_core::types::Task;
use zenoh::sample::Sample;
use zenoh::subscriber::Subscriber;
use zenoh::Session;

pub async fn subscribe<'s>(session: &'s Session, topic: &str) -> Result<Subscriber<'s, Receiver<Sample>>> {
    session
        .declare_subscriber(topic.to_string())
        .await
        .context("failed to declare zenoh subscriber")
}

/// Blocks until the next well-formed task arrives, logging and skipping
/// anything that doesn't deserialize as a `Task`.
pub async fn next_task(subscriber: &Subscriber<'_, Receiver<Sample>>) -> Option<Task> {
    loop {
        let sample = subscriber.recv_async().await.ok()?;
        let bytes = sample.payload().to_bytes();
        match serde_json::from_slice::<Task>(&bytes) {
            Ok(task) => return Some(task),
            Err(err) => {
                tracing::error!(error = %err, "dropping malformed task message");
                continue;
            }
        }
    }
}

pub async fn publish(session: &Session, topic: &str, result: &geopipe_core::OutboundResult) -> Result<()> {
    let payload = serde_json::to_vec(result).context("failed to serialize outbound result")?;
    session.put(topic, payload).await.context("failed to publish result")
}
