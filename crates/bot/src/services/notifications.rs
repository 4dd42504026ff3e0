//! Sending one message to many chats.
//!
//! Used for staff order notifications and customer broadcasts. Every
//! recipient is attempted on its own; a failure is logged and counted but
//! never stops delivery to the others.

use futures::StreamExt;
use futures::stream;

use hearty_house_core::UserId;

use crate::transport::{Reply, Transport};

/// Sends in flight at once. Telegram throttles bursts to many chats.
const CONCURRENCY: usize = 4;

/// Outcome of a fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub failed: usize,
}

/// Send `reply` to every recipient.
#[tracing::instrument(skip_all, fields(kind = kind))]
pub async fn fan_out<T, I>(transport: &T, recipients: I, reply: &Reply, kind: &'static str) -> FanOut
where
    T: Transport + ?Sized,
    I: IntoIterator<Item = UserId>,
{
    let results: Vec<bool> = stream::iter(recipients)
        .map(|chat| async move {
            match transport.send_message(chat, reply).await {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!(chat_id = %chat, error = %err, "Failed to deliver message");
                    false
                }
            }
        })
        .buffer_unordered(CONCURRENCY)
        .collect()
        .await;

    let delivered = results.iter().filter(|ok| **ok).count();
    let outcome = FanOut {
        delivered,
        failed: results.len() - delivered,
    };
    tracing::info!(
        delivered = outcome.delivered,
        failed = outcome.failed,
        "Fan-out finished"
    );
    outcome
}
