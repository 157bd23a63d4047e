// ChatAdapter over the WebSocket hub's channels.

use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use fifadraft_core::chat::{Announcement, ChatAdapter, Channel, ChoiceReply};
use fifadraft_core::config::TimeoutConfig;
use fifadraft_core::draft::pick::PlayerRecord;

use crate::hub::{InboundMessage, OutboundFrame};
use crate::render;

/// Reads chat from the hub's inbound queue and posts rendered text to every
/// client. Each wait is bounded by the configured timeouts.
pub struct HubChat {
    inbound: mpsc::Receiver<InboundMessage>,
    outbound: broadcast::Sender<OutboundFrame>,
    timeouts: TimeoutConfig,
    prefix: String,
}

impl HubChat {
    pub fn new(
        inbound: mpsc::Receiver<InboundMessage>,
        outbound: broadcast::Sender<OutboundFrame>,
        timeouts: TimeoutConfig,
        prefix: impl Into<String>,
    ) -> Self {
        HubChat {
            inbound,
            outbound,
            timeouts,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next message from anyone, without a time limit. `None` once the hub
    /// has shut down.
    pub async fn next_message(&mut self) -> Option<InboundMessage> {
        self.inbound.recv().await
    }

    /// Post `text` to `channel`. Frames posted while nobody is connected are
    /// dropped.
    pub fn post(&self, channel: Channel, text: String) {
        let frame = OutboundFrame {
            channel: channel.as_str().to_string(),
            text,
        };
        if self.outbound.send(frame).is_err() {
            debug!("no clients connected, dropped {} frame", channel.as_str());
        }
    }

    async fn recv(&mut self) -> anyhow::Result<InboundMessage> {
        self.inbound
            .recv()
            .await
            .ok_or_else(|| anyhow!("chat hub closed"))
    }

    /// Wait up to `limit` for the first message `accept` maps to `Some`.
    async fn wait_for<T, F>(&mut self, limit: Duration, mut accept: F) -> anyhow::Result<Option<T>>
    where
        F: FnMut(InboundMessage) -> Option<T> + Send,
    {
        let waiting = async {
            loop {
                let msg = self.recv().await?;
                if let Some(value) = accept(msg) {
                    return Ok::<T, anyhow::Error>(value);
                }
            }
        };
        bounded(limit, waiting).await
    }
}

/// `Ok(None)` when `limit` expires first.
async fn bounded<T, Fut>(limit: Duration, fut: Fut) -> anyhow::Result<Option<T>>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map(Some),
        Err(_) => Ok(None),
    }
}

/// Digits only, after trimming.
fn parse_digits(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[async_trait]
impl ChatAdapter for HubChat {
    async fn prompt_number(&mut self, asker: &str) -> anyhow::Result<Option<u32>> {
        let limit = self.timeouts.player_count();
        let asker = asker.to_string();
        self.wait_for(limit, move |msg| {
            if msg.user != asker {
                return None;
            }
            parse_digits(&msg.text).and_then(|n| u32::try_from(n).ok())
        })
        .await
    }

    async fn collect_distinct_senders(&mut self, n: usize) -> anyhow::Result<Option<Vec<String>>> {
        let limit = self.timeouts.join();
        // `n` comes from chat input, so grow as people join.
        let mut senders: Vec<String> = Vec::new();
        while senders.len() < n {
            let next = self
                .wait_for(limit, |msg| {
                    if senders.contains(&msg.user) {
                        None
                    } else {
                        Some(msg.user)
                    }
                })
                .await?;
            let Some(user) = next else {
                info!("join timed out with {} of {n} players", senders.len());
                return Ok(None);
            };
            debug!("{user} joined");
            senders.push(user);
        }
        Ok(Some(senders))
    }

    async fn present_choices(
        &mut self,
        participant: &str,
        choices: &[PlayerRecord],
    ) -> anyhow::Result<ChoiceReply> {
        self.post(Channel::Draft, render::choice_prompt(participant, choices));

        let limit = self.timeouts.pick();
        let participant = participant.to_string();
        let reply = self
            .wait_for(limit, move |msg| (msg.user == participant).then_some(msg.text))
            .await?;

        Ok(match reply {
            None => ChoiceReply::TimedOut,
            Some(text) => match parse_digits(&text).and_then(|n| usize::try_from(n).ok()) {
                Some(index) => ChoiceReply::Selected(index),
                None => ChoiceReply::Invalid(text),
            },
        })
    }

    async fn announce(&mut self, announcement: Announcement) -> anyhow::Result<()> {
        let text = render::announcement(&announcement, &self.prefix);
        self.post(announcement.channel(), text);
        Ok(())
    }
}
