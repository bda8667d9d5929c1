//! Publisher abstraction.
//!
//! The engine hands each committed action to an [`ActionPublisher`]. Delivery
//! is fire-and-forget: the engine logs and counts failures but never retries.

use crate::action::Action;
use crate::channel::ChannelId;
use crate::error::SyncResult;
use async_trait::async_trait;
use serde_json::Value;

/// Delivers actions to subscribers of a channel.
#[async_trait]
pub trait ActionPublisher: Send + Sync {
    /// Publishes `action` on `channel`. `render_context` is the context carried
    /// by the unit of work, for the fragment renderer behind the transport.
    async fn publish(
        &self,
        channel: &ChannelId,
        action: &Action,
        render_context: Option<&Value>,
    ) -> SyncResult<()>;
}

/// Outcome of flushing one unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

impl PublishReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// A recording publisher for testing.
pub mod mock {
    use super::*;
    use crate::action::ActionKind;
    use crate::error::SyncError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// A delivery captured by [`RecordingPublisher`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct Delivery {
        pub channel: ChannelId,
        pub action: Action,
        pub render_context: Option<Value>,
    }

    impl Delivery {
        pub fn kind(&self) -> ActionKind {
            self.action.kind
        }
    }

    /// Records every publish call; optionally fails on chosen channels.
    #[derive(Debug, Default)]
    pub struct RecordingPublisher {
        deliveries: Mutex<Vec<Delivery>>,
        failing: Mutex<HashSet<ChannelId>>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every publish on `channel` fail (after recording the attempt).
        pub fn fail_on(&self, channel: ChannelId) {
            self.failing.lock().unwrap().insert(channel);
        }

        /// Everything published so far, in order.
        pub fn deliveries(&self) -> Vec<Delivery> {
            self.deliveries.lock().unwrap().clone()
        }

        /// Channels published to, in order.
        pub fn channels(&self) -> Vec<ChannelId> {
            self.deliveries
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.channel.clone())
                .collect()
        }

        pub fn len(&self) -> usize {
            self.deliveries.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl ActionPublisher for RecordingPublisher {
        async fn publish(
            &self,
            channel: &ChannelId,
            action: &Action,
            render_context: Option<&Value>,
        ) -> SyncResult<()> {
            self.deliveries.lock().unwrap().push(Delivery {
                channel: channel.clone(),
                action: action.clone(),
                render_context: render_context.cloned(),
            });
            if self.failing.lock().unwrap().contains(channel) {
                return Err(SyncError::Transport(format!("delivery to {channel} refused")));
            }
            Ok(())
        }
    }
}
