//! In-process subscription hub.
//!
//! An [`ActionPublisher`] that fans actions out to local subscribers over
//! `tokio::sync::broadcast` channels, one per [`ChannelId`]. Subscribers bind
//! scopes through the shared registry, so their channel identities match the
//! ones the engine derives from records.

use crate::action::{Action, ActionMessage};
use crate::channel::ChannelId;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::registry::ScopeRegistry;
use crate::scope::ScopeArg;
use crate::transport::ActionPublisher;
use async_trait::async_trait;
use livescope_model::Entity;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A live subscription to one channel.
#[derive(Debug)]
pub struct Subscription {
    channel: ChannelId,
    receiver: broadcast::Receiver<ActionMessage>,
}

impl Subscription {
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Waits for the next message. Messages lost to lag are skipped with a warning.
    pub async fn recv(&mut self) -> SyncResult<ActionMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Ok(message),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Subscriber on {} lagged, skipped {n} messages", self.channel);
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SyncError::ChannelClosed),
            }
        }
    }

    /// Returns the next message if one is already waiting.
    pub fn try_recv(&mut self) -> Option<ActionMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Subscriber on {} lagged, skipped {n} messages", self.channel);
                }
                Err(_) => return None,
            }
        }
    }
}

/// Local pub/sub keyed by channel identity.
pub struct SubscriptionHub {
    registry: Arc<ScopeRegistry>,
    capacity: usize,
    channels: Mutex<HashMap<ChannelId, broadcast::Sender<ActionMessage>>>,
}

impl SubscriptionHub {
    pub fn new(registry: Arc<ScopeRegistry>, config: &SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            capacity: config.channel_capacity,
            channels: Mutex::new(HashMap::new()),
        })
    }

    /// Subscribes to a raw channel. Channels whose subscribers have all
    /// gone are dropped first.
    pub fn subscribe(&self, channel: ChannelId) -> SyncResult<Subscription> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| SyncError::Transport("hub lock poisoned".into()))?;
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        if channels.len() < before {
            debug!("Pruned {} idle channels", before - channels.len());
        }
        let receiver = channels
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        debug!("Subscribed to {channel}");
        Ok(Subscription { channel, receiver })
    }

    /// Subscribes to scope `name` of `entity_type` bound to `args`.
    pub fn subscribe_scope(
        &self,
        entity_type: &str,
        name: &str,
        args: Vec<ScopeArg>,
    ) -> SyncResult<Subscription> {
        let scope = self.registry.bind_scope(entity_type, name, args)?;
        self.subscribe(scope.channel_id().clone())
    }

    /// Subscribes to a record's own channel.
    pub fn subscribe_record(&self, entity: &Entity) -> SyncResult<Subscription> {
        self.subscribe(ChannelId::record(entity))
    }

    /// Subscribes to new records of `entity_type` that have no parent.
    pub fn subscribe_collection(&self, entity_type: &str) -> SyncResult<Subscription> {
        self.subscribe(ChannelId::collection(entity_type))
    }

    /// Number of channels with a live sender.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of live receivers on `channel`.
    pub fn subscriber_count(&self, channel: &ChannelId) -> usize {
        self.channels
            .lock()
            .ok()
            .and_then(|channels| channels.get(channel).map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ActionPublisher for SubscriptionHub {
    async fn publish(
        &self,
        channel: &ChannelId,
        action: &Action,
        render_context: Option<&Value>,
    ) -> SyncResult<()> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| SyncError::Transport("hub lock poisoned".into()))?;
        let Some(sender) = channels.get(channel) else {
            return Ok(());
        };
        if sender.send(action.to_message(render_context)).is_err() {
            // Every receiver is gone.
            channels.remove(channel);
            debug!("Closed idle channel {channel}");
        }
        Ok(())
    }
}
