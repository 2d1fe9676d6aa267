//! Live input channels for locally spawned instances.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use corral_core::errors::BusError;
use corral_core::models::Message;
use corral_core::traits::ILiveChannel;

/// Registered push channels, keyed by instance id.
#[derive(Default)]
pub struct LiveChannels {
    channels: DashMap<String, Arc<dyn ILiveChannel>>,
}

impl LiveChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the channel for an instance.
    pub fn register(&self, instance_id: impl Into<String>, channel: Arc<dyn ILiveChannel>) {
        self.channels.insert(instance_id.into(), channel);
    }

    pub fn unregister(&self, instance_id: &str) -> bool {
        self.channels.remove(instance_id).is_some()
    }

    /// The open channel for an instance. Closed channels are dropped on sight.
    pub fn get(&self, instance_id: &str) -> Option<Arc<dyn ILiveChannel>> {
        let channel = self.channels.get(instance_id).map(|c| Arc::clone(c.value()))?;
        if channel.is_open() {
            Some(channel)
        } else {
            self.channels.remove(instance_id);
            None
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// [`ILiveChannel`] over an unbounded tokio mpsc sender.
pub struct MpscChannel {
    instance_id: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl MpscChannel {
    /// A channel for `instance_id` and the receiver its adapter reads from.
    pub fn pair(instance_id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                instance_id: instance_id.into(),
                tx,
            },
            rx,
        )
    }
}

impl ILiveChannel for MpscChannel {
    fn push(&self, message: &Message) -> Result<(), BusError> {
        self.tx
            .send(message.clone())
            .map_err(|_| BusError::ChannelClosed {
                instance_id: self.instance_id.clone(),
            })
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}
