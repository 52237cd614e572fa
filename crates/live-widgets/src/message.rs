//! Publish/subscribe messaging between widget instances.
//!
//! Channels are created lazily on first subscription and hold a table of
//! subscriber-id to callback. Delivery itself lives on
//! [`Runtime::send_message`](crate::runtime::Runtime::send_message), which
//! owns the reentrancy guard; this module only manages the tables.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
};

use crate::{error::Result, runtime::Runtime, value::Value};

/// Maximum reentrant delivery depth. A subscriber that echoes messages back
/// onto its own channel degrades into dropped sends instead of unbounded
/// recursion.
pub const MAX_DELIVERY_DEPTH: usize = 16;

/// Identifier for a channel subscription. Allocated monotonically by the bus,
/// so fresh ids never collide for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Construct an explicit subscriber id.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The payload delivered to every subscriber of a channel: the message itself
/// plus an optional channel discriminator receivers filter on.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Message payload.
    pub message: Value,
    /// Discriminator receivers use to self-filter; distinct from the bus
    /// channel the envelope is broadcast on.
    pub channel: Option<String>,
}

impl Envelope {
    /// Construct an envelope.
    pub fn new(message: impl Into<Value>, channel: Option<&str>) -> Self {
        Self {
            message: message.into(),
            channel: channel.map(str::to_string),
        }
    }
}

/// A subscriber callback. Invoked with exclusive access to the runtime so it
/// can reach its instance; errors are isolated per subscriber by the caller.
pub type BusCallback = Rc<dyn Fn(&mut Runtime, &Envelope) -> Result<()>>;

/// Channel tables for the bus: channel name to subscriber-id to callback.
#[derive(Default)]
pub struct MessageBus {
    /// Per-channel subscriber tables, in subscriber-id order.
    channels: HashMap<String, BTreeMap<SubscriberId, BusCallback>>,
    /// Next subscriber id to allocate.
    next_id: u64,
}

impl MessageBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert of a callback under an explicit subscriber id,
    /// creating the channel on first use. Re-registering an id replaces the
    /// prior callback.
    pub fn register_listener(
        &mut self,
        channel: impl Into<String>,
        id: SubscriberId,
        callback: BusCallback,
    ) {
        // Keep allocation ahead of explicit ids so they can never collide.
        self.next_id = self.next_id.max(id.0 + 1);
        self.channels
            .entry(channel.into())
            .or_default()
            .insert(id, callback);
    }

    /// Subscribe under a freshly allocated id.
    pub fn subscribe(&mut self, channel: impl Into<String>, callback: BusCallback) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.register_listener(channel, id, callback);
        id
    }

    /// Drop a subscription. Returns true if it existed.
    pub fn unsubscribe(&mut self, channel: &str, id: SubscriberId) -> bool {
        self.channels
            .get_mut(channel)
            .is_some_and(|subs| subs.remove(&id).is_some())
    }

    /// Snapshot the subscribers of a channel in id order. Delivery iterates
    /// the snapshot so callbacks may freely mutate the tables mid-send.
    pub fn subscribers(&self, channel: &str) -> Vec<(SubscriberId, BusCallback)> {
        self.channels
            .get(channel)
            .map(|subs| subs.iter().map(|(id, cb)| (*id, Rc::clone(cb))).collect())
            .unwrap_or_default()
    }

    /// Number of subscribers on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, BTreeMap::len)
    }

    /// Iterate over channel names and their subscriber counts.
    pub fn channels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v.len()))
    }
}
