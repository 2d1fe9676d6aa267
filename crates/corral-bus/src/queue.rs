//! The pending-message set and its delivery rules.
//!
//! One `std::sync::Mutex` guards the whole set. Every drain holds it for
//! the full pass, which is what makes `@anyone` single-consumption: the
//! first reader to get the lock removes the message before anyone else
//! can see it.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use corral_core::models::{Address, AgentInstance, Message, MessageKind, Priority};

use crate::address;

struct Envelope {
    address: Address,
    message: Message,
}

/// What a reader does with one pending message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Delivered and removed for everyone.
    Consume,
    /// Delivered and marked read for this reader; stays pending.
    Read,
    Skip,
}

pub(crate) fn disposition(address: &Address, message: &Message, reader: &AgentInstance) -> Disposition {
    if message.read_by.contains(&reader.instance_id) {
        return Disposition::Skip;
    }
    if reader.mechanical && message.kind != MessageKind::Directive {
        return Disposition::Skip;
    }
    let in_scope = scope_matches(address.scope(), reader);
    match address {
        Address::Direct { agent, instance, .. }
            if in_scope
                && *agent == reader.agent_id
                && instance.as_ref().map_or(true, |i| *i == reader.instance_id) =>
        {
            Disposition::Consume
        }
        Address::Anyone { .. } if in_scope && !reader.mechanical => Disposition::Consume,
        Address::Everyone { .. } if in_scope => Disposition::Read,
        // Leaders observe scoped traffic without consuming it.
        _ if address.scope().is_some_and(|s| reader.leads(s)) => Disposition::Read,
        _ => Disposition::Skip,
    }
}

fn scope_matches(scope: Option<&str>, reader: &AgentInstance) -> bool {
    match scope {
        None => true,
        Some(scope) => reader.scope.as_deref() == Some(scope),
    }
}

/// Instance id in the sender's address, when it names one.
pub(crate) fn sender_instance(message: &Message) -> Option<String> {
    match address::parse(&message.from) {
        Ok(Address::Direct { instance, .. }) => instance,
        _ => None,
    }
}

/// Whether every live instance a broadcast targets has read it.
///
/// The sender is not a target. With no live target at all the broadcast is
/// kept until its TTL, so an instance that becomes active later still
/// receives it.
pub(crate) fn broadcast_complete(address: &Address, message: &Message, live: &[AgentInstance]) -> bool {
    let sender = sender_instance(message);
    let mut targets = live.iter().filter(|i| {
        scope_matches(address.scope(), i)
            && !(i.mechanical && message.kind != MessageKind::Directive)
            && sender.as_deref() != Some(i.instance_id.as_str())
    });
    let mut any = false;
    let all_read = targets.all(|i| {
        any = true;
        message.read_by.contains(&i.instance_id)
    });
    any && all_read
}

/// Result of one drain.
#[derive(Debug, Default)]
pub struct Drained {
    /// Urgent first, then oldest first.
    pub messages: Vec<Message>,
    /// Messages dropped for exceeding the TTL during this pass.
    pub expired: usize,
    /// Broadcasts dropped because every live target has now read them.
    pub completed: usize,
}

pub struct MessageBus {
    pending: Mutex<Vec<Envelope>>,
    ttl: chrono::Duration,
}

impl MessageBus {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Envelope>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a message for passive delivery.
    pub fn post(&self, address: Address, message: Message) {
        self.lock().push(Envelope { address, message });
    }

    /// Deliver everything pending for `reader`.
    ///
    /// `live` is the current set of live instances, used to decide when a
    /// broadcast has been seen by all of its targets.
    pub fn drain(&self, reader: &AgentInstance, live: &[AgentInstance], now: DateTime<Utc>) -> Drained {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|e| !e.message.is_expired(now, self.ttl));
        let expired = before - pending.len();

        let mut messages = Vec::new();
        let mut kept = Vec::with_capacity(pending.len());
        for mut env in pending.drain(..) {
            match disposition(&env.address, &env.message, reader) {
                Disposition::Consume => messages.push(env.message),
                Disposition::Read => {
                    env.message.read_by.insert(reader.instance_id.clone());
                    messages.push(env.message.clone());
                    kept.push(env);
                }
                Disposition::Skip => kept.push(env),
            }
        }

        let before = kept.len();
        kept.retain(|e| {
            !(e.address.is_broadcast() && broadcast_complete(&e.address, &e.message, live))
        });
        let completed = before - kept.len();
        *pending = kept;

        messages.sort_by_key(|m| (m.priority != Priority::Urgent, m.sent_at));
        Drained {
            messages,
            expired,
            completed,
        }
    }

    /// Drop every message older than the TTL, read or not.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|e| !e.message.is_expired(now, self.ttl));
        before - pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Copy of every pending message, in arrival order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }
}
