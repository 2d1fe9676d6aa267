//! Structured log events for coordination operations.
//!
//! Each function emits a `tracing` event with structured fields.

/// A save or append committed on the primary store.
pub fn write_committed(kind: &str, id: &str, op: &str) {
    tracing::debug!(
        event = "write_committed",
        kind = %kind,
        id = %id,
        op = %op,
        "write committed"
    );
}

/// A writer gave up waiting for the write lock.
pub fn write_timed_out(kind: &str, id: &str, waited_ms: u64) {
    tracing::warn!(
        event = "write_timeout",
        kind = %kind,
        id = %id,
        waited_ms = waited_ms,
        "write lock not acquired in time"
    );
}

/// One shadow attempt failed and will be retried.
pub fn shadow_retry(key: &str, attempt: u32, error: &str) {
    tracing::debug!(
        event = "shadow_retry",
        key = %key,
        attempt = attempt,
        error = %error,
        "shadow propagation attempt failed, retrying"
    );
}

/// A shadow propagation exhausted its attempts and was dropped.
pub fn shadow_dropped(key: &str, attempts: u32, error: &str) {
    tracing::warn!(
        event = "shadow_dropped",
        key = %key,
        attempts = attempts,
        error = %error,
        "shadow propagation dropped"
    );
}

/// The propagator's receiver fell behind and notifications were lost.
pub fn notifications_lagged(skipped: u64) {
    tracing::warn!(
        event = "notifications_lagged",
        skipped = skipped,
        "shadow propagator lagged behind write notifications"
    );
}

pub fn message_sent(message_id: &str, from: &str, to: &str) {
    tracing::debug!(
        event = "message_sent",
        message_id = %message_id,
        from = %from,
        to = %to,
        "message sent"
    );
}

pub fn message_pushed(message_id: &str, instance_id: &str) {
    tracing::debug!(
        event = "message_pushed",
        message_id = %message_id,
        instance_id = %instance_id,
        "message pushed to live channel"
    );
}

/// A live push failed; the message stays pending for passive drain.
pub fn push_fell_back(message_id: &str, instance_id: &str, error: &str) {
    tracing::info!(
        event = "push_fallback",
        message_id = %message_id,
        instance_id = %instance_id,
        error = %error,
        "live push failed, falling back to passive delivery"
    );
}

pub fn messages_pruned(expired: usize, consumed: usize) {
    tracing::debug!(
        event = "messages_pruned",
        expired = expired,
        consumed = consumed,
        "messages pruned"
    );
}

/// An instance moved between presence states.
pub fn presence_transition(instance_id: &str, from: &str, to: &str) {
    tracing::info!(
        event = "presence_transition",
        instance_id = %instance_id,
        from = %from,
        to = %to,
        "presence transition"
    );
}

pub fn checkin_rejected(instance_id: &str, reason: &str) {
    tracing::warn!(
        event = "checkin_rejected",
        instance_id = %instance_id,
        reason = %reason,
        "checkin rejected"
    );
}

/// Pane assembly exceeded its bound and returned no context.
pub fn pane_timed_out(instance_id: &str, timeout_ms: u64) {
    tracing::warn!(
        event = "pane_timeout",
        instance_id = %instance_id,
        timeout_ms = timeout_ms,
        "context pane assembly timed out"
    );
}
