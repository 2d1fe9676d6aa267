/// Corral version string.
pub const CORRAL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reserved address keyword: single-consumer delivery.
pub const ANYONE: &str = "anyone";

/// Reserved address keyword: broadcast delivery.
pub const EVERYONE: &str = "everyone";

/// Maximum length of an address segment (agent, instance, or scope).
pub const MAX_ADDRESS_SEGMENT_LEN: usize = 128;

/// Maximum length of a checkin status string; longer strings are truncated.
pub const MAX_STATUS_LEN: usize = 280;

/// Approximate characters per token, used when the tokenizer is unavailable.
pub const CHARS_PER_TOKEN: usize = 4;
