use moka::sync::Cache;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

use corral_core::constants::CHARS_PER_TOKEN;

/// Token counter wrapping tiktoken's cl100k_base tokenizer.
///
/// Caches results per blake3 content hash. If the tokenizer cannot be
/// loaded, falls back to one token per [`CHARS_PER_TOKEN`] characters.
pub struct TokenCounter {
    bpe: Option<Arc<CoreBPE>>,
    cache: Cache<String, usize>,
}

impl TokenCounter {
    /// Create a new TokenCounter with the given cache capacity.
    pub fn new(cache_capacity: u64) -> Self {
        let bpe = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(e) => {
                tracing::warn!(error = %e, "cl100k_base unavailable, approximating token counts");
                None
            }
        };
        Self {
            bpe,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Counter that always uses the character approximation.
    pub fn approximate(cache_capacity: u64) -> Self {
        Self {
            bpe: None,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Count tokens in the given text (uncached).
    pub fn count(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => approximate_count(text),
        }
    }

    /// Count tokens with blake3 content-hash caching.
    pub fn count_cached(&self, text: &str) -> usize {
        let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        self.cache.get_with(hash, || self.count(text))
    }

    /// Longest prefix of `text` that fits in `budget` tokens.
    pub fn truncate(&self, text: &str, budget: usize) -> String {
        if budget == 0 {
            return String::new();
        }
        if let Some(bpe) = &self.bpe {
            let tokens = bpe.encode_ordinary(text);
            if tokens.len() <= budget {
                return text.to_string();
            }
            // A cut can split a multi-byte character or re-encode longer;
            // step back until the prefix decodes and fits.
            let mut end = budget;
            while end > 0 {
                if let Ok(prefix) = bpe.decode(tokens[..end].to_vec()) {
                    if bpe.encode_ordinary(&prefix).len() <= budget {
                        return prefix;
                    }
                }
                end -= 1;
            }
            return String::new();
        }
        text.chars().take(budget * CHARS_PER_TOKEN).collect()
    }
}

fn approximate_count(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximation_rounds_up() {
        let c = TokenCounter::approximate(16);
        assert_eq!(c.count(""), 0);
        assert_eq!(c.count("abcd"), 1);
        assert_eq!(c.count("abcde"), 2);
    }

    #[test]
    fn approximate_truncate_cuts_on_chars() {
        let c = TokenCounter::approximate(16);
        assert_eq!(c.truncate("abcdefghij", 2), "abcdefgh");
        assert_eq!(c.truncate("abc", 0), "");
    }
}
