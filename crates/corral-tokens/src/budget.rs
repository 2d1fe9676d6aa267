//! Packing rank-ordered text into a fixed token budget.

use super::counter::TokenCounter;

/// One kept entry of a [`Packed`] result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLine {
    /// Position in the input slice.
    pub index: usize,
    pub text: String,
    pub tokens: usize,
    /// The input was cut to fit.
    pub truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packed {
    pub lines: Vec<PackedLine>,
    pub used: usize,
    /// Inputs left out.
    pub omitted: usize,
}

impl Packed {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A token limit measured with a shared [`TokenCounter`].
pub struct TokenBudget<'a> {
    counter: &'a TokenCounter,
    limit: usize,
}

impl<'a> TokenBudget<'a> {
    pub fn new(counter: &'a TokenCounter, limit: usize) -> Self {
        Self { counter, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn fits(&self, text: &str) -> bool {
        self.counter.count_cached(text) <= self.limit
    }

    /// Keep the longest prefix of `items` that fits.
    ///
    /// Items arrive in rank order, so packing stops at the first item that
    /// does not fit rather than skipping ahead to smaller ones. When not even
    /// the first item fits, a truncated copy of it is kept instead.
    pub fn pack(&self, items: &[String]) -> Packed {
        let mut packed = Packed::default();
        for (index, text) in items.iter().enumerate() {
            let tokens = self.counter.count_cached(text);
            if packed.used + tokens > self.limit {
                break;
            }
            packed.used += tokens;
            packed.lines.push(PackedLine {
                index,
                text: text.clone(),
                tokens,
                truncated: false,
            });
        }

        if packed.is_empty() {
            if let Some(first) = items.first() {
                let text = self.counter.truncate(first, self.limit);
                if !text.is_empty() {
                    let tokens = self.counter.count_cached(&text);
                    packed.used = tokens;
                    packed.lines.push(PackedLine {
                        index: 0,
                        text,
                        tokens,
                        truncated: true,
                    });
                }
            }
        }

        packed.omitted = items.len() - packed.lines.len();
        packed
    }
}
