// Transcript of committed symbols

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::hand::StreamKind;

/// Symbol that renders as a blank in transcript text
pub const SPACE_SYMBOL: &str = "space";

/// A committed symbol with its commit metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedSymbol {
    pub symbol: String,
    pub stream: StreamKind,
    pub committed_at: DateTime<Utc>,
}

/// Ordered, append-only sequence of committed symbols
///
/// Only a completed hold appends here; the classifier and normalizer
/// never touch it. An explicit clear is the only other mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<CommittedSymbol>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append one committed symbol, stamped with the current wall-clock time
    pub fn push(&mut self, symbol: impl Into<String>, stream: StreamKind) {
        self.entries.push(CommittedSymbol {
            symbol: symbol.into(),
            stream,
            committed_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[CommittedSymbol] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render as display text; the "space" symbol becomes a blank
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.symbol == SPACE_SYMBOL {
                out.push(' ');
            } else {
                out.push_str(&entry.symbol);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.push("h", StreamKind::SingleHand);
        transcript.push("i", StreamKind::SingleHand);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].symbol, "h");
        assert_eq!(transcript.entries()[1].symbol, "i");
        assert_eq!(transcript.text(), "hi");
    }

    #[test]
    fn test_space_symbol_renders_blank() {
        let mut transcript = Transcript::new();
        transcript.push("a", StreamKind::SingleHand);
        transcript.push(SPACE_SYMBOL, StreamKind::SingleHand);
        transcript.push("b", StreamKind::TwoHand);

        assert_eq!(transcript.text(), "a b");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut transcript = Transcript::new();
        transcript.push("x", StreamKind::SingleHand);

        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.text(), "");

        transcript.clear();
        assert!(transcript.is_empty());
    }
}
