//! Acceptance gate for candidate phrases.

use crate::Sanitizer;

/// Prefixes that mark a phrase as leaked edit-summary noise.
///
/// Matched against the start of the text, not the first word, so
/// "editorial" and "whenever" are caught too.
pub const NOISY_OPENERS: &[&str] = &["edit", "as", "when"];

/// Substrings a phrase must never contain.
pub const FORBIDDEN_FRAGMENTS: &[&str] = &["discussed"];

/// Why a candidate phrase was not added to the story.
///
/// Rejection is expected steady-state behaviour, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    /// Nothing but whitespace
    Empty,
    /// Fewer words than the minimum
    TooFewWords,
    /// More words than the maximum
    TooManyWords,
    /// Starts with a discourse-noise prefix
    NoisyOpener,
    /// Contains a forbidden fragment
    ForbiddenWord,
    /// Too few words outside the banned-term set
    TooFewContentWords,
    /// Already part of the story
    Duplicate,
}

/// Structural checks applied to every candidate phrase.
///
/// Deduplication is left to the story store, which owns the used-set.
///
/// # Examples
///
/// ```
/// use storyloom_narrative::{PhraseGate, Rejection};
///
/// let gate = PhraseGate::default();
/// assert_eq!(gate.check("edit the page now"), Err(Rejection::NoisyOpener));
/// assert_eq!(gate.check("ancient swords hung quietly"), Ok(()));
/// ```
#[derive(Debug, Clone)]
pub struct PhraseGate {
    sanitizer: Sanitizer,
    min_words: usize,
    max_words: usize,
    min_content_words: usize,
}

impl Default for PhraseGate {
    fn default() -> Self {
        Self::new(Sanitizer::default())
    }
}

impl PhraseGate {
    /// Gate using `sanitizer`'s banned-term set and a 3..=6 word band.
    pub fn new(sanitizer: Sanitizer) -> Self {
        Self {
            sanitizer,
            min_words: 3,
            max_words: 6,
            min_content_words: 2,
        }
    }

    /// Override the accepted word band.
    pub fn with_word_band(mut self, min_words: usize, max_words: usize) -> Self {
        self.min_words = min_words;
        self.max_words = max_words;
        self
    }

    /// Run every structural check against `text`.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn check(&self, text: &str) -> Result<(), Rejection> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        if words.is_empty() {
            return Err(Rejection::Empty);
        }
        if words.len() < self.min_words {
            return Err(Rejection::TooFewWords);
        }
        if words.len() > self.max_words {
            return Err(Rejection::TooManyWords);
        }
        if NOISY_OPENERS
            .iter()
            .any(|opener| lowered.trim_start().starts_with(opener))
        {
            return Err(Rejection::NoisyOpener);
        }
        if FORBIDDEN_FRAGMENTS
            .iter()
            .any(|fragment| lowered.contains(fragment))
        {
            return Err(Rejection::ForbiddenWord);
        }

        let content_words = words
            .iter()
            .filter(|word| !self.sanitizer.is_banned(word))
            .count();
        if content_words < self.min_content_words {
            return Err(Rejection::TooFewContentWords);
        }
        Ok(())
    }
}
