//! Phrases: the attributed units of story content.

use serde::{Deserialize, Serialize};

/// Attribution of a phrase to the edit that inspired it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhraseSource {
    /// Author of the inspiring edit
    #[serde(alias = "user")]
    pub author: String,
    /// Edit time, formatted `MM.DD.YY HH:MM` in local time
    pub timestamp: String,
    /// Raw edit text the phrase was derived from
    pub comment: String,
}

impl PhraseSource {
    /// Create a new source record.
    pub fn new(
        author: impl Into<String>,
        timestamp: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            timestamp: timestamp.into(),
            comment: comment.into(),
        }
    }
}

/// A candidate or accepted unit of the story.
///
/// Two phrases are the same story entry only when both `text` and `source`
/// match.
///
/// # Examples
///
/// ```
/// use storyloom_core::{Phrase, PhraseSource};
///
/// let phrase = Phrase::new(
///     "ancient swords hung quietly",
///     PhraseSource::new("Bob", "01.01.24 00:00", "Added swords"),
/// );
/// assert_eq!(phrase.word_count(), 4);
/// assert_eq!(phrase.display_line(), "Ancient swords hung quietly,");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Phrase {
    /// Lowercase phrase text
    pub text: String,
    /// Edit that produced the phrase
    pub source: PhraseSource,
}

impl Phrase {
    /// Create a new phrase.
    pub fn new(text: impl Into<String>, source: PhraseSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// Whitespace-separated tokens of the text.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }

    /// Number of whitespace-separated tokens.
    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    /// Line shown to readers: first letter capitalised, trailing comma.
    pub fn display_line(&self) -> String {
        let text = self.text.trim();
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => format!("{}{},", first.to_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    /// Canonical single-line record used for persistence and signatures.
    pub fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a record produced by [`Phrase::to_record`].
    pub fn from_record(record: &str) -> serde_json::Result<Self> {
        serde_json::from_str(record)
    }
}
