//! The authoritative, persisted, ordered log of accepted phrases.
//!
//! Story, cursor and used-set live under three [`StateKey`]s and are always
//! written together in one [`WriteBatch`], so a reader never observes one of
//! them without the others. In-memory state only changes once the batch has
//! been applied.

use crate::{PhraseGate, Rejection, story_tail};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use storyloom_core::{Cursor, Phrase};
use storyloom_error::{StorageError, StorageErrorKind, StoryloomResult};
use storyloom_interface::{KeyValueStore, StateKey, WriteBatch};
use tracing::{debug, error, info, instrument, warn};

/// Outcome of merging a set of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Phrases appended to the story, in acceptance order
    pub accepted: Vec<Phrase>,
    /// Phrases turned away and why
    pub rejected: Vec<(Phrase, Rejection)>,
}

/// SHA-256 of a phrase's canonical record, hex encoded.
///
/// # Errors
///
/// Returns a storage serialization error if the record cannot be encoded.
pub fn phrase_signature(phrase: &Phrase) -> StoryloomResult<String> {
    let record = phrase.to_record().map_err(|e| {
        StorageError::new(StorageErrorKind::Serialization(format!("phrase record: {}", e)))
    })?;
    let mut hasher = Sha256::new();
    hasher.update(record.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Ordered, deduplicated story backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct StoryStore<S> {
    store: S,
    gate: PhraseGate,
    phrases: Vec<Phrase>,
    cursor: Option<Cursor>,
    used: HashSet<String>,
}

impl<S: KeyValueStore> StoryStore<S> {
    /// Load persisted state.
    ///
    /// Unreadable story lines are skipped with a warning. The used-set is the
    /// union of what was stored and the signatures of the loaded story.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read or the stored cursor is
    /// not valid.
    #[instrument(skip_all, fields(backend = store.backend_name()))]
    pub async fn open(store: S, gate: PhraseGate) -> StoryloomResult<Self> {
        let mut phrases = Vec::new();
        let mut used = HashSet::new();

        if let Some(raw) = store.get(StateKey::Story).await? {
            for (index, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match Phrase::from_record(line) {
                    Ok(phrase) => {
                        if used.insert(phrase_signature(&phrase)?) {
                            phrases.push(phrase);
                        } else {
                            debug!(line = index + 1, "Dropping duplicate story record");
                        }
                    }
                    Err(e) => {
                        warn!(line = index + 1, error = %e, "Skipping unreadable story record");
                    }
                }
            }
        }

        if let Some(raw) = store.get(StateKey::UsedPhrases).await? {
            used.extend(
                raw.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }

        let cursor = match store.get(StateKey::Cursor).await? {
            Some(raw) if !raw.trim().is_empty() => {
                Some(serde_json::from_str::<Cursor>(&raw).map_err(|e| {
                    StorageError::new(StorageErrorKind::Corrupt {
                        key: StateKey::Cursor.to_string(),
                        message: e.to_string(),
                    })
                })?)
            }
            _ => None,
        };

        info!(
            phrases = phrases.len(),
            used = used.len(),
            cursor = ?cursor,
            "Opened story"
        );

        Ok(Self {
            store,
            gate,
            phrases,
            cursor,
            used,
        })
    }

    /// The backing store.
    pub fn backend(&self) -> &S {
        &self.store
    }

    /// Accepted phrases in order.
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    /// Current high-water mark, if any edit has been consumed.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Number of accepted phrases.
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// True when the story has no phrases.
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Total words across the story.
    pub fn word_count(&self) -> usize {
        self.phrases.iter().map(Phrase::word_count).sum()
    }

    /// Phrase texts joined by single spaces.
    pub fn text(&self) -> String {
        self.phrases
            .iter()
            .map(|phrase| phrase.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Last `n` words of the story.
    pub fn tail(&self, n: usize) -> String {
        story_tail(&self.text(), n)
    }

    /// Gate and deduplicate candidates without touching state.
    fn evaluate(
        &self,
        candidates: Vec<Phrase>,
    ) -> StoryloomResult<(Vec<(Phrase, String)>, Vec<(Phrase, Rejection)>)> {
        let mut accepted: Vec<(Phrase, String)> = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            if let Err(reason) = self.gate.check(&candidate.text) {
                debug!(text = %candidate.text, %reason, "Rejected phrase");
                rejected.push((candidate, reason));
                continue;
            }

            let signature = phrase_signature(&candidate)?;
            let seen = self.used.contains(&signature)
                || accepted.iter().any(|(_, existing)| existing == &signature);
            if seen {
                debug!(text = %candidate.text, "Rejected duplicate phrase");
                rejected.push((candidate, Rejection::Duplicate));
                continue;
            }

            accepted.push((candidate, signature));
        }
        Ok((accepted, rejected))
    }

    /// Merge candidates, keeping the current cursor.
    ///
    /// Merging the same candidates twice leaves the story unchanged the
    /// second time.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backend write fails; in-memory state
    /// is then unchanged.
    pub async fn merge(&mut self, candidates: Vec<Phrase>) -> StoryloomResult<MergeReport> {
        let cursor = self.cursor.clone();
        self.commit(candidates, cursor).await
    }

    /// Merge candidates and move the cursor in the same atomic write.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backend write fails; neither the
    /// story nor the cursor change in that case.
    #[instrument(skip_all, fields(candidates = candidates.len(), cursor = ?cursor))]
    pub async fn commit(
        &mut self,
        candidates: Vec<Phrase>,
        cursor: Option<Cursor>,
    ) -> StoryloomResult<MergeReport> {
        let (accepted, rejected) = self.evaluate(candidates)?;

        if accepted.is_empty() && cursor == self.cursor {
            return Ok(MergeReport {
                accepted: vec![],
                rejected,
            });
        }

        let batch = self.commit_batch(&accepted, cursor.as_ref())?;
        if let Err(e) = self.store.apply(batch).await {
            error!(error = %e, "Failed to persist story batch");
            return Err(e);
        }

        let mut report = MergeReport {
            accepted: Vec::with_capacity(accepted.len()),
            rejected,
        };
        for (phrase, signature) in accepted {
            self.used.insert(signature);
            self.phrases.push(phrase.clone());
            report.accepted.push(phrase);
        }
        self.cursor = cursor;

        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            total = self.phrases.len(),
            "Merged phrases"
        );
        Ok(report)
    }

    fn commit_batch(
        &self,
        accepted: &[(Phrase, String)],
        cursor: Option<&Cursor>,
    ) -> StoryloomResult<WriteBatch> {
        let serialization = |e: serde_json::Error| {
            StorageError::new(StorageErrorKind::Serialization(e.to_string()))
        };

        let mut story = String::new();
        for phrase in self
            .phrases
            .iter()
            .chain(accepted.iter().map(|(phrase, _)| phrase))
        {
            story.push_str(&phrase.to_record().map_err(serialization)?);
            story.push('\n');
        }

        let mut used: Vec<&str> = self
            .used
            .iter()
            .map(String::as_str)
            .chain(accepted.iter().map(|(_, signature)| signature.as_str()))
            .collect();
        used.sort_unstable();
        let used = used.join("\n");

        let batch = WriteBatch::new()
            .put(StateKey::Story, story)
            .put(StateKey::UsedPhrases, used);

        Ok(match cursor {
            Some(cursor) => batch.put(
                StateKey::Cursor,
                serde_json::to_string(cursor).map_err(serialization)?,
            ),
            None => batch.remove(StateKey::Cursor),
        })
    }

    /// Clear story, cursor and used-set in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backend write fails; in-memory state
    /// is then unchanged.
    #[instrument(skip_all, fields(phrases = self.phrases.len()))]
    pub async fn reset(&mut self) -> StoryloomResult<()> {
        let batch = WriteBatch::new()
            .remove(StateKey::Story)
            .remove(StateKey::Cursor)
            .remove(StateKey::UsedPhrases);

        if let Err(e) = self.store.apply(batch).await {
            error!(error = %e, "Failed to reset story");
            return Err(e);
        }

        self.phrases.clear();
        self.used.clear();
        self.cursor = None;
        info!("Story reset");
        Ok(())
    }
}
