//! Keys and write batches for persisted state.

use serde::{Deserialize, Serialize};

/// The logical keys of persisted pipeline state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateKey {
    /// Newline-delimited phrase records in acceptance order
    Story,
    /// The feed cursor
    Cursor,
    /// Signatures of every phrase ever accepted since the last reset
    UsedPhrases,
}

impl StateKey {
    /// File name used by filesystem backends.
    pub fn file_name(self) -> &'static str {
        match self {
            StateKey::Story => "story.ndjson",
            StateKey::Cursor => "cursor.json",
            StateKey::UsedPhrases => "used_phrases.txt",
        }
    }
}

/// A single mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Store a value, replacing any previous one
    Put {
        /// Target key
        key: StateKey,
        /// New value
        value: String,
    },
    /// Delete a value; deleting a missing key is not an error
    Remove {
        /// Target key
        key: StateKey,
    },
}

impl WriteOp {
    /// Key touched by this operation.
    pub fn key(&self) -> StateKey {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Remove { key } => *key,
        }
    }
}

/// Ordered set of mutations applied atomically.
///
/// # Examples
///
/// ```
/// use storyloom_interface::{StateKey, WriteBatch};
///
/// let batch = WriteBatch::new()
///     .put(StateKey::Story, "")
///     .remove(StateKey::Cursor);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a put operation.
    pub fn put(mut self, key: StateKey, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Put {
            key,
            value: value.into(),
        });
        self
    }

    /// Add a remove operation.
    pub fn remove(mut self, key: StateKey) -> Self {
        self.ops.push(WriteOp::Remove { key });
        self
    }

    /// Operations in insertion order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch into its operations.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when the batch holds no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
