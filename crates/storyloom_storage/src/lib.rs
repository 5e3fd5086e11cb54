//! Key-value persistence for storyloom.
//!
//! Two backends implement [`KeyValueStore`](storyloom_interface::KeyValueStore):
//!
//! - [`FileSystemStore`]: one file per key, multi-key batches committed
//!   through a staged transaction directory so a crash never leaves the story,
//!   cursor and used-set out of step with each other.
//! - [`InMemoryStore`]: a map behind a lock, for tests and throwaway runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod memory;

pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
