//! Change feed backed by the MediaWiki `list=recentchanges` API.
//!
//! [`RecentChangesClient`] implements
//! [`ChangeFeed`](storyloom_interface::ChangeFeed): every call fetches the most
//! recent edits, newest first, and maps them into
//! [`EditEvent`](storyloom_core::EditEvent)s. Any transport, status or schema
//! problem becomes a [`FeedError`](storyloom_error::FeedError).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod response;

pub use client::RecentChangesClient;
pub use config::FeedConfig;
pub use response::{ApiError, Query, RecentChange, RecentChangesResponse};
