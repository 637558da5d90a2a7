//! The document store gateway.

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{Comment, CommentSearch, DateRange, Post};

/// A shared handle to the store, used by both request handlers and the
/// background fetcher.
pub type Store = Arc<dyn PostStore>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A post with this identity is already stored. This is the authoritative
	/// duplicate check; any pre-check done before inserting is only an
	/// optimization.
	#[error("post {0} already exists")]
	DuplicateKey(i64),
	#[error("storage unavailable: {0}")]
	Unavailable(#[source] sqlx::Error),
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
	#[error("database error: {0}")]
	Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for Error {
	fn from(error: sqlx::Error) -> Self {
		match error {
			sqlx::Error::Io(..)
			| sqlx::Error::Tls(..)
			| sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::WorkerCrashed => Self::Unavailable(error),
			error => Self::Database(error),
		}
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Atomic single-document primitives over the post collection.
///
/// Lookups that miss return `None` rather than an error so that callers can
/// decide how to surface the absence.
#[async_trait]
pub trait PostStore: Send + Sync {
	/// Checks that the store is reachable.
	async fn ping(&self) -> Result<()>;

	/// Releases the connection. Safe to call more than once.
	async fn disconnect(&self);

	/// Returns the identity of every stored post.
	async fn existing_identities(&self) -> Result<HashSet<i64>>;

	/// Inserts a new post document, failing with [`Error::DuplicateKey`] if
	/// its identity is already taken.
	async fn insert_post(&self, post: &Post) -> Result<()>;

	/// Replaces the body of a post and stamps `updated_at`, returning whether
	/// exactly one post was modified.
	async fn update_post_body(&self, post_id: i64, body: &str, now: DateTime<Utc>) -> Result<bool>;

	async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

	async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>>;

	/// Case-insensitive substring search over comment bodies, returning at
	/// most `limit` comments but counting every match.
	async fn search_comments(&self, query: &str, limit: usize) -> Result<CommentSearch>;

	/// Counts posts whose `created_at` falls within the range.
	async fn count_posts(&self, range: DateRange) -> Result<u64>;

	/// Returns every stored post, ordered by identity.
	async fn all_posts(&self) -> Result<Vec<Post>>;

	/// Deletes every stored post, returning how many were removed.
	async fn clear(&self) -> Result<u64>;
}

/// Rejects blank search queries. Non-blank queries are matched as given,
/// surrounding whitespace included.
pub(crate) fn search_needle(query: &str) -> Result<&str> {
	if crate::model::non_blank(query).is_none() {
		return Err(Error::InvalidArgument("search query cannot be empty"));
	}

	Ok(query)
}

/// Rejects ranges whose start lies after their end.
pub(crate) fn check_range(range: &DateRange) -> Result<()> {
	if range.is_inverted() {
		return Err(Error::InvalidArgument("start_date cannot be after end_date"));
	}

	Ok(())
}
