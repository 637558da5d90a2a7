use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored post document, including its embedded comments.
///
/// Posts are created once by the ingestion engine and afterwards only have
/// their `body` (and therefore `updated_at`) edited.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Post {
	/// The storage-internal document id.
	#[serde(rename = "_id")]
	pub id: Uuid,
	/// The identity assigned by the external source, unique across the store.
	pub post_id: i64,
	/// The author, as reported by the external source.
	pub user_id: i64,
	pub title: String,
	pub body: String,
	/// Synthesized creation time.
	pub created_at: DateTime<Utc>,
	/// When the post was ingested.
	pub fetched_at: DateTime<Utc>,
	/// When the body was last edited, if ever.
	pub updated_at: Option<DateTime<Utc>>,
	pub comments: Vec<Comment>,
}

/// A comment, owned by exactly one [`Post`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Comment {
	/// The identity assigned by the external source.
	pub comment_id: i64,
	/// The post this comment belongs to.
	pub post_id: i64,
	pub name: String,
	pub email: String,
	pub body: String,
	/// Synthesized creation time, always after the post's.
	pub created_at: DateTime<Utc>,
}

/// Inclusive bounds on a post's `created_at`, either of which may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
	pub start: Option<DateTime<Utc>>,
	pub end: Option<DateTime<Utc>>,
}

impl DateRange {
	#[cfg(test)]
	pub fn contains(&self, date: DateTime<Utc>) -> bool {
		self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
	}

	/// Whether the range is inverted, and therefore matches nothing.
	pub fn is_inverted(&self) -> bool {
		matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
	}
}

/// Comments matching a search, along with the number of matches before
/// the result was truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentSearch {
	pub comments: Vec<Comment>,
	pub total_count: u64,
}

/// Returns the trimmed text, or `None` if nothing is left after trimming.
pub fn non_blank(text: &str) -> Option<&str> {
	let text = text.trim();

	(!text.is_empty()).then_some(text)
}
