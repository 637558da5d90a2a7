//! The ingestion engine: fetch, dedupe, transform and persist.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
	date,
	model::{non_blank, Comment, Post},
	source::{self, CommentRecord, PostRecord, Source},
	store::{self, Store},
};

/// A whole cycle failed before processing any record. The next cycle will
/// simply try again.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Upstream(#[from] source::Error),
	#[error(transparent)]
	Storage(#[from] store::Error),
}

/// Why a single record was not stored. These never fail the cycle.
#[derive(Debug, thiserror::Error)]
enum RecordError {
	#[error("comments unavailable: {0}")]
	Comments(#[source] source::Error),
	#[error("invalid record: {0}")]
	Invalid(&'static str),
	#[error(transparent)]
	Date(#[from] date::Error),
	#[error(transparent)]
	Storage(store::Error),
}

/// The outcome of one fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct CycleSummary {
	/// Posts listed by the external source.
	pub total_fetched: usize,
	/// Posts stored by this cycle.
	pub new_posts: usize,
	/// Posts skipped because they were already stored.
	pub skipped_posts: usize,
	/// Posts that could not be fetched or transformed.
	pub failed_posts: usize,
	/// Posts that another writer stored first.
	pub duplicate_posts: usize,
	/// Wall time of the cycle, in seconds.
	pub processing_time: f64,
}

/// Something the scheduler can run periodically.
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
	async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleSummary, Error>;
}

#[derive(Debug, Clone, Copy)]
pub struct Options {
	/// Upper bound on posts stored per cycle.
	pub max_posts_per_fetch: usize,
	/// How far back post dates are synthesized.
	pub date_range_days: i64,
	/// How far after its post a comment date is synthesized.
	pub comment_range_days: i64,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			max_posts_per_fetch: 10,
			date_range_days: 365,
			comment_range_days: 30,
		}
	}
}

/// Copies new posts and their comments from a [`Source`] into the store.
pub struct Ingestor {
	source: Arc<dyn Source>,
	store: Store,
	options: Options,
}

impl Ingestor {
	pub fn new(source: Arc<dyn Source>, store: Store, options: Options) -> Self {
		Self {
			source,
			store,
			options,
		}
	}

	/// Runs one fetch cycle.
	///
	/// Records are processed one after another. Failures of a single record
	/// are logged and skipped; only failing to list posts or to read the
	/// stored identities fails the cycle. Cancellation is checked between
	/// records.
	#[tracing::instrument(name = "fetch_cycle", skip_all)]
	pub async fn run(&self, cancel: &CancellationToken) -> Result<CycleSummary, Error> {
		tracing::info!("starting fetch cycle");

		let started = Instant::now();
		let candidates = self.source.list_posts().await?;
		let existing = self.store.existing_identities().await?;

		let new_posts = candidates
			.iter()
			.filter(|record| !existing.contains(&record.id))
			.collect::<Vec<_>>();

		let mut summary = CycleSummary {
			total_fetched: candidates.len(),
			skipped_posts: candidates.len() - new_posts.len(),
			..CycleSummary::default()
		};

		let batch = &new_posts[..new_posts.len().min(self.options.max_posts_per_fetch)];

		tracing::info!(
			candidates = candidates.len(),
			new = new_posts.len(),
			batch = batch.len(),
			"processing new posts"
		);

		for record in batch {
			if cancel.is_cancelled() {
				tracing::info!("fetch cycle cancelled");
				break;
			}

			match self.ingest(record).await {
				Ok(()) => summary.new_posts += 1,
				Err(RecordError::Storage(store::Error::DuplicateKey(post_id))) => {
					tracing::info!(post_id, "post was stored concurrently, skipping");
					summary.duplicate_posts += 1;
				}
				Err(error) => {
					tracing::error!(post_id = record.id, %error, "failed to process post");
					summary.failed_posts += 1;
				}
			}
		}

		summary.processing_time = started.elapsed().as_secs_f64();

		tracing::info!(
			total_fetched = summary.total_fetched,
			new_posts = summary.new_posts,
			skipped_posts = summary.skipped_posts,
			failed_posts = summary.failed_posts,
			duplicate_posts = summary.duplicate_posts,
			processing_time = summary.processing_time,
			"fetch cycle completed"
		);

		Ok(summary)
	}

	async fn ingest(&self, record: &PostRecord) -> Result<(), RecordError> {
		let comments = self
			.source
			.list_comments(record.id)
			.await
			.map_err(RecordError::Comments)?;

		let post = self.transform(record, comments)?;

		self.store
			.insert_post(&post)
			.await
			.map_err(RecordError::Storage)?;

		tracing::debug!(post_id = post.post_id, comments = post.comments.len(), "stored post");

		Ok(())
	}

	/// Builds the stored document for a record, synthesizing its dates.
	///
	/// `fetched_at` is taken last, so it is never earlier than the dates
	/// drawn before it.
	fn transform(&self, record: &PostRecord, comments: Vec<CommentRecord>) -> Result<Post, RecordError> {
		if record.id <= 0 || record.user_id <= 0 {
			return Err(RecordError::Invalid("post and user ids must be positive"));
		}

		let title = non_blank(&record.title).ok_or(RecordError::Invalid("title is blank"))?;
		let body = non_blank(&record.body).ok_or(RecordError::Invalid("body is blank"))?;
		let created_at = date::random_past_timestamp(self.options.date_range_days)?;
		let mut transformed = Vec::with_capacity(comments.len());

		for comment in comments {
			let comment_created_at =
				date::random_followup_timestamp(created_at, self.options.comment_range_days)?;

			transformed.extend(transform_comment(record.id, comment, comment_created_at));
		}

		Ok(Post {
			id: Uuid::new_v4(),
			post_id: record.id,
			user_id: record.user_id,
			title: title.to_owned(),
			body: body.to_owned(),
			created_at,
			fetched_at: Utc::now(),
			updated_at: None,
			comments: transformed,
		})
	}
}

/// Validates a comment against its parent post, dropping it if it does not belong.
fn transform_comment(
	post_id: i64,
	record: CommentRecord,
	created_at: DateTime<Utc>,
) -> Option<Comment> {
	if record.id <= 0 || record.post_id != post_id {
		tracing::warn!(
			post_id,
			comment_id = record.id,
			"dropping comment with a bad identity"
		);
		return None;
	}

	let Some(body) = non_blank(&record.body) else {
		tracing::warn!(post_id, comment_id = record.id, "dropping comment with a blank body");
		return None;
	};

	Some(Comment {
		comment_id: record.id,
		post_id,
		name: record.name.trim().to_owned(),
		email: record.email.trim().to_owned(),
		body: body.to_owned(),
		created_at,
	})
}

#[async_trait]
impl Cycle for Ingestor {
	async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleSummary, Error> {
		self.run(cancel).await
	}
}
