use std::{collections::HashSet, str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
	postgres::{PgConnectOptions, PgPoolOptions},
	types::Json,
	PgPool,
};
use uuid::Uuid;

use super::{check_range, search_needle, Error, PostStore, Result};
use crate::model::{Comment, CommentSearch, DateRange, Post};

/// The unique index backing post identities. A violation of it is how a lost
/// insert race shows up.
const POST_ID_INDEX: &str = "post_post_id_key";

const SCHEMA: &[&str] = &[
	r"
		CREATE TABLE IF NOT EXISTS post (
			id UUID PRIMARY KEY,
			post_id BIGINT NOT NULL,
			user_id BIGINT NOT NULL,
			title TEXT NOT NULL,
			body TEXT NOT NULL,
			created_at TIMESTAMPTZ NOT NULL,
			fetched_at TIMESTAMPTZ NOT NULL,
			updated_at TIMESTAMPTZ,
			comments JSONB NOT NULL DEFAULT '[]'::jsonb
		)
	",
	"CREATE UNIQUE INDEX IF NOT EXISTS post_post_id_key ON post (post_id)",
	"CREATE INDEX IF NOT EXISTS post_created_at_idx ON post (created_at)",
];

/// Trigram index over the comment bodies, used to narrow down comment searches.
/// Creating the extension needs privileges the service may not have.
const SEARCH_INDEX: &[&str] = &[
	"CREATE EXTENSION IF NOT EXISTS pg_trgm",
	r"
		CREATE INDEX IF NOT EXISTS post_comment_body_idx ON post
		USING gin ((jsonb_path_query_array(comments, '$[*].body')::text) gin_trgm_ops)
	",
];

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	post_id: i64,
	user_id: i64,
	title: String,
	body: String,
	created_at: DateTime<Utc>,
	fetched_at: DateTime<Utc>,
	updated_at: Option<DateTime<Utc>>,
	comments: Json<Vec<Comment>>,
}

impl From<PostRow> for Post {
	fn from(row: PostRow) -> Self {
		Self {
			id: row.id,
			post_id: row.post_id,
			user_id: row.user_id,
			title: row.title,
			body: row.body,
			created_at: row.created_at,
			fetched_at: row.fetched_at,
			updated_at: row.updated_at,
			comments: row.comments.0,
		}
	}
}

/// [`PostStore`] keeping one row per post document in Postgres, with the
/// comments embedded as a JSONB array.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the store, checks that it answers, and makes sure the
	/// `post` table and its indexes exist.
	///
	/// `database` overrides the database named in `url`.
	pub async fn connect(url: &str, database: Option<&str>) -> Result<Self> {
		tracing::info!("connecting to the document store");

		let mut options = PgConnectOptions::from_str(url).map_err(Error::Unavailable)?;

		if let Some(database) = database {
			options = options.database(database);
		}

		let pool = PgPoolOptions::new()
			.acquire_timeout(Duration::from_secs(5))
			.connect_with(options)
			.await
			.map_err(Error::Unavailable)?;

		let store = Self::from_pool(pool).await?;

		tracing::info!("connected to the document store");

		Ok(store)
	}

	/// Wraps an existing pool, checking that it answers and making sure the
	/// schema exists.
	pub async fn from_pool(pool: PgPool) -> Result<Self> {
		let store = Self { pool };

		store.ping().await?;
		store.ensure_schema().await?;

		Ok(store)
	}

	async fn ensure_schema(&self) -> Result<()> {
		for statement in SCHEMA {
			sqlx::query(statement).execute(&self.pool).await?;
		}

		for statement in SEARCH_INDEX {
			if let Err(error) = sqlx::query(statement).execute(&self.pool).await {
				tracing::warn!(%error, "comment search index unavailable, searches will scan");
				break;
			}
		}

		tracing::info!("database indexes ensured");

		Ok(())
	}
}

#[async_trait]
impl PostStore for PgStore {
	async fn ping(&self) -> Result<()> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(Error::Unavailable)?;

		Ok(())
	}

	async fn disconnect(&self) {
		if !self.pool.is_closed() {
			self.pool.close().await;
			tracing::info!("disconnected from the document store");
		}
	}

	async fn existing_identities(&self) -> Result<HashSet<i64>> {
		let ids = sqlx::query_scalar::<_, i64>("SELECT post_id FROM post")
			.fetch_all(&self.pool)
			.await?;

		Ok(ids.into_iter().collect())
	}

	async fn insert_post(&self, post: &Post) -> Result<()> {
		sqlx::query(
			r"
				INSERT INTO post (id, post_id, user_id, title, body, created_at, fetched_at, updated_at, comments)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
			",
		)
		.bind(post.id)
		.bind(post.post_id)
		.bind(post.user_id)
		.bind(&post.title)
		.bind(&post.body)
		.bind(post.created_at)
		.bind(post.fetched_at)
		.bind(post.updated_at)
		.bind(Json(&post.comments))
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d)
				if d.is_unique_violation() && d.constraint() == Some(POST_ID_INDEX) =>
			{
				Error::DuplicateKey(post.post_id)
			}
			e => Error::from(e),
		})?;

		Ok(())
	}

	async fn update_post_body(&self, post_id: i64, body: &str, now: DateTime<Utc>) -> Result<bool> {
		let status = sqlx::query(
			r"
				UPDATE post
				SET body = $1, updated_at = $2
				WHERE post_id = $3
			",
		)
		.bind(body)
		.bind(now)
		.bind(post_id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() == 1)
	}

	async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, PostRow>("SELECT * FROM post WHERE post_id = $1")
			.bind(post_id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post.map(Post::from))
	}

	async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
		let comment = sqlx::query_scalar::<_, Json<Comment>>(
			r"
				SELECT c.comment
				FROM post
				CROSS JOIN LATERAL jsonb_array_elements(post.comments) AS c(comment)
				WHERE (c.comment ->> 'comment_id')::bigint = $1
				ORDER BY post.post_id
				LIMIT 1
			",
		)
		.bind(comment_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(comment.map(|comment| comment.0))
	}

	async fn search_comments(&self, query: &str, limit: usize) -> Result<CommentSearch> {
		let needle = search_needle(query)?;
		let limit = i64::try_from(limit).unwrap_or(i64::MAX);

		// The first pattern runs against the indexed JSON text of all bodies
		// in a post, so it has to be escaped the way JSON escapes strings.
		let rows = sqlx::query_as::<_, (Json<Comment>, i64)>(
			r"
				SELECT c.comment, COUNT(*) OVER () AS total_count
				FROM post
				CROSS JOIN LATERAL jsonb_array_elements(post.comments) WITH ORDINALITY AS c(comment, position)
				WHERE jsonb_path_query_array(post.comments, '$[*].body')::text ILIKE $1
					AND c.comment ->> 'body' ILIKE $2
				ORDER BY post.post_id, c.position
				LIMIT $3
			",
		)
		.bind(contains_pattern(&json_escape(needle)))
		.bind(contains_pattern(needle))
		.bind(limit)
		.fetch_all(&self.pool)
		.await?;

		let total_count = rows
			.first()
			.map_or(0, |(_, total)| u64::try_from(*total).unwrap_or_default());

		Ok(CommentSearch {
			comments: rows.into_iter().map(|(comment, _)| comment.0).collect(),
			total_count,
		})
	}

	async fn count_posts(&self, range: DateRange) -> Result<u64> {
		check_range(&range)?;

		let count = sqlx::query_scalar::<_, i64>(
			r"
				SELECT COUNT(*) FROM post
				WHERE ($1::timestamptz IS NULL OR created_at >= $1)
					AND ($2::timestamptz IS NULL OR created_at <= $2)
			",
		)
		.bind(range.start)
		.bind(range.end)
		.fetch_one(&self.pool)
		.await?;

		Ok(u64::try_from(count).unwrap_or_default())
	}

	async fn all_posts(&self) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, PostRow>("SELECT * FROM post ORDER BY post_id")
			.fetch_all(&self.pool)
			.await?;

		Ok(posts.into_iter().map(Post::from).collect())
	}

	async fn clear(&self) -> Result<u64> {
		let status = sqlx::query("DELETE FROM post").execute(&self.pool).await?;

		Ok(status.rows_affected())
	}
}

/// Builds an `ILIKE` pattern matching any text that contains `needle`.
fn contains_pattern(needle: &str) -> String {
	let mut pattern = String::with_capacity(needle.len() + 2);

	pattern.push('%');

	for c in needle.chars() {
		if matches!(c, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(c);
	}

	pattern.push('%');
	pattern
}

/// Escapes `text` the way it appears inside a JSON string literal.
fn json_escape(text: &str) -> String {
	let quoted = serde_json::Value::from(text).to_string();

	quoted[1..quoted.len() - 1].to_owned()
}
