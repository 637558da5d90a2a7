//! Client for the external posts API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

/// Requests to the external source give up after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The external source could not be reached or answered with something unusable.
///
/// None of these are retried here; the scheduler simply tries again on its
/// next tick.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("upstream unavailable: {0}")]
	Unavailable(#[from] reqwest::Error),
	#[error("upstream returned {status} for {url}")]
	Status { url: String, status: StatusCode },
	#[error("upstream returned a malformed payload for {url}: {reason}")]
	Malformed { url: String, reason: String },
}

/// A post as listed by the external source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostRecord {
	pub id: i64,
	#[serde(rename = "userId")]
	pub user_id: i64,
	pub title: String,
	pub body: String,
}

/// A comment as listed by the external source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentRecord {
	pub id: i64,
	#[serde(rename = "postId")]
	pub post_id: i64,
	pub name: String,
	pub email: String,
	pub body: String,
}

/// Where posts and their comments are ingested from.
#[async_trait]
pub trait Source: Send + Sync {
	/// Lists every post the source currently knows about, in source order.
	async fn list_posts(&self) -> Result<Vec<PostRecord>, Error>;

	/// Lists the comments of a single post.
	async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, Error>;
}

/// [`Source`] backed by a JSONPlaceholder-style REST API.
pub struct HttpSource {
	client: Client,
	base_url: String,
}

impl HttpSource {
	pub fn new(base_url: &str) -> Result<Self, Error> {
		let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_owned(),
		})
	}

	async fn get_list<T>(&self, url: String) -> Result<Vec<T>, Error>
	where
		T: DeserializeOwned,
	{
		let response = self.client.get(&url).send().await?;
		let status = response.status();

		if !status.is_success() {
			return Err(Error::Status { url, status });
		}

		let payload = response.json::<Value>().await?;

		decode_list(&url, payload)
	}
}

#[async_trait]
impl Source for HttpSource {
	async fn list_posts(&self) -> Result<Vec<PostRecord>, Error> {
		tracing::info!(base_url = %self.base_url, "fetching posts from external source");

		let posts = self.get_list(format!("{}/posts", self.base_url)).await?;

		tracing::info!(count = posts.len(), "fetched posts from external source");

		Ok(posts)
	}

	async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, Error> {
		self.get_list(format!("{}/posts/{post_id}/comments", self.base_url))
			.await
	}
}

/// Decodes a JSON array into typed records.
///
/// A payload that is not an array is rejected outright. Elements with
/// missing or mistyped fields are dropped one by one, so a single bad record
/// does not hide the rest of the listing.
fn decode_list<T>(url: &str, payload: Value) -> Result<Vec<T>, Error>
where
	T: DeserializeOwned,
{
	let Value::Array(items) = payload else {
		return Err(Error::Malformed {
			url: url.to_owned(),
			reason: "expected a JSON array".into(),
		});
	};

	Ok(items
		.into_iter()
		.enumerate()
		.filter_map(|(index, item)| match serde_json::from_value(item) {
			Ok(record) => Some(record),
			Err(error) => {
				tracing::warn!(%url, index, %error, "dropping malformed record");
				None
			}
		})
		.collect())
}

#[cfg(test)]
mod test {
	use axum::{extract::Path, routing::get, Json, Router};
	use serde_json::json;

	use super::*;

	/// Serves a tiny JSONPlaceholder lookalike on a random local port.
	async fn serve(router: Router) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let address = listener.local_addr().unwrap();

		tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

		format!("http://{address}")
	}

	fn upstream() -> Router {
		Router::new()
			.route(
				"/posts",
				get(|| async {
					Json(json!([
						{ "id": 1, "userId": 7, "title": "first", "body": "hello" },
						{ "id": 2, "userId": 7, "title": "missing body" },
						{ "id": "3", "userId": 7, "title": "bad id", "body": "x" },
						{ "id": 4, "userId": 8, "title": "fourth", "body": "bye", "extra": true },
					]))
				}),
			)
			.route(
				"/posts/:id/comments",
				get(|Path(id): Path<i64>| async move {
					Json(json!([
						{ "id": 10, "postId": id, "name": "n", "email": "a@b.c", "body": "nice" },
					]))
				}),
			)
	}

	#[tokio::test]
	async fn test_list_posts_keeps_well_formed_records() {
		let base = serve(upstream()).await;
		let source = HttpSource::new(&format!("{base}/")).unwrap();

		let posts = source.list_posts().await.unwrap();

		assert_eq!(
			posts,
			vec![
				PostRecord {
					id: 1,
					user_id: 7,
					title: "first".into(),
					body: "hello".into(),
				},
				PostRecord {
					id: 4,
					user_id: 8,
					title: "fourth".into(),
					body: "bye".into(),
				},
			]
		);
	}

	#[tokio::test]
	async fn test_list_comments_for_post() {
		let base = serve(upstream()).await;
		let source = HttpSource::new(&base).unwrap();

		let comments = source.list_comments(4).await.unwrap();

		assert_eq!(comments.len(), 1);
		assert_eq!(comments[0].id, 10);
		assert_eq!(comments[0].post_id, 4);
	}

	#[tokio::test]
	async fn test_non_success_status_is_unavailable() {
		let base = serve(Router::new()).await;
		let source = HttpSource::new(&base).unwrap();

		let error = source.list_posts().await.unwrap_err();

		assert!(matches!(
			error,
			Error::Status {
				status: StatusCode::NOT_FOUND,
				..
			}
		));
	}

	#[tokio::test]
	async fn test_unreachable_source_is_unavailable() {
		// bind and immediately drop a listener so the port is closed
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let address = listener.local_addr().unwrap();
		drop(listener);

		let source = HttpSource::new(&format!("http://{address}")).unwrap();

		assert!(matches!(
			source.list_comments(1).await,
			Err(Error::Unavailable(..))
		));
	}

	#[test]
	fn test_non_array_payload_is_malformed() {
		let result = decode_list::<PostRecord>("http://source/posts", json!({ "id": 1 }));

		assert!(matches!(result, Err(Error::Malformed { .. })));
	}
}
