use std::{
	collections::{BTreeMap, HashSet},
	sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{check_range, search_needle, Error, PostStore, Result};
use crate::model::{Comment, CommentSearch, DateRange, Post};

/// In-process [`PostStore`] with the same uniqueness and lookup semantics as
/// the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
	posts: Mutex<BTreeMap<i64, Post>>,
}

impl MemoryStore {
	pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
		Self {
			posts: Mutex::new(posts.into_iter().map(|post| (post.post_id, post)).collect()),
		}
	}

	fn posts(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, Post>> {
		self.posts.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
	}
}

#[async_trait]
impl PostStore for MemoryStore {
	async fn ping(&self) -> Result<()> {
		Ok(())
	}

	async fn disconnect(&self) {}

	async fn existing_identities(&self) -> Result<HashSet<i64>> {
		Ok(self.posts().keys().copied().collect())
	}

	async fn insert_post(&self, post: &Post) -> Result<()> {
		let mut posts = self.posts();

		if posts.contains_key(&post.post_id) {
			return Err(Error::DuplicateKey(post.post_id));
		}

		posts.insert(post.post_id, post.clone());
		Ok(())
	}

	async fn update_post_body(&self, post_id: i64, body: &str, now: DateTime<Utc>) -> Result<bool> {
		let mut posts = self.posts();
		let Some(post) = posts.get_mut(&post_id) else {
			return Ok(false);
		};

		body.clone_into(&mut post.body);
		post.updated_at = Some(now);

		Ok(true)
	}

	async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
		Ok(self.posts().get(&post_id).cloned())
	}

	async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
		Ok(self
			.posts()
			.values()
			.flat_map(|post| &post.comments)
			.find(|comment| comment.comment_id == comment_id)
			.cloned())
	}

	async fn search_comments(&self, query: &str, limit: usize) -> Result<CommentSearch> {
		let needle = search_needle(query)?.to_lowercase();
		let posts = self.posts();

		let matches = posts
			.values()
			.flat_map(|post| &post.comments)
			.filter(|comment| comment.body.to_lowercase().contains(&needle))
			.collect::<Vec<_>>();

		Ok(CommentSearch {
			total_count: matches.len() as u64,
			comments: matches.into_iter().take(limit).cloned().collect(),
		})
	}

	async fn count_posts(&self, range: DateRange) -> Result<u64> {
		check_range(&range)?;

		Ok(self
			.posts()
			.values()
			.filter(|post| range.contains(post.created_at))
			.count() as u64)
	}

	async fn all_posts(&self) -> Result<Vec<Post>> {
		Ok(self.posts().values().cloned().collect())
	}

	async fn clear(&self) -> Result<u64> {
		let mut posts = self.posts();
		let count = posts.len() as u64;

		posts.clear();
		Ok(count)
	}
}

#[cfg(test)]
mod test {
	use chrono::Duration;
	use uuid::Uuid;

	use super::*;

	fn comment(comment_id: i64, post_id: i64, body: &str) -> Comment {
		Comment {
			comment_id,
			post_id,
			name: "name".into(),
			email: "someone@example.com".into(),
			body: body.into(),
			created_at: Utc::now(),
		}
	}

	fn post(post_id: i64, created_at: DateTime<Utc>, comments: Vec<Comment>) -> Post {
		Post {
			id: Uuid::new_v4(),
			post_id,
			user_id: 1,
			title: format!("post {post_id}"),
			body: "body".into(),
			created_at,
			fetched_at: Utc::now(),
			updated_at: None,
			comments,
		}
	}

	#[tokio::test]
	async fn test_search_is_case_insensitive_and_counts_past_limit() {
		let now = Utc::now();
		let store = MemoryStore::with_posts([
			post(
				1,
				now,
				vec![
					comment(1, 1, "this is spam"),
					comment(2, 1, "a real comment"),
					comment(3, 1, "More Spam here"),
				],
			),
			post(2, now, vec![comment(4, 2, "SPAMMY")]),
		]);

		let search = store.search_comments("SPAM", 2).await.unwrap();

		assert_eq!(search.total_count, 3);
		assert_eq!(
			search
				.comments
				.iter()
				.map(|comment| comment.comment_id)
				.collect::<Vec<_>>(),
			vec![1, 3]
		);
	}

	#[tokio::test]
	async fn test_search_keeps_surrounding_whitespace() {
		let store = MemoryStore::with_posts([post(
			1,
			Utc::now(),
			vec![comment(1, 1, "spam at the start"), comment(2, 1, "more spam")],
		)]);

		let search = store.search_comments(" spam", 10).await.unwrap();

		assert_eq!(search.total_count, 1);
		assert_eq!(search.comments[0].comment_id, 2);
		assert_eq!(store.search_comments("spam", 10).await.unwrap().total_count, 2);
	}

	#[tokio::test]
	async fn test_blank_search_is_invalid() {
		let store = MemoryStore::default();

		assert!(matches!(
			store.search_comments("   ", 10).await,
			Err(Error::InvalidArgument(..))
		));
	}

	#[tokio::test]
	async fn test_count_posts_in_range() {
		let now = Utc::now();
		let store = MemoryStore::with_posts([
			post(1, now - Duration::days(10), Vec::new()),
			post(2, now - Duration::days(5), Vec::new()),
			post(3, now, Vec::new()),
		]);

		let range = DateRange {
			start: Some(now - Duration::days(6)),
			end: Some(now),
		};

		assert_eq!(store.count_posts(range).await.unwrap(), 2);
		assert_eq!(store.count_posts(DateRange::default()).await.unwrap(), 3);
		assert!(matches!(
			store
				.count_posts(DateRange {
					start: range.end,
					end: range.start,
				})
				.await,
			Err(Error::InvalidArgument(..))
		));
	}

	#[tokio::test]
	async fn test_insert_rejects_duplicate_identity() {
		let store = MemoryStore::default();

		store.insert_post(&post(1, Utc::now(), Vec::new())).await.unwrap();

		assert!(matches!(
			store.insert_post(&post(1, Utc::now(), Vec::new())).await,
			Err(Error::DuplicateKey(1))
		));
		assert_eq!(store.all_posts().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_update_body_and_find_comment() {
		let store = MemoryStore::with_posts([post(1, Utc::now(), vec![comment(7, 1, "hi")])]);
		let now = Utc::now();

		assert!(store.update_post_body(1, "edited", now).await.unwrap());
		assert!(!store.update_post_body(2, "edited", now).await.unwrap());

		let post = store.find_post(1).await.unwrap().unwrap();
		assert_eq!(post.body, "edited");
		assert_eq!(post.updated_at, Some(now));

		assert_eq!(store.find_comment(7).await.unwrap().unwrap().post_id, 1);
		assert_eq!(store.find_comment(8).await.unwrap(), None);
		assert_eq!(store.clear().await.unwrap(), 1);
		assert!(store.existing_identities().await.unwrap().is_empty());
	}
}
