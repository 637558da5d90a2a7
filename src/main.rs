#![warn(clippy::pedantic)]

mod config;
mod date;
mod error;
mod extract;
mod ingest;
mod model;
mod openapi;
mod route;
mod scheduler;
mod source;
mod store;
mod trace;

use std::{process::ExitCode, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::Extension;
use tower_http::trace::TraceLayer;

use crate::{
	config::Config,
	ingest::{Ingestor, Options},
	scheduler::Scheduler,
	source::HttpSource,
	store::{PgStore, Store},
};

pub type AppState = State;
pub type Fetcher = Arc<Scheduler<Ingestor>>;

/// The shared application state.
///
/// The store is shared by the request handlers and the background fetcher,
/// which both go through the same connection pool.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: Store,
	pub fetcher: Fetcher,
}

/// Builds the full application router, including the API documentation.
pub fn router(state: AppState) -> axum::Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest_api_service(
			"/posts",
			route::post::routes()
				.merge(route::comment::routes())
				.with_state(state.clone()),
		)
		.nest_api_service("/fetcher", route::fetcher::routes().with_state(state.clone()))
		.nest_api_service("/store", route::store::routes().with_state(state))
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> ExitCode {
	let config = match Config::from_env() {
		Ok(config) => config,
		Err(error) => {
			eprintln!("invalid configuration: {error}");
			return ExitCode::FAILURE;
		}
	};

	trace::init_tracing_subscriber(config.level_filter());

	let store: Store =
		match PgStore::connect(&config.database_url, config.database_name.as_deref()).await {
			Ok(store) => Arc::new(store),
			Err(error) => {
				tracing::error!(%error, "failed to connect to the document store");
				return ExitCode::FAILURE;
			}
		};

	let source = match HttpSource::new(&config.source_base_url) {
		Ok(source) => Arc::new(source),
		Err(error) => {
			tracing::error!(%error, "failed to build the external source client");
			return ExitCode::FAILURE;
		}
	};

	let ingestor = Ingestor::new(
		source,
		store.clone(),
		Options {
			max_posts_per_fetch: config.max_posts_per_fetch,
			date_range_days: config.random_date_range_days,
			comment_range_days: config.comment_date_range_days,
		},
	);

	let fetcher = Arc::new(Scheduler::new(Arc::new(ingestor), config.fetch_interval()));

	if config.fetcher_autostart {
		fetcher.start();
	}

	let app = router(State {
		store: store.clone(),
		fetcher: fetcher.clone(),
	});

	let listener = match tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await {
		Ok(listener) => listener,
		Err(error) => {
			tracing::error!(%error, port = config.port, "failed to bind to port");
			return ExitCode::FAILURE;
		}
	};

	tracing::info!("listening on port {}", config.port);

	let served = axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await;

	if let Err(error) = served {
		tracing::error!(%error, "server error");
	}

	tracing::info!("shutting down");

	fetcher.stop().await;
	store.disconnect().await;

	ExitCode::SUCCESS
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for the shutdown signal");
		std::future::pending::<()>().await;
	}
}

#[cfg(test)]
mod test {
	use std::{
		collections::{HashMap, HashSet},
		sync::{Arc, Mutex},
		time::Duration,
	};

	use async_trait::async_trait;
	use chrono::{DateTime, Utc};
	use reqwest::StatusCode;
	use uuid::Uuid;

	pub use axum_test::TestServer;
	pub use serde_json::json;

	use crate::{
		ingest::{Ingestor, Options},
		model::{Comment, Post},
		scheduler::Scheduler,
		source::{self, CommentRecord, PostRecord, Source},
		store::MemoryStore,
	};

	/// An in-process stand-in for the external source.
	///
	/// Every post gets two comments: `id * 10 + 1`, which mentions spam, and
	/// `id * 10 + 2`, which does not.
	#[derive(Default)]
	pub struct FakeSource {
		pub posts: Vec<PostRecord>,
		pub comments: HashMap<i64, Vec<CommentRecord>>,
		failing: HashSet<i64>,
		unavailable: bool,
		requests: Mutex<Vec<i64>>,
	}

	impl FakeSource {
		pub fn with_posts(ids: impl IntoIterator<Item = i64>) -> Self {
			let mut source = Self::default();

			for id in ids {
				source.posts.push(PostRecord {
					id,
					user_id: id % 3 + 1,
					title: format!("post {id}"),
					body: format!("the body of post {id}"),
				});

				source.comments.insert(
					id,
					vec![
						CommentRecord {
							id: id * 10 + 1,
							post_id: id,
							name: "spammer".into(),
							email: "spammer@example.com".into(),
							body: "Buy SPAM now".into(),
						},
						CommentRecord {
							id: id * 10 + 2,
							post_id: id,
							name: "reader".into(),
							email: "reader@example.com".into(),
							body: "A thoughtful reply".into(),
						},
					],
				);
			}

			source
		}

		/// A source whose post listing always fails.
		pub fn unavailable() -> Self {
			Self {
				unavailable: true,
				..Self::default()
			}
		}

		pub fn failing_comments_for(mut self, post_id: i64) -> Self {
			self.failing.insert(post_id);
			self
		}

		/// The posts whose comments were requested, in order.
		pub fn comment_requests(&self) -> Vec<i64> {
			self.requests.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl Source for FakeSource {
		async fn list_posts(&self) -> Result<Vec<PostRecord>, source::Error> {
			if self.unavailable {
				return Err(source::Error::Status {
					url: "fake://posts".into(),
					status: StatusCode::SERVICE_UNAVAILABLE,
				});
			}

			Ok(self.posts.clone())
		}

		async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, source::Error> {
			self.requests.lock().unwrap().push(post_id);

			if self.failing.contains(&post_id) {
				return Err(source::Error::Status {
					url: format!("fake://posts/{post_id}/comments"),
					status: StatusCode::INTERNAL_SERVER_ERROR,
				});
			}

			Ok(self.comments.get(&post_id).cloned().unwrap_or_default())
		}
	}

	/// A stored post shaped like the ones [`FakeSource`] produces.
	pub fn post_at(post_id: i64, created_at: DateTime<Utc>) -> Post {
		let comment = |offset: i64, body: &str| Comment {
			comment_id: post_id * 10 + offset,
			post_id,
			name: "name".into(),
			email: "someone@example.com".into(),
			body: body.into(),
			created_at: created_at + chrono::Duration::hours(offset),
		};

		Post {
			id: Uuid::new_v4(),
			post_id,
			user_id: 1,
			title: format!("post {post_id}"),
			body: format!("the body of post {post_id}"),
			created_at,
			fetched_at: Utc::now(),
			updated_at: None,
			comments: vec![comment(1, "Buy SPAM now"), comment(2, "A thoughtful reply")],
		}
	}

	pub fn posts(ids: impl IntoIterator<Item = i64>) -> Vec<Post> {
		let now = Utc::now();

		ids.into_iter()
			.map(|id| post_at(id, now - chrono::Duration::days(id)))
			.collect()
	}

	pub fn app(posts: impl IntoIterator<Item = Post>) -> TestServer {
		app_with_source(posts, FakeSource::default())
	}

	pub fn app_with_source(posts: impl IntoIterator<Item = Post>, source: FakeSource) -> TestServer {
		let store = Arc::new(MemoryStore::with_posts(posts));
		let ingestor = Ingestor::new(Arc::new(source), store.clone(), Options::default());
		let fetcher = Arc::new(Scheduler::new(Arc::new(ingestor), Duration::from_secs(60)));

		TestServer::new(crate::router(crate::State { store, fetcher })).unwrap()
	}

	#[tokio::test]
	async fn test_docs_are_served() {
		let app = app([]);

		let response = app.get("/docs/api.json").await;

		assert_eq!(response.status_code(), 200);

		let api = response.json::<serde_json::Value>();

		assert_eq!(api["info"]["title"], "Posts Ingest Open API");
		assert!(api["paths"]["/fetcher/run"].is_object());
		assert_eq!(app.get("/docs").await.status_code(), 200);
	}
}
