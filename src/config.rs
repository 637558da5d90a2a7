use std::time::Duration;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Env(#[from] envy::Error),
	#[error("{0}")]
	Invalid(#[from] validator::ValidationErrors),
}

fn default_source_base_url() -> String {
	"https://jsonplaceholder.typicode.com".into()
}

fn default_fetch_interval_seconds() -> u64 {
	60
}

fn default_max_posts_per_fetch() -> usize {
	10
}

fn default_random_date_range_days() -> i64 {
	365
}

fn default_comment_date_range_days() -> i64 {
	30
}

fn default_port() -> u16 {
	3000
}

fn default_log_level() -> String {
	"info".into()
}

fn yes() -> bool {
	true
}

/// Service configuration, read once from the environment at startup.
///
/// Every field maps to the upper-cased environment variable of the same name,
/// so `fetch_interval_seconds` is read from `FETCH_INTERVAL_SECONDS`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
	/// Connection string of the document store.
	pub database_url: String,
	/// Overrides the database named in `database_url`.
	#[serde(default)]
	pub database_name: Option<String>,
	/// Base URL of the external posts API.
	#[serde(default = "default_source_base_url")]
	pub source_base_url: String,
	#[serde(default = "default_fetch_interval_seconds")]
	#[validate(range(min = 1))]
	pub fetch_interval_seconds: u64,
	/// Upper bound on new posts stored by a single fetch cycle.
	#[serde(default = "default_max_posts_per_fetch")]
	#[validate(range(min = 1))]
	pub max_posts_per_fetch: usize,
	/// How far back synthesized post dates may reach.
	#[serde(default = "default_random_date_range_days")]
	#[validate(range(min = 1, max = 36500))]
	pub random_date_range_days: i64,
	/// How long after its post a synthesized comment date may fall.
	#[serde(default = "default_comment_date_range_days")]
	#[validate(range(min = 1, max = 36500))]
	pub comment_date_range_days: i64,
	/// Whether the background fetcher starts together with the server.
	#[serde(default = "yes")]
	pub fetcher_autostart: bool,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

impl Config {
	/// Loads `.env` (if present), reads the configuration from the environment
	/// and checks that the intervals and ranges are usable.
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		Self::from_vars(std::env::vars())
	}

	fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, Error> {
		let config = envy::from_iter::<_, Self>(vars)?;

		config.validate()?;
		Ok(config)
	}

	pub fn fetch_interval(&self) -> Duration {
		Duration::from_secs(self.fetch_interval_seconds)
	}

	/// The configured log level, falling back to `INFO` when it cannot be parsed.
	pub fn level_filter(&self) -> LevelFilter {
		self.log_level.parse().unwrap_or(LevelFilter::INFO)
	}
}
