use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, store};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional context about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
	pub success: bool,
	pub errors: Vec<Message<'a>>,
}

/// How a route-specific error is presented to the client.
///
/// The [`std::fmt::Display`] output of the error is only logged, so it may
/// contain details that the messages leave out.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>>;
}

/// For routes that can only fail with an [`AppError`].
impl ErrorShape for std::convert::Infallible {
	fn status(&self) -> StatusCode {
		match *self {}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match *self {}
	}
}

/// Errors shared by every route: rejected input and store failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

// Not an `ErrorShape`, so that `RouteError<T>` can convert from both.
impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) | Self::Path(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::Store(store::Error::InvalidArgument(..)) => StatusCode::BAD_REQUEST,
			Self::Store(store::Error::DuplicateKey(..)) => StatusCode::CONFLICT,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors
						.iter()
						.map(move |error| Message::new(error.code.clone()).field(field.to_string()))
				})
				.collect(),
			Self::Json(error) => Message::new(error.body_text()).into_vec(),
			Self::Query(error) => Message::new(error.body_text()).into_vec(),
			Self::Path(error) => Message::new(error.body_text()).into_vec(),
			Self::Store(store::Error::InvalidArgument(reason)) => {
				Message::new("invalid_argument").detail("reason", *reason).into_vec()
			}
			Self::Store(store::Error::DuplicateKey(post_id)) => {
				Message::new("duplicate_post").detail("post", *post_id).into_vec()
			}
			Self::Store(..) => Vec::new(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		shape_response(&self, self.status(), self.errors())
	}
}

/// The error type returned by routes, combining the shared [`AppError`]
/// with the route-specific `T`.
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<store::Error> for RouteError<T> {
	fn from(error: store::Error) -> Self {
		Self::App(AppError::Store(error))
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => shape_response(&error, error.status(), error.errors()),
			Self::Route(error) => shape_response(&error, error.status(), error.errors()),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = ErrorResponse<'static>;
}

fn shape_response(
	error: &dyn std::error::Error,
	status: StatusCode,
	errors: Vec<Message<'_>>,
) -> Response<Body> {
	if status.is_server_error() {
		tracing::error!(%error, "request failed");
	} else {
		tracing::debug!(%error, "request rejected");
	}

	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}
