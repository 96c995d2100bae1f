use std::{borrow::Cow, fmt};

use axum::{
	extract::rejection::{FormRejection, PathRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;

use crate::guard;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize)]
pub struct Message<'a> {
	/// A short machine-readable code or a human-readable sentence.
	pub content: Cow<'a, str>,
	/// The form field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional structured details.
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

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
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

#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
	pub success: bool,
	pub errors: Vec<Message<'a>>,
}

/// Implemented by the error enum of every route module.
///
/// The messages are presented to the client, so they should not contain
/// sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message<'static>>
	where
		Self: Sized,
	{
		Message::new(self.to_string()).into_vec()
	}
}

/// Error type returned by route handlers.
///
/// `E` is the module-specific error; the other variants are shared by
/// every route. The Display impl is only logged, never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	Route(E),
	#[error(transparent)]
	Denied(#[from] guard::Rejection),
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("form error: {0}")]
	Form(#[from] FormRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

/// Used where no module-specific error exists, such as in extractors.
#[derive(Debug)]
pub enum Never {}

impl fmt::Display for Never {
	fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {}
	}
}

impl std::error::Error for Never {}

impl ErrorShape for Never {
	fn status(&self) -> StatusCode {
		match *self {}
	}
}

pub type ExtractError = RouteError<Never>;

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

/// Whether the error means the store could not be reached at all,
/// as opposed to a failed statement.
pub fn is_unavailable(error: &sqlx::Error) -> bool {
	matches!(
		error,
		sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(..)
	)
}

/// Whether a write referenced a row that does not exist.
pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
	error
		.as_database_error()
		.is_some_and(|error| error.is_foreign_key_violation())
}

pub fn database_response(error: &sqlx::Error) -> Response {
	tracing::error!(%error, "database error");

	if is_unavailable(error) {
		respond(
			StatusCode::SERVICE_UNAVAILABLE,
			Message::new("persistence_unavailable").into_vec(),
		)
	} else {
		respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
	}
}

pub fn respond(status: StatusCode, errors: Vec<Message<'_>>) -> Response {
	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response {
		match self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route error");
				}

				respond(status, error.into_errors())
			}
			Self::Denied(rejection) => rejection.into_response(),
			Self::Validation(errors) => {
				let messages = errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						let field = field.to_string();

						errors
							.iter()
							.map(move |error| Message::new(error.code.clone()).field(field.clone()))
					})
					.collect();

				respond(StatusCode::BAD_REQUEST, messages)
			}
			Self::Form(rejection) => respond(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::Path(rejection) => respond(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::Database(error) => database_response(&error),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_message_builder() {
		let message = Message::new("unknown_post")
			.field("post_id")
			.detail("post", 3);

		let json = serde_json::to_value(&message).unwrap();

		assert_eq!(json["content"], "unknown_post");
		assert_eq!(json["field"], "post_id");
		assert_eq!(json["details"]["post"], 3);
	}

	#[test]
	fn test_unavailable() {
		assert!(is_unavailable(&sqlx::Error::PoolTimedOut));
		assert!(!is_unavailable(&sqlx::Error::RowNotFound));
	}
}
