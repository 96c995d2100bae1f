use axum::{http::StatusCode, routing::post, Router};

use crate::{
	error::{self, Message},
	AppState,
};

pub mod log;
pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	Router::new().route("/comment/:id", post(route::add_comment))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<Message<'static>> {
		let Self::UnknownPost(post) = self;

		Message::new("unknown_post").detail("post", post).into_vec()
	}
}
