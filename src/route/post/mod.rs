use axum::{
	http::StatusCode,
	routing::{get, post},
	Router,
};

use crate::{
	error::{self, Message},
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/", get(get_posts))
		.route("/posts", post(create_post))
		.route("/posts/:id", get(get_post))
		.route("/posts/:id/edit", post(update_post))
		.route("/posts/:id/delete", post(delete_post))
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
