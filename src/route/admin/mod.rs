use axum::{http::StatusCode, routing::get, Router};

use crate::{
	error::{self, Message},
	AppState,
};

pub mod model;
pub mod roster;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("username {0} is already taken")]
	UsernameTaken(String),
	#[error("failed to derive password digest: {0}")]
	Argon(argon2::Error),
	#[error("no database file to export")]
	NoDatabaseFile,
	#[error("failed to read database file: {0}")]
	Export(std::io::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/users", get(get_users).post(update_users))
		.route("/database", get(export_database))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UsernameTaken(..) => StatusCode::CONFLICT,
			Self::NoDatabaseFile => StatusCode::NOT_FOUND,
			Self::Argon(..) | Self::Export(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<Message<'static>> {
		match self {
			Self::UsernameTaken(username) => Message::new("username_taken")
				.field("username")
				.detail("username", username)
				.into_vec(),
			Self::NoDatabaseFile => Message::new("no_database_file").into_vec(),
			Self::Argon(..) | Self::Export(..) => Vec::new(),
		}
	}
}
