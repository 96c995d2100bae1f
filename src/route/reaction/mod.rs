use axum::{http::StatusCode, routing::get, Router};

use crate::{
	error::{self, Message},
	AppState,
};

pub mod ledger;
pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	Router::new().route("/like/:id/:action", get(route::react))
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

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use crate::test::*;

	#[tokio::test]
	async fn test_react_flow() {
		let database = pool().await;
		let author = insert_user(&database, "writer", "writer-pw", Role::Author).await;
		let reader = insert_user(&database, "reader", "reader-pw", Role::Reader).await;
		let post = insert_post(&database, &author, "First").await;
		let app = app(state(database.clone()));

		let response = app.get(&format!("/like/{post}/like")).await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/login");

		login(&app, "reader", "reader-pw").await;

		let response = app.get(&format!("/like/{post}/like")).await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/");

		let response = app.get(&format!("/like/{post}/dislike")).await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

		let rows: Vec<(i64, String)> =
			sqlx::query_as("SELECT user_id, value FROM post_like WHERE post_id = ?")
				.bind(post)
				.fetch_all(&database)
				.await
				.unwrap();

		assert_eq!(rows, vec![(reader.id, "dislike".to_string())]);

		let listing = app.get("/").await.json::<Value>();

		assert_eq!(listing["posts"][0]["likes"], 0);
		assert_eq!(listing["posts"][0]["dislikes"], 1);
	}

	#[tokio::test]
	async fn test_rejects_unknown_values_and_posts() {
		let database = pool().await;
		let author = insert_user(&database, "writer", "writer-pw", Role::Author).await;
		let post = insert_post(&database, &author, "First").await;
		let app = app(state(database.clone()));

		login(&app, "writer", "writer-pw").await;

		let response = app.get(&format!("/like/{post}/love")).await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

		let response = app.get("/like/999/like").await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		assert_eq!(
			count(&database, "SELECT COUNT(*) FROM post_like WHERE post_id = ?", post).await,
			0
		);
	}
}
