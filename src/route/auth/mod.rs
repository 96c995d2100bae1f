use axum::{
	http::StatusCode,
	routing::{get, post},
	Router,
};
use tower_governor::GovernorLayer;

use crate::{error, ratelimit, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information. Unknown usernames and wrong passwords share
/// [`Error::InvalidCredentials`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid credentials")]
	InvalidCredentials,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes(login_limit: Option<ratelimit::Config>) -> Router<AppState> {
	use route::*;

	let login_route = match login_limit {
		Some(config) => post(login).layer(GovernorLayer { config }),
		None => post(login),
	};

	Router::new()
		.route("/login", login_route)
		.route("/logout", get(logout))
		.route("/me", get(get_me))
		.route("/change-password", post(change_password))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use crate::test::*;

	#[tokio::test]
	async fn test_login_flow() {
		let database = pool().await;
		insert_user(&database, "john", "hunter2hunter", Role::Reader).await;
		let app = app(state(database));

		let response = app.get("/me").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/login");

		let response = app
			.post("/login")
			.form(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/");

		let response = app.get("/me").await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["user"]["username"], "john");
		assert_eq!(body["user"]["role"], "reader");
		assert!(body["user"].get("password").is_none());
		assert_eq!(body["messages"][0]["message"], "Welcome, john!");

		let response = app.get("/").await;

		assert_eq!(response.json::<Value>()["messages"], json!([]));
	}

	#[tokio::test]
	async fn test_failures_are_indistinguishable() {
		let database = pool().await;
		insert_user(&database, "john", "hunter2hunter", Role::Reader).await;
		let app = app(state(database));

		let unknown = app
			.post("/login")
			.form(&json!({ "username": "jane", "password": "hunter2hunter" }))
			.await;
		let wrong = app
			.post("/login")
			.form(&json!({ "username": "john", "password": "hunter3hunter" }))
			.await;

		assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(unknown.text(), wrong.text());
		assert_eq!(
			wrong.json::<Value>()["errors"][0]["content"],
			"Invalid credentials"
		);

		assert_eq!(app.get("/me").await.status_code(), StatusCode::SEE_OTHER);
	}

	#[tokio::test]
	async fn test_logout_clears_identity() {
		let database = pool().await;
		insert_user(&database, "john", "pw", Role::Author).await;
		let app = app(state(database.clone()));

		login(&app, "john", "pw").await;
		assert_eq!(app.get("/me").await.status_code(), 200);

		let response = app.get("/logout").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(app.get("/me").await.status_code(), StatusCode::SEE_OTHER);

		let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session")
			.fetch_one(&database)
			.await
			.unwrap();

		assert_eq!(sessions, 0);
	}

	#[tokio::test]
	async fn test_login_again_replaces_session() {
		let database = pool().await;
		insert_user(&database, "john", "pw", Role::Reader).await;
		let app = app(state(database.clone()));
		let sessions = "SELECT COUNT(*) FROM session WHERE ? > 0";

		for _ in 0..5 {
			login(&app, "john", "pw").await;
		}

		assert_eq!(count(&database, sessions, 1).await, 1);
		assert_eq!(app.get("/me").await.status_code(), 200);

		app.get("/logout").await;

		assert_eq!(count(&database, sessions, 1).await, 0);
	}

	#[tokio::test]
	async fn test_argon2_unknown_user() {
		let database = pool().await;
		let app = app(crate::State::new(
			database.clone(),
			crate::hash::Hasher::new(SECRET, crate::hash::Scheme::Argon2),
			crate::route::admin::roster::DuplicatePolicy::Reject,
			crate::Export::default(),
		));

		let response = app
			.post("/login")
			.form(&json!({ "username": "nobody", "password": "pw" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"Invalid credentials"
		);
	}

	#[tokio::test]
	async fn test_change_password() {
		let database = pool().await;
		let user = insert_user(&database, "john", "old-password", Role::Reader).await;
		let app = app(state(database.clone()));

		login(&app, "john", "old-password").await;

		let response = app
			.post("/change-password")
			.form(&json!({ "old_password": "not-it", "new_password": "new-password" }))
			.await;

		assert_eq!(response.header("location"), "/me");
		assert_eq!(
			messages(&app, "/me").await.last().unwrap(),
			"Old password is incorrect."
		);

		let response = app
			.post("/change-password")
			.form(&json!({ "old_password": "old-password", "new_password": "" }))
			.await;

		assert_eq!(response.header("location"), "/me");
		assert_eq!(
			messages(&app, "/me").await,
			vec!["New password cannot be empty."]
		);

		let response = app
			.post("/change-password")
			.form(&json!({ "old_password": "old-password", "new_password": "new-password" }))
			.await;

		assert_eq!(response.header("location"), "/");

		let stored: String = sqlx::query_scalar(r#"SELECT password FROM "user" WHERE id = ?"#)
			.bind(user.id)
			.fetch_one(&database)
			.await
			.unwrap();

		assert_eq!(stored, hasher().derive("new-password", user.id).unwrap());

		app.get("/logout").await;

		assert_eq!(
			app.post("/login")
				.form(&json!({ "username": "john", "password": "old-password" }))
				.await
				.status_code(),
			StatusCode::UNAUTHORIZED
		);
		login(&app, "john", "new-password").await;
	}
}
