use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::{model::User, Database};

pub const COOKIE_NAME: &str = "session";

/// How long a session stays valid after login, in seconds.
pub const MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Creates a session cookie that expires together with the server-side row
pub fn create_cookie(session_id: Uuid) -> cookie::Cookie<'static> {
	cookie::Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(cookie::SameSite::Lax)
		.path("/")
		.max_age(cookie::time::Duration::seconds(MAX_AGE_SECONDS))
		.into()
}

/// Modifier for SQLite's `datetime('now', ?)` giving the oldest valid `created_at`.
fn cutoff() -> String {
	format!("-{MAX_AGE_SECONDS} seconds")
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Reads the session id from the request cookies.
///
/// A missing or malformed cookie is the same as no session.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
	headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == COOKIE_NAME)
		.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Server-side session storage, backed by the `session` table.
#[derive(Clone)]
pub struct SessionStore {
	database: Database,
}

impl SessionStore {
	pub fn new(database: Database) -> Self {
		Self { database }
	}

	/// Associates a new session with `user_id` and returns its id.
	///
	/// Expired sessions of every user are pruned on the way.
	pub async fn login(&self, user_id: i64) -> Result<Uuid, sqlx::Error> {
		let pruned = self.prune().await?;

		if pruned > 0 {
			tracing::debug!(pruned, "expired sessions removed");
		}

		let session_id = Uuid::new_v4();

		sqlx::query("INSERT INTO session (id, user_id) VALUES (?, ?)")
			.bind(session_id)
			.bind(user_id)
			.execute(&self.database)
			.await?;

		Ok(session_id)
	}

	/// Removes the session entirely.
	pub async fn logout(&self, session_id: Uuid) -> Result<(), sqlx::Error> {
		sqlx::query("DELETE FROM session WHERE id = ?")
			.bind(session_id)
			.execute(&self.database)
			.await?;

		Ok(())
	}

	/// Deletes every session older than [`MAX_AGE_SECONDS`].
	pub async fn prune(&self) -> Result<u64, sqlx::Error> {
		let status = sqlx::query("DELETE FROM session WHERE created_at <= datetime('now', ?)")
			.bind(cutoff())
			.execute(&self.database)
			.await?;

		Ok(status.rows_affected())
	}

	/// Returns the user behind the session, or `None` when the session does
	/// not exist, has expired or its user has since been deleted.
	pub async fn resolve(&self, session_id: Uuid) -> Result<Option<User>, sqlx::Error> {
		sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session
					WHERE id = ? AND created_at > datetime('now', ?)
				)
			"#,
		)
		.bind(session_id)
		.bind(cutoff())
		.fetch_optional(&self.database)
		.await
	}

	/// Resolves an optional session token into the current user.
	pub async fn resolve_current_user(
		&self,
		session_id: Option<Uuid>,
	) -> Result<Option<User>, sqlx::Error> {
		match session_id {
			Some(session_id) => self.resolve(session_id).await,
			None => Ok(None),
		}
	}
}

#[cfg(test)]
mod test {
	use axum::http::HeaderValue;

	use super::*;
	use crate::{model::Role, test::*};

	#[test]
	fn test_session_id_from_cookies() {
		let id = Uuid::new_v4();
		let mut headers = HeaderMap::new();

		assert_eq!(session_id(&headers), None);

		headers.insert(
			header::COOKIE,
			HeaderValue::from_str(&format!("theme=dark; {COOKIE_NAME}={id}")).unwrap(),
		);

		assert_eq!(session_id(&headers), Some(id));

		headers.insert(
			header::COOKIE,
			HeaderValue::from_static("session=not-a-uuid"),
		);

		assert_eq!(session_id(&headers), None);
	}

	#[tokio::test]
	async fn test_login_resolve_logout() {
		let database = pool().await;
		let store = SessionStore::new(database.clone());
		let user = insert_user(&database, "alice", "pw", Role::Reader).await;

		assert!(store.resolve_current_user(None).await.unwrap().is_none());

		let session_id = store.login(user.id).await.unwrap();
		let resolved = store
			.resolve_current_user(Some(session_id))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(resolved.id, user.id);

		store.logout(session_id).await.unwrap();

		assert!(store.resolve(session_id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_expired_session_is_anonymous() {
		let database = pool().await;
		let store = SessionStore::new(database.clone());
		let user = insert_user(&database, "carol", "pw", Role::Reader).await;
		let stale = store.login(user.id).await.unwrap();
		let fresh = store.login(user.id).await.unwrap();

		sqlx::query("UPDATE session SET created_at = datetime('now', '-8 days') WHERE id = ?")
			.bind(stale)
			.execute(&database)
			.await
			.unwrap();

		assert!(store.resolve(stale).await.unwrap().is_none());
		assert!(store.resolve(fresh).await.unwrap().is_some());

		assert_eq!(store.prune().await.unwrap(), 1);

		let remaining: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM session")
			.fetch_all(&database)
			.await
			.unwrap();

		assert_eq!(remaining, vec![fresh]);
	}

	#[test]
	fn test_cookie_expires() {
		let cookie = create_cookie(Uuid::new_v4());

		assert_eq!(
			cookie.max_age(),
			Some(cookie::time::Duration::seconds(MAX_AGE_SECONDS))
		);
	}

	#[tokio::test]
	async fn test_deleted_user_is_anonymous() {
		let database = pool().await;
		let store = SessionStore::new(database.clone());
		let user = insert_user(&database, "bob", "pw", Role::Author).await;
		let session_id = store.login(user.id).await.unwrap();

		sqlx::query(r#"DELETE FROM "user" WHERE id = ?"#)
			.bind(user.id)
			.execute(&database)
			.await
			.unwrap();

		assert!(store.resolve(session_id).await.unwrap().is_none());
		assert!(store.resolve(Uuid::new_v4()).await.unwrap().is_none());
	}
}
