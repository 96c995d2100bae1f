use axum::{
	extract::{FromRef, FromRequestParts},
	http::request,
};
use uuid::Uuid;

use crate::{
	guard::{self, Rejection},
	model::User,
	session::{self, SessionStore},
};

/// An authenticated session and its user.
///
/// Anonymous requests are rejected with [`Rejection::Unauthenticated`],
/// which redirects to the login page.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

/// The current identity, which is `None` for anonymous requests.
///
/// A missing cookie, an unknown session and a session whose user has been
/// deleted all resolve to `None` rather than an error.
#[derive(Debug)]
pub struct MaybeSession(pub Option<Session>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	SessionStore: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session_id = session::session_id(&parts.headers);
		let user = SessionStore::from_ref(state)
			.resolve_current_user(session_id)
			.await?;

		Ok(Self(
			session_id
				.zip(user)
				.map(|(id, user)| Session { id, user }),
		))
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	SessionStore: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;

		guard::require_authenticated(session)
	}
}
