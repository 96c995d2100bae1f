//! Authorization checks run before a handler proceeds.
//!
//! Authentication is always checked first; role and ownership checks only
//! ever see an authenticated user.

use std::marker::PhantomData;

use axum::{
	extract::{FromRef, FromRequestParts},
	http::{request, StatusCode},
	response::{IntoResponse, Redirect, Response},
};

use crate::{
	error::{self, Message},
	extract::Session,
	model::{Role, User},
	session::SessionStore,
};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, thiserror::Error)]
pub enum Rejection {
	#[error("authentication required")]
	Unauthenticated,
	#[error("forbidden")]
	Forbidden,
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

impl IntoResponse for Rejection {
	fn into_response(self) -> Response {
		match self {
			Self::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
			Self::Forbidden => error::respond(
				StatusCode::FORBIDDEN,
				Message::new("forbidden").into_vec(),
			),
			Self::Database(error) => error::database_response(&error),
		}
	}
}

/// A set of roles allowed through a [`RequireRole`] guard.
pub trait RoleSet: 'static {
	const ALLOWED: &'static [Role];
}

/// Roles that may publish posts.
pub struct Publishers;

impl RoleSet for Publishers {
	const ALLOWED: &'static [Role] = &[Role::Admin, Role::Author];
}

/// Roles that may delete posts and manage the roster.
pub struct Admins;

impl RoleSet for Admins {
	const ALLOWED: &'static [Role] = &[Role::Admin];
}

pub fn require_authenticated<T>(identity: Option<T>) -> Result<T, Rejection> {
	identity.ok_or(Rejection::Unauthenticated)
}

pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), Rejection> {
	if allowed.contains(&user.role) {
		Ok(())
	} else {
		Err(Rejection::Forbidden)
	}
}

/// Passes for admins and for the author of the resource.
pub fn require_owner_or_admin(user: &User, author_id: i64) -> Result<(), Rejection> {
	if user.role == Role::Admin || user.id == author_id {
		Ok(())
	} else {
		Err(Rejection::Forbidden)
	}
}

/// Extracts the session and checks that its user has one of the roles in `R`.
///
/// Anonymous requests are redirected to the login page, authenticated
/// users without a matching role receive a `403`.
///
/// ```rust
/// async fn route(guard: RequireRole<Admins>) {
///   println!("{:?}", guard.session.user);
/// }
/// ```
pub struct RequireRole<R> {
	pub session: Session,
	roles: PhantomData<fn() -> R>,
}

#[axum::async_trait]
impl<R, S> FromRequestParts<S> for RequireRole<R>
where
	R: RoleSet,
	SessionStore: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session = Session::from_request_parts(parts, state).await?;

		require_role(&session.user, R::ALLOWED)?;

		Ok(Self {
			session,
			roles: PhantomData,
		})
	}
}
