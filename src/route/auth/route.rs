use axum::{
	extract::State,
	http::header,
	response::{AppendHeaders, IntoResponse, Redirect},
	Json,
};

use crate::{
	extract::{Form, MaybeSession, Session},
	flash::{Flashes, Level},
	model::User,
	route::LISTING_PATH,
	session::{self, SessionStore},
	AppState,
};

use super::{model, Error, RouteError};

const ACCOUNT_PATH: &str = "/me";

/// Logs in, setting the session cookie and redirecting to the listing.
///
/// A session the client already holds is removed first, so logging in
/// again never leaves the old id valid.
pub async fn login(
	State(state): State<AppState>,
	MaybeSession(previous): MaybeSession,
	mut flashes: Flashes,
	Form(auth): Form<model::LoginInput>,
) -> Result<impl IntoResponse, RouteError> {
	let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = ?"#)
		.bind(&auth.username)
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		// Same derivation cost as a real check, so timing does not reveal the username.
		let _ = state.hasher.derive_unsalted(&auth.password);

		tracing::info!(username = %auth.username, "login failed");
		return Err(Error::InvalidCredentials.into());
	};

	if !state
		.hasher
		.verify(&auth.password, user.id, &user.password)
		.map_err(Error::Argon)?
	{
		tracing::info!(user_id = user.id, "login failed");
		return Err(Error::InvalidCredentials.into());
	}

	if let Some(previous) = previous {
		state.sessions.logout(previous.id).await?;
	}

	let session_id = state.sessions.login(user.id).await?;

	tracing::info!(user_id = user.id, "logged in");
	flashes.push(Level::Success, format!("Welcome, {}!", user.username));

	Ok((
		AppendHeaders([(
			header::SET_COOKIE,
			session::create_cookie(session_id).to_string(),
		)]),
		flashes,
		Redirect::to(LISTING_PATH),
	))
}

/// Logs out, removing the session and clearing the cookie.
pub async fn logout(
	State(sessions): State<SessionStore>,
	MaybeSession(session): MaybeSession,
	mut flashes: Flashes,
) -> Result<impl IntoResponse, RouteError> {
	if let Some(session) = session {
		sessions.logout(session.id).await?;

		tracing::info!(user_id = session.user.id, "logged out");
	}

	flashes.push(Level::Info, "You have been logged out.");

	Ok((
		AppendHeaders([(header::SET_COOKIE, session::clear_cookie().to_string())]),
		flashes,
		Redirect::to(LISTING_PATH),
	))
}

/// Returns the authenticated user and any pending messages.
pub async fn get_me(session: Session, mut flashes: Flashes) -> impl IntoResponse {
	let messages = flashes.take();

	(
		flashes,
		Json(model::Me {
			user: session.user,
			messages,
		}),
	)
}

/// Changes the password of the authenticated user.
pub async fn change_password(
	State(state): State<AppState>,
	session: Session,
	mut flashes: Flashes,
	Form(input): Form<model::ChangePasswordInput>,
) -> Result<(Flashes, Redirect), RouteError> {
	let user = session.user;

	if !state
		.hasher
		.verify(&input.old_password, user.id, &user.password)
		.map_err(Error::Argon)?
	{
		flashes.push(Level::Danger, "Old password is incorrect.");
		return Ok((flashes, Redirect::to(ACCOUNT_PATH)));
	}

	if input.new_password.is_empty() {
		flashes.push(Level::Warning, "New password cannot be empty.");
		return Ok((flashes, Redirect::to(ACCOUNT_PATH)));
	}

	let digest = state
		.hasher
		.derive(&input.new_password, user.id)
		.map_err(Error::Argon)?;

	sqlx::query(r#"UPDATE "user" SET password = ? WHERE id = ?"#)
		.bind(digest)
		.bind(user.id)
		.execute(&state.database)
		.await?;

	tracing::info!(user_id = user.id, "password changed");
	flashes.push(Level::Success, "Password changed successfully!");

	Ok((flashes, Redirect::to(LISTING_PATH)))
}
