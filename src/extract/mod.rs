mod session;

pub use session::{MaybeSession, Session};

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request;
use serde::de;

use crate::error::ExtractError;

/// Extractor that deserializes a form-encoded body and validates it.
///
/// T must implement [`serde::de::DeserializeOwned`] and [`validator::Validate`]
/// in order to be used in an extractor.
///
/// ```rust
/// async fn route(Form(input): Form<LoginInput>) {
///   // ...
/// }
/// ```
pub struct Form<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Form<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = ExtractError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Form::<T>::from_request(req, state).await?.0;

		result.validate()?;
		Ok(Self(result))
	}
}

/// Extractor that deserializes path parameters and validates them.
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: de::DeserializeOwned + validator::Validate + Send,
	S: Send + Sync,
{
	type Rejection = ExtractError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Path::<T>::from_request_parts(parts, state)
			.await?
			.0;

		result.validate()?;
		Ok(Self(result))
	}
}
