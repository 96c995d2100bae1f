//! One-shot messages carried across a redirect in a cookie.

use std::convert::Infallible;

use axum::{
	extract::FromRequestParts,
	http::{header, request, HeaderMap, HeaderValue},
	response::{IntoResponseParts, ResponseParts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

pub const COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	Success,
	Info,
	Warning,
	Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
	pub level: Level,
	pub message: String,
}

impl Flash {
	pub fn new(level: Level, message: impl Into<String>) -> Self {
		Self {
			level,
			message: message.into(),
		}
	}
}

pub fn encode(messages: &[Flash]) -> String {
	URL_SAFE_NO_PAD.encode(serde_json::to_vec(messages).unwrap_or_default())
}

/// Decodes a cookie value. Anything unreadable is treated as no messages.
pub fn decode(value: &str) -> Vec<Flash> {
	URL_SAFE_NO_PAD
		.decode(value)
		.ok()
		.and_then(|bytes| serde_json::from_slice(&bytes).ok())
		.unwrap_or_default()
}

fn read(headers: &HeaderMap) -> Vec<Flash> {
	headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == COOKIE_NAME)
		.map(|cookie| decode(cookie.value()))
		.unwrap_or_default()
}

/// Pending flash messages for the current client.
///
/// Messages pushed here are written back to the cookie when this is part of
/// the response, so they survive the redirect. Views call [`Flashes::take`]
/// to display and clear them.
#[derive(Debug, Default)]
pub struct Flashes {
	pending: Vec<Flash>,
	changed: bool,
}

impl Flashes {
	pub fn push(&mut self, level: Level, message: impl Into<String>) {
		self.pending.push(Flash::new(level, message));
		self.changed = true;
	}

	pub fn extend(&mut self, messages: impl IntoIterator<Item = Flash>) {
		let before = self.pending.len();

		self.pending.extend(messages);
		self.changed |= self.pending.len() != before;
	}

	pub fn take(&mut self) -> Vec<Flash> {
		self.changed |= !self.pending.is_empty();

		std::mem::take(&mut self.pending)
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Flashes
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut request::Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self {
			pending: read(&parts.headers),
			changed: false,
		})
	}
}

impl IntoResponseParts for Flashes {
	type Error = Infallible;

	fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
		if !self.changed {
			return Ok(res);
		}

		let cookie = if self.pending.is_empty() {
			cookie::Cookie::build(COOKIE_NAME)
				.path("/")
				.max_age(cookie::time::Duration::ZERO)
				.build()
		} else {
			cookie::Cookie::build((COOKIE_NAME, encode(&self.pending)))
				.path("/")
				.http_only(true)
				.build()
		};

		if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
			res.headers_mut().append(header::SET_COOKIE, value);
		}

		Ok(res)
	}
}
