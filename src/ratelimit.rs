use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	http::StatusCode,
	response::Response,
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::{self, Message};

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// Limits applied to every route.
pub fn default() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("default rate limit is valid"),
	)
}

/// Limits applied to the login route, to slow down password guessing.
pub fn secure() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(2)
			.burst_size(5)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("login rate limit is valid"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	let status = match error {
		GovernorError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
		GovernorError::UnableToExtractKey => {
			tracing::warn!("rate limiter could not determine the peer address");

			StatusCode::INTERNAL_SERVER_ERROR
		}
		GovernorError::Other { code, .. } => code,
	};

	error::respond(status, Message::new("too_many_requests").into_vec())
}

pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}
