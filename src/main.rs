#![warn(clippy::pedantic)]

mod config;
mod database;
mod error;
mod extract;
mod flash;
mod guard;
mod hash;
mod model;
mod ratelimit;
mod route;
mod session;

use std::{net::SocketAddr, path::PathBuf};

use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::Config, hash::Hasher, route::admin::roster::DuplicatePolicy, session::SessionStore};

pub type Database = sqlx::SqlitePool;
pub type AppState = State;

/// Location of the database file offered by the admin export, if any.
#[derive(Debug, Clone, Default)]
pub struct Export(pub Option<PathBuf>);

/// The shared application state.
///
/// Every dependency a handler needs is in here, including the session store
/// and the hasher carrying the salt secret. Nothing is read from globals.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Hasher,
	pub sessions: SessionStore,
	pub duplicate_username: DuplicatePolicy,
	pub export: Export,
}

impl State {
	pub fn new(
		database: Database,
		hasher: Hasher,
		duplicate_username: DuplicatePolicy,
		export: Export,
	) -> Self {
		Self {
			sessions: SessionStore::new(database.clone()),
			database,
			hasher,
			duplicate_username,
			export,
		}
	}
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.init();

	let config = Config::from_env().expect("invalid configuration");

	let state = State::new(
		database::connect(&config.database_url)
			.await
			.expect("failed to connect to database"),
		Hasher::new(config.salt_secret.as_str(), config.password_scheme),
		config.duplicate_username,
		Export(database::file_path(&config.database_url)),
	);

	if state.hasher.scheme() == hash::Scheme::Legacy {
		tracing::warn!("using the legacy md5 password scheme");
	}

	let default_limit = ratelimit::default();
	let login_limit = ratelimit::secure();

	ratelimit::cleanup_old_limits(&[&default_limit, &login_limit]);

	let app = route::routes(Some(login_limit))
		.layer(GovernorLayer {
			config: default_limit,
		})
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id()),
		)
		.with_state(state);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", config.port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await
	.expect("server error");
}
