//! Demonstrates plugging a custom transport and a file-backed token store into the gateway.
//!
//! 1. Implement [`GatewayHttpClient`] so the transport returns a buffered [`ApiResponse`] for
//!    every status code and reports only connection-level failures as [`TransportError`].
//! 2. Open a [`FileStore`] so the session survives process restarts.
//! 3. Pass both to [`Gateway::with_http_client`] and issue requests; an expired access token is
//!    refreshed once and the request replayed.
//! 4. Point the same store at an unreachable transport to see transport errors pass through.

// std
use std::{
	env,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use color_eyre::Result;
// self
use auth_gateway::{
	auth::{Credentials, TokenKey},
	config::GatewayConfig,
	error::TransportError,
	gateway::Gateway,
	http::{GatewayHttpClient, HttpRequest, TransportFuture},
	http_types::{HeaderMap, StatusCode, header::AUTHORIZATION},
	navigate::LogNavigator,
	request::ApiResponse,
	store::{FileStore, TokenStore},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let path = env::temp_dir().join("auth_gateway_custom_transport_demo.json");
	let file_store = FileStore::open(&path)?;
	let store: Arc<dyn TokenStore> = Arc::new(file_store.clone());
	let config = GatewayConfig::builder(Url::parse("https://donasi.example.com/api")?).build()?;
	let backend = Arc::new(CannedBackend::new("access-fresh"));
	let gateway: Gateway<CannedBackend> = Gateway::with_http_client(
		config.clone(),
		Arc::clone(&backend),
		Arc::clone(&store),
		Arc::new(LogNavigator),
	);

	gateway.sign_in(Credentials::new("access-stale", "refresh-demo")).await?;

	let response = gateway.get("/donations").await?;

	println!("Backend answered {} with `{}`.", response.status(), response.text());
	println!(
		"Refresh calls: {}. Replays: {}.",
		backend.refresh_calls.load(Ordering::SeqCst),
		gateway.metrics().replays(),
	);

	let reopened = FileStore::open(file_store.path())?;
	let persisted = reopened.load(TokenKey::AccessToken).await?;

	println!(
		"Access token persisted to {}: {}.",
		file_store.path().display(),
		persisted.as_ref().map(|secret| secret.expose()).unwrap_or("<none>"),
	);

	let offline: Gateway<OfflineBackend> = Gateway::with_http_client(
		config,
		OfflineBackend { host: "donasi.example.com" },
		store,
		Arc::new(LogNavigator),
	);

	match offline.get("/donations").await {
		Ok(_) => println!("Offline transport unexpectedly succeeded."),
		Err(e) => println!("Transport error returned without a refresh: {e}."),
	}

	gateway.sign_out().await?;

	Ok(())
}

/// Backend stand-in: accepts one access token and issues it from the refresh endpoint.
struct CannedBackend {
	accepted: &'static str,
	refresh_calls: AtomicUsize,
}
impl CannedBackend {
	fn new(accepted: &'static str) -> Self {
		Self { accepted, refresh_calls: AtomicUsize::new(0) }
	}

	fn respond(status: StatusCode, body: String) -> ApiResponse {
		ApiResponse::new(status, HeaderMap::new(), body.into_bytes())
	}
}
impl GatewayHttpClient for CannedBackend {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			if request.url.path().ends_with("/user/refresh-token") {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				return Ok(Self::respond(
					StatusCode::OK,
					format!("{{\"access_token\":\"{}\"}}", self.accepted),
				));
			}

			let expected = format!("Bearer {}", self.accepted);
			let authorized = request
				.headers
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.is_some_and(|value| value == expected);

			if authorized {
				Ok(Self::respond(StatusCode::OK, format!("[{{\"path\":\"{}\"}}]", request.url.path())))
			} else {
				Ok(Self::respond(StatusCode::UNAUTHORIZED, "token expired".into()))
			}
		})
	}
}

#[derive(Debug)]
struct DnsFailure {
	host: &'static str,
}
impl Display for DnsFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "DNS lookup failed for {}", self.host)
	}
}
impl StdError for DnsFailure {}

struct OfflineBackend {
	host: &'static str,
}
impl GatewayHttpClient for OfflineBackend {
	fn execute(&self, _request: HttpRequest) -> TransportFuture<'_> {
		let host = self.host;

		Box::pin(async move { Err(TransportError::network(DnsFailure { host })) })
	}
}
