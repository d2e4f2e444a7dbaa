//! Authenticated gateway: credential attachment, 401 recovery, and request replay.
//!
//! Every request passes through [`Gateway::send`]. The stored access token (if any) is
//! attached as a bearer credential; a 401 on a request that has not been replayed yet
//! hands the request to the single-flight refresh in [`refresh`], after which it is
//! replayed exactly once with the new token. Any other response, and any transport
//! failure, is returned to the caller untouched.

pub mod refresh;

mod metrics;

pub use metrics::GatewayMetrics;

// crates.io
use http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenKey, TokenSecret},
	config::GatewayConfig,
	error::ConfigError,
	gateway::refresh::RefreshGate,
	http::{GatewayHttpClient, HttpRequest},
	navigate::Navigator,
	obs::{self, Operation, OperationSpan, Outcome},
	request::{ApiRequest, ApiResponse, RequestConfig},
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, navigate::LogNavigator};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Issues requests against one backend on behalf of one client session.
///
/// Construct a single instance per session and share it (typically behind an [`Arc`]);
/// the refresh gate lives inside the instance, so separate instances refresh
/// independently.
pub struct Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// HTTP client used for every outbound request, including refresh calls.
	pub http_client: Arc<C>,
	/// Durable storage for the access and refresh tokens.
	pub store: Arc<dyn TokenStore>,
	/// Login redirect invoked when the session cannot be recovered.
	pub navigator: Arc<dyn Navigator>,
	config: GatewayConfig,
	metrics: Arc<GatewayMetrics>,
	refresh_gate: RefreshGate,
}
impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Creates a gateway around a caller-provided transport.
	pub fn with_http_client(
		config: GatewayConfig,
		http_client: impl Into<Arc<C>>,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			navigator,
			config,
			metrics: Default::default(),
			refresh_gate: Default::default(),
		}
	}

	/// Active configuration.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Shared refresh counters.
	pub fn metrics(&self) -> Arc<GatewayMetrics> {
		self.metrics.clone()
	}

	/// Whether a refresh call is currently outstanding.
	pub fn refresh_in_progress(&self) -> bool {
		self.refresh_gate.is_refreshing()
	}

	/// Number of requests currently parked behind the outstanding refresh.
	pub fn queued_requests(&self) -> usize {
		self.refresh_gate.queued()
	}

	/// Issues `method path` with an optional body and per-call overrides.
	pub async fn request(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		config: RequestConfig,
	) -> Result<ApiResponse> {
		let mut request = ApiRequest::new(method, path).with_config(config);

		request.body = body;

		self.send(request).await
	}

	/// Issues a `GET` request.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::new(Method::GET, path)).await
	}

	/// Issues a `DELETE` request.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::new(Method::DELETE, path)).await
	}

	/// Issues a `POST` request with a JSON body.
	pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.send(ApiRequest::new(Method::POST, path).json(body)?).await
	}

	/// Issues a `PUT` request with a JSON body.
	pub async fn put_json<T>(&self, path: &str, body: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.send(ApiRequest::new(Method::PUT, path).json(body)?).await
	}

	/// Sends a prepared request, recovering once from an expired access token.
	///
	/// Returns every non-401 response as-is. A 401 triggers (or joins) the single-flight
	/// refresh; on success the request is replayed with the new token, on failure the
	/// refresh error is returned. A 401 on the replay is returned as
	/// [`Error::Unauthorized`].
	pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		const OPERATION: Operation = Operation::Request;

		let span = OperationSpan::new(OPERATION, "send");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.dispatch(&request, None).await?;

				if response.status() != StatusCode::UNAUTHORIZED {
					return Ok(response);
				}

				// A 401 on the replay is terminal; `replay` never re-enters recovery.
				request.mark_retried();

				let token = self.recover().await?;

				self.replay(&request, &token).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	/// Persists the token pair issued by a login or registration call.
	pub async fn sign_in(&self, credentials: Credentials) -> Result<()> {
		self.store.save(TokenKey::AccessToken, credentials.access_token).await?;
		self.store.save(TokenKey::RefreshToken, credentials.refresh_token).await?;

		Ok(())
	}

	/// Deletes both stored tokens.
	pub async fn sign_out(&self) -> Result<()> {
		for key in TokenKey::ALL {
			self.store.remove(key).await?;
		}

		Ok(())
	}

	/// Whether an access token is currently stored.
	pub async fn is_signed_in(&self) -> Result<bool> {
		Ok(self.store.load(TokenKey::AccessToken).await?.is_some())
	}

	async fn replay(&self, request: &ApiRequest, token: &TokenSecret) -> Result<ApiResponse> {
		const OPERATION: Operation = Operation::Replay;

		let span = OperationSpan::new(OPERATION, "replay");

		debug_assert!(request.is_retried());
		obs::record_outcome(OPERATION, Outcome::Attempt);
		self.metrics.record_replay();

		let result = span
			.instrument(async {
				let response = self.dispatch(request, Some(token)).await?;

				if response.status() == StatusCode::UNAUTHORIZED {
					return Err(Error::Unauthorized { path: request.path.clone(), response });
				}

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	/// Resolves the request and hands it to the transport. `token` overrides the stored
	/// access token; without it the store is read at dispatch time.
	async fn dispatch(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
	) -> Result<ApiResponse> {
		let url = request.url(&self.config)?;
		let mut headers = request.config.headers.clone();
		let stored = match token {
			Some(_) => None,
			None => self.store.load(TokenKey::AccessToken).await?,
		};

		if let Some(token) = token.or(stored.as_ref()) {
			headers.insert(AUTHORIZATION, token.bearer_header().map_err(ConfigError::from)?);
		}

		let http_request =
			HttpRequest { method: request.method.clone(), url, headers, body: request.body.clone() };

		Ok(self.http_client.execute(http_request).await?)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a gateway with its own reqwest transport and a log-only login redirect.
	pub fn new(config: GatewayConfig, store: Arc<dyn TokenStore>) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), store, Arc::new(LogNavigator))
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("refresh_in_progress", &self.refresh_in_progress())
			.field("queued_requests", &self.queued_requests())
			.finish()
	}
}
