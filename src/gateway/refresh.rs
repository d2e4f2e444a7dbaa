//! Single-flight access-token refresh.
//!
//! The gate has two states, IDLE and REFRESHING. The first request to observe a 401 while
//! the gate is IDLE becomes the leader: it flips the gate to REFRESHING and exchanges the
//! stored refresh token for a new access token. Requests that observe a 401 while the gate
//! is REFRESHING park a one-shot channel in the waiter queue instead of issuing their own
//! refresh call. The decision to lead or wait is taken under a short synchronous lock
//! that is never held across an `.await`; the refresh call and every replay run outside
//! it.
//!
//! On success the new access token is stored, waiters are released with it, and the gate
//! returns to IDLE. On failure waiters are rejected with the shared error, both tokens are
//! deleted, the client is sent to the login entry point, and the gate returns to IDLE.
//! Dropping the leader mid-refresh returns the gate to IDLE and releases waiters with
//! [`RefreshError::Abandoned`].

// std
use std::mem;
// crates.io
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{TokenKey, TokenSecret},
	error::RefreshError,
	gateway::Gateway,
	http::{GatewayHttpClient, HttpRequest},
	obs::{self, Operation, OperationSpan, Outcome},
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Result delivered to every request queued behind one refresh cycle.
pub type RefreshOutcome = Result<TokenSecret, Arc<RefreshError>>;

#[derive(Deserialize)]
struct RefreshResponse {
	access_token: TokenSecret,
}

/// IDLE/REFRESHING flag plus the queue of requests waiting on the in-flight refresh.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate(Mutex<GateState>);
impl RefreshGate {
	/// Either claims the refresh (IDLE -> REFRESHING) or enqueues the caller.
	pub(crate) fn admit(&self) -> Admission<'_> {
		let mut state = self.0.lock();

		if state.refreshing {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			Admission::Waiter(rx)
		} else {
			state.refreshing = true;

			Admission::Leader(RefreshLease { gate: self, finished: false })
		}
	}

	pub(crate) fn is_refreshing(&self) -> bool {
		self.0.lock().refreshing
	}

	pub(crate) fn queued(&self) -> usize {
		self.0.lock().waiters.len()
	}
}

#[derive(Debug, Default)]
struct GateState {
	refreshing: bool,
	waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

pub(crate) enum Admission<'a> {
	Leader(RefreshLease<'a>),
	Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Proof of leadership over the current refresh cycle.
pub(crate) struct RefreshLease<'a> {
	gate: &'a RefreshGate,
	finished: bool,
}
impl RefreshLease<'_> {
	/// Releases the waiters queued so far; the gate stays REFRESHING.
	pub(crate) fn release(&self, outcome: &RefreshOutcome) -> usize {
		let waiters = mem::take(&mut self.gate.0.lock().waiters);

		notify(waiters, outcome)
	}

	/// Releases any remaining waiters and returns the gate to IDLE.
	pub(crate) fn finish(mut self, outcome: &RefreshOutcome) -> usize {
		self.finished = true;

		notify(self.reset(), outcome)
	}

	fn reset(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
		let mut state = self.gate.0.lock();

		state.refreshing = false;

		mem::take(&mut state.waiters)
	}
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		if !self.finished {
			notify(self.reset(), &Err(Arc::new(RefreshError::Abandoned)));
		}
	}
}

fn notify(waiters: Vec<oneshot::Sender<RefreshOutcome>>, outcome: &RefreshOutcome) -> usize {
	let count = waiters.len();

	for waiter in waiters {
		// Receiver gone means the waiting request was cancelled.
		let _ = waiter.send(outcome.clone());
	}

	count
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Obtains a fresh access token, joining the in-flight refresh when there is one.
	pub(crate) async fn recover(&self) -> Result<TokenSecret> {
		match self.refresh_gate.admit() {
			Admission::Waiter(rx) => {
				self.metrics.record_queued();
				obs::record_outcome(Operation::Refresh, Outcome::Queued);

				match rx.await {
					Ok(outcome) => outcome.map_err(Error::Refresh),
					Err(_) => Err(RefreshError::Abandoned.into()),
				}
			},
			Admission::Leader(lease) => self.lead_refresh(lease).await,
		}
	}

	async fn lead_refresh(&self, lease: RefreshLease<'_>) -> Result<TokenSecret> {
		const OPERATION: Operation = Operation::Refresh;

		let span = OperationSpan::new(OPERATION, "lead_refresh");

		obs::record_outcome(OPERATION, Outcome::Attempt);
		self.metrics.record_refresh_attempt();

		span.instrument(async move {
			let outcome = self.exchange_within_timeout().await.map_err(Arc::new);

			match &outcome {
				Ok(_) => {
					self.metrics.record_refresh_success();
					obs::record_outcome(OPERATION, Outcome::Success);
					lease.finish(&outcome);
				},
				Err(_) => {
					self.metrics.record_refresh_failure();
					obs::record_outcome(OPERATION, Outcome::Failure);
					lease.release(&outcome);
					self.tear_down().await;
					lease.finish(&outcome);
				},
			}

			outcome.map_err(Error::Refresh)
		})
		.await
	}

	/// Applies [`GatewayConfig::refresh_timeout`](crate::config::GatewayConfig::refresh_timeout)
	/// when configured. Requires a Tokio runtime with the time driver enabled.
	async fn exchange_within_timeout(&self) -> Result<TokenSecret, RefreshError> {
		match self.config.refresh_timeout {
			Some(limit) => tokio::time::timeout(limit, self.exchange_refresh_token())
				.await
				.unwrap_or_else(|_| Err(RefreshError::TimedOut { limit })),
			None => self.exchange_refresh_token().await,
		}
	}

	/// Exchanges the stored refresh token for a new access token and stores it.
	async fn exchange_refresh_token(&self) -> Result<TokenSecret, RefreshError> {
		let refresh_token = self
			.store
			.load(TokenKey::RefreshToken)
			.await
			.map_err(RefreshError::Storage)?
			.ok_or(RefreshError::MissingRefreshToken)?;
		let mut headers = HeaderMap::new();

		headers.insert(
			AUTHORIZATION,
			refresh_token.bearer_header().map_err(RefreshError::InvalidRefreshToken)?,
		);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		let request = HttpRequest {
			method: Method::POST,
			url: self.config.refresh_url().map_err(RefreshError::Config)?,
			headers,
			body: Some(b"{}".to_vec()),
		};
		let response =
			self.http_client.execute(request).await.map_err(RefreshError::Transport)?;

		if !response.status().is_success() {
			return Err(RefreshError::Rejected {
				status: response.status(),
				body: response.body_preview(BODY_PREVIEW_LIMIT),
			});
		}

		let mut de = serde_json::Deserializer::from_slice(response.bytes());
		let payload: RefreshResponse =
			serde_path_to_error::deserialize(&mut de).map_err(RefreshError::MalformedResponse)?;

		self.store
			.save(TokenKey::AccessToken, payload.access_token.clone())
			.await
			.map_err(RefreshError::Storage)?;

		Ok(payload.access_token)
	}

	/// Deletes both tokens and sends the client to the login entry point. Storage failures
	/// are reported but do not stop the redirect.
	async fn tear_down(&self) {
		for key in TokenKey::ALL {
			if let Err(e) = self.store.remove(key).await {
				obs::warn_suppressed("tear_down", &e);
			}
		}

		self.navigator.redirect_to_login(&self.config.login_path);
	}
}
