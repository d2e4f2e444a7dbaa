//! Gateway-level error types shared across transports, stores, and the refresh gate.

// crates.io
use http::header::InvalidHeaderValue;
// self
use crate::{_prelude::*, config::GatewayConfigError, request::ApiResponse};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS). Never retried by the gateway.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The access token could not be renewed; the session has been torn down.
	///
	/// Every request queued behind the same refresh receives the same shared error.
	#[error("{0}")]
	Refresh(#[source] Arc<RefreshError>),
	/// Request was rejected with 401 again after being replayed with a fresh token.
	#[error("Request to `{path}` is unauthorized even after refreshing the access token.")]
	Unauthorized {
		/// Path the request was issued against.
		path: String,
		/// Final 401 response.
		response: ApiResponse,
	},
	/// Non-success status surfaced by [`ApiResponse::error_for_status`].
	#[error("Request failed with HTTP status {status}.")]
	Status {
		/// HTTP status code.
		status: StatusCode,
		/// Full response for caller-side inspection.
		response: ApiResponse,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
}
impl From<RefreshError> for Error {
	fn from(e: RefreshError) -> Self {
		Self::Refresh(Arc::new(e))
	}
}

/// Configuration and request-construction failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Gateway(#[from] GatewayConfigError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A header value (typically a stored access token) is not a valid HTTP header value.
	#[error("Header value is invalid.")]
	InvalidHeaderValue(#[from] InvalidHeaderValue),
	/// Request path cannot be joined onto the base URL.
	#[error("Path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Reasons a token refresh cycle fails. Every variant is fatal for the session.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// No refresh token is present in storage.
	#[error("No refresh token is stored; the session must sign in again.")]
	MissingRefreshToken,
	/// Stored refresh token cannot be rendered as a bearer header.
	#[error("Stored refresh token is not a valid header value.")]
	InvalidRefreshToken(#[source] InvalidHeaderValue),
	/// Refresh endpoint URL cannot be resolved from the configuration.
	#[error("Refresh endpoint is misconfigured.")]
	Config(#[source] ConfigError),
	/// Refresh endpoint answered with a non-success status (revoked or expired refresh token).
	#[error("Refresh endpoint rejected the refresh token with HTTP status {status}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: StatusCode,
		/// Response body preview for diagnostics.
		body: String,
	},
	/// Refresh endpoint could not be reached.
	#[error("Refresh endpoint could not be reached.")]
	Transport(#[source] TransportError),
	/// Refresh endpoint returned a body without a usable access token.
	#[error("Refresh endpoint returned a malformed response.")]
	MalformedResponse(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// Token store failed while reading the refresh token or writing the new access token.
	#[error("Token store failed during refresh.")]
	Storage(#[source] crate::store::StoreError),
	/// Refresh call exceeded the configured timeout.
	#[error("Refresh call did not settle within {limit:?}.")]
	TimedOut {
		/// Configured timeout.
		limit: Duration,
	},
	/// The task driving the refresh was dropped before it settled.
	#[error("Refresh was abandoned before it settled.")]
	Abandoned,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_error_converts_into_shared_gateway_error() {
		let err: Error = RefreshError::MissingRefreshToken.into();

		match &err {
			Error::Refresh(inner) => assert!(matches!(**inner, RefreshError::MissingRefreshToken)),
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let source = StdError::source(&err).expect("Refresh errors should expose their source.");

		assert_eq!(source.to_string(), RefreshError::MissingRefreshToken.to_string());
	}

	#[test]
	fn rejected_refresh_reports_status() {
		let err = RefreshError::Rejected {
			status: StatusCode::UNAUTHORIZED,
			body: "refresh token expired".into(),
		};

		assert!(err.to_string().contains("401"));
	}
}
