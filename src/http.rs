//! Transport primitives for gateway requests.
//!
//! [`GatewayHttpClient`] is the gateway's only dependency on an HTTP stack. The gateway
//! resolves every logical request into an [`HttpRequest`] (absolute URL, final headers,
//! body) before handing it to the transport, and expects a fully buffered
//! [`ApiResponse`] back for every status code. Only failures that produce no HTTP response
//! at all (DNS, TCP, TLS, IO) are reported as [`TransportError`].

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError, request::ApiResponse};

/// Boxed future returned by [`GatewayHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports used by the gateway.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared across
/// every request of a session, and the returned future must be `Send` so gateway futures
/// can hop executor threads.
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the response, whatever its status.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Fully resolved request handed to a [`GatewayHttpClient`].
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Final header set, including credentials.
	pub headers: HeaderMap,
	/// Optional body.
	pub body: Option<Vec<u8>>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Configure a request timeout on the client to bound refresh calls at the transport
	/// level as well.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let HttpRequest { method, url, headers, body } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?;

			Ok(ApiResponse::new(status, headers, body.to_vec()))
		})
	}
}
