//! Caller-facing request and response types.

// crates.io
use http::header::{CONTENT_TYPE, HeaderName};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, config::GatewayConfig, error::ConfigError};

/// Per-call overrides merged into a single request.
#[derive(Clone, Debug, Default)]
pub struct RequestConfig {
	/// Headers applied on top of the gateway defaults.
	pub headers: HeaderMap,
	/// Query parameters appended to the resolved URL, in order.
	pub params: Vec<(String, String)>,
}
impl RequestConfig {
	/// Adds or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Appends a query parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push((key.into(), value.into()));

		self
	}
}

/// Logical request issued through the gateway.
///
/// The gateway marks a request as retried the first time it is replayed after a token
/// refresh; a second 401 on a retried request is terminal.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL.
	pub path: String,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Per-call overrides.
	pub config: RequestConfig,
	retried: bool,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), body: None, config: RequestConfig::default(), retried: false }
	}

	/// Attaches a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `body` as JSON and sets the matching content type.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(Error::Encode)?);
		self.config.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Replaces the per-call overrides, keeping any content type set by [`ApiRequest::json`]
	/// unless the new config sets its own.
	pub fn with_config(mut self, config: RequestConfig) -> Self {
		let content_type = self.config.headers.remove(CONTENT_TYPE);

		self.config = config;

		if let Some(value) = content_type {
			self.config.headers.entry(CONTENT_TYPE).or_insert(value);
		}

		self
	}

	/// Whether the request has already been replayed after a token refresh.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}

	/// Resolves the absolute URL, including query parameters.
	pub(crate) fn url(&self, config: &GatewayConfig) -> Result<Url, ConfigError> {
		let mut url = config.resolve(&self.path)?;

		if !self.config.params.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &self.config.params {
				pairs.append_pair(key, value);
			}
		}

		Ok(url)
	}
}

/// Fully buffered HTTP response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Builds a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// HTTP status code.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON; failures carry the path of the offending field.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}

	/// Turns any non-success status into [`Error::Status`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.status.is_success() {
			Ok(self)
		} else {
			Err(Error::Status { status: self.status, response: self })
		}
	}

	/// First `limit` characters of the body, for diagnostics.
	pub(crate) fn body_preview(&self, limit: usize) -> String {
		self.text().chars().take(limit).collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> GatewayConfig {
		GatewayConfig::builder(Url::parse("https://donasi.example.com/api/").expect("Valid URL."))
			.build()
			.expect("Test configuration should be valid.")
	}

	#[test]
	fn url_appends_params_in_order() {
		let request = ApiRequest::new(Method::GET, "/items")
			.with_config(RequestConfig::default().param("category", "buku").param("page", "2"));
		let url = request.url(&config()).expect("Request URL should resolve.");

		assert_eq!(url.as_str(), "https://donasi.example.com/api/items?category=buku&page=2");
	}

	#[test]
	fn json_body_sets_content_type_and_survives_config() {
		let request = ApiRequest::new(Method::POST, "/donations")
			.json(&serde_json::json!({ "title": "Sepeda" }))
			.expect("JSON body should encode.")
			.with_config(RequestConfig::default().param("draft", "true"));

		assert_eq!(
			request.config.headers.get(CONTENT_TYPE),
			Some(&HeaderValue::from_static("application/json")),
		);
		assert_eq!(request.body.as_deref(), Some(br#"{"title":"Sepeda"}"#.as_slice()));
		assert!(!request.is_retried());
	}

	#[test]
	fn json_decode_reports_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Item {
			id: u64,
		}

		let response = ApiResponse::new(StatusCode::OK, HeaderMap::new(), br#"{"id":"x"}"#.to_vec());
		let err = response.json::<Item>().expect_err("String ids should fail to decode.");

		match err {
			Error::Decode(inner) => assert_eq!(inner.path().to_string(), "id"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn error_for_status_keeps_response() {
		let response = ApiResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), b"missing".to_vec());

		match response.error_for_status() {
			Err(Error::Status { status, response }) => {
				assert_eq!(status, StatusCode::NOT_FOUND);
				assert_eq!(response.text(), "missing");
			},
			other => panic!("Unexpected result: {other:?}."),
		}
	}
}
