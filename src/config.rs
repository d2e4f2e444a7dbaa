//! Gateway configuration: base URL, refresh endpoint, login entry point, refresh timeout.

// self
use crate::{_prelude::*, error::ConfigError};

/// Errors raised while constructing or validating a [`GatewayConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum GatewayConfigError {
	/// Base URL cannot have relative paths joined onto it (e.g. `mailto:`).
	#[error("Base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Refresh endpoint path is empty.
	#[error("Refresh endpoint path must not be empty.")]
	EmptyRefreshPath,
	/// Login entry point is empty.
	#[error("Login path must not be empty.")]
	EmptyLoginPath,
	/// A zero refresh timeout would fail every refresh immediately.
	#[error("Refresh timeout must be greater than zero.")]
	ZeroRefreshTimeout,
	/// Configuration document could not be parsed.
	#[error("Configuration document is invalid at `{path}`: {message}.")]
	Parse {
		/// Path to the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
}

/// Resolved gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
	/// Base prefix every request path is resolved against. Always ends with `/`.
	pub base_url: Url,
	/// Refresh endpoint path, relative to [`GatewayConfig::base_url`].
	pub refresh_path: String,
	/// Login entry point the client is sent to when the session cannot be recovered.
	pub login_path: String,
	/// Upper bound for a single refresh call. `None` waits indefinitely.
	pub refresh_timeout: Option<Duration>,
}
impl GatewayConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "user/refresh-token";
	/// Default login entry point.
	pub const DEFAULT_LOGIN_PATH: &'static str = "/masuk";

	/// Creates a builder seeded with the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Loads a configuration from a JSON document.
	///
	/// Recognized fields: `base_url` (required), `refresh_path`, `login_path`, and
	/// `refresh_timeout_ms`.
	pub fn from_json(bytes: &[u8]) -> Result<Self, GatewayConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let raw: RawGatewayConfig = serde_path_to_error::deserialize(&mut de).map_err(|e| {
			GatewayConfigError::Parse { path: e.path().to_string(), message: e.inner().to_string() }
		})?;
		let mut builder = Self::builder(raw.base_url);

		if let Some(path) = raw.refresh_path {
			builder = builder.refresh_path(path);
		}
		if let Some(path) = raw.login_path {
			builder = builder.login_path(path);
		}
		if let Some(ms) = raw.refresh_timeout_ms {
			builder = builder.refresh_timeout(Duration::from_millis(ms));
		}

		builder.build()
	}

	/// Resolves a request path against the base URL. A leading `/` is ignored so every
	/// path stays under the base prefix.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.refresh_path)
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGatewayConfig {
	base_url: Url,
	refresh_path: Option<String>,
	login_path: Option<String>,
	refresh_timeout_ms: Option<u64>,
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Base URL for every request.
	pub base_url: Url,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Login entry point.
	pub login_path: String,
	/// Optional refresh timeout.
	pub refresh_timeout: Option<Duration>,
}
impl GatewayConfigBuilder {
	/// Creates a new builder with default paths and no refresh timeout.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: GatewayConfig::DEFAULT_REFRESH_PATH.into(),
			login_path: GatewayConfig::DEFAULT_LOGIN_PATH.into(),
			refresh_timeout: None,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login entry point.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Bounds each refresh call; expiry is handled exactly like a refresh failure.
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = Some(timeout);

		self
	}

	/// Validates the builder and produces a [`GatewayConfig`].
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		let mut base_url = self.base_url;

		if base_url.cannot_be_a_base() {
			return Err(GatewayConfigError::CannotBeABase { url: base_url.to_string() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}
		if self.refresh_path.trim_start_matches('/').is_empty() {
			return Err(GatewayConfigError::EmptyRefreshPath);
		}
		if self.login_path.is_empty() {
			return Err(GatewayConfigError::EmptyLoginPath);
		}
		if self.refresh_timeout.is_some_and(|timeout| timeout.is_zero()) {
			return Err(GatewayConfigError::ZeroRefreshTimeout);
		}

		Ok(GatewayConfig {
			base_url,
			refresh_path: self.refresh_path,
			login_path: self.login_path,
			refresh_timeout: self.refresh_timeout,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn builder_normalizes_base_and_applies_defaults() {
		let config = GatewayConfig::builder(url("https://donasi.example.com/api"))
			.build()
			.expect("Default configuration should be valid.");

		assert_eq!(config.base_url.as_str(), "https://donasi.example.com/api/");
		assert_eq!(config.login_path, "/masuk");
		assert_eq!(config.refresh_timeout, None);
		assert_eq!(
			config.refresh_url().expect("Refresh URL should resolve.").as_str(),
			"https://donasi.example.com/api/user/refresh-token",
		);
	}

	#[test]
	fn resolve_keeps_paths_under_the_base_prefix() {
		let config = GatewayConfig::builder(url("https://donasi.example.com/api/"))
			.build()
			.expect("Configuration should be valid.");

		assert_eq!(
			config.resolve("/items/42").expect("Absolute-looking path should resolve.").as_str(),
			"https://donasi.example.com/api/items/42",
		);
		assert_eq!(
			config.resolve("chat?room=7").expect("Relative path should resolve.").as_str(),
			"https://donasi.example.com/api/chat?room=7",
		);
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let base = url("https://donasi.example.com/api/");

		assert_eq!(
			GatewayConfig::builder(base.clone()).refresh_path("/").build(),
			Err(GatewayConfigError::EmptyRefreshPath),
		);
		assert_eq!(
			GatewayConfig::builder(base.clone()).login_path("").build(),
			Err(GatewayConfigError::EmptyLoginPath),
		);
		assert_eq!(
			GatewayConfig::builder(base).refresh_timeout(Duration::ZERO).build(),
			Err(GatewayConfigError::ZeroRefreshTimeout),
		);
		assert!(matches!(
			GatewayConfig::builder(url("mailto:donor@example.com")).build(),
			Err(GatewayConfigError::CannotBeABase { .. })
		));
	}

	#[test]
	fn from_json_reads_overrides() {
		let config = GatewayConfig::from_json(
			br#"{"base_url":"http://localhost:8080/api","login_path":"/login","refresh_timeout_ms":1500}"#,
		)
		.expect("JSON configuration should load.");

		assert_eq!(config.base_url.as_str(), "http://localhost:8080/api/");
		assert_eq!(config.refresh_path, GatewayConfig::DEFAULT_REFRESH_PATH);
		assert_eq!(config.login_path, "/login");
		assert_eq!(config.refresh_timeout, Some(Duration::from_millis(1500)));
	}

	#[test]
	fn from_json_reports_offending_field() {
		let err = GatewayConfig::from_json(
			br#"{"base_url":"http://localhost/api","refresh_timeout_ms":"soon"}"#,
		)
		.expect_err("A string timeout should be rejected.");

		match err {
			GatewayConfigError::Parse { path, .. } => assert_eq!(path, "refresh_timeout_ms"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
