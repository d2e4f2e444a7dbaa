//! Login redirect hook invoked when a session cannot be recovered.

// self
use crate::_prelude::*;

/// Sends the client to the login entry point.
///
/// Called at most once per failed refresh cycle, after both tokens have been deleted. The
/// gateway never awaits the navigation; implementations should schedule the transition and
/// return immediately.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to `location` (the configured login path).
	fn redirect_to_login(&self, location: &str);
}

/// Navigator that only reports the redirect through the observability layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNavigator;
impl Navigator for LogNavigator {
	fn redirect_to_login(&self, location: &str) {
		#[cfg(feature = "tracing")]
		tracing::warn!(location, "session expired; redirecting to login");
		#[cfg(not(feature = "tracing"))]
		let _ = location;
	}
}

/// Navigator that records every requested location.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator(Arc<Mutex<Vec<String>>>);
impl RecordingNavigator {
	/// Locations requested so far, oldest first.
	pub fn locations(&self) -> Vec<String> {
		self.0.lock().clone()
	}
}
impl Navigator for RecordingNavigator {
	fn redirect_to_login(&self, location: &str) {
		self.0.lock().push(location.to_owned());
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_navigator_keeps_order() {
		let navigator = RecordingNavigator::default();

		navigator.redirect_to_login("/masuk");
		navigator.redirect_to_login("/login");

		assert_eq!(navigator.locations(), ["/masuk", "/login"]);
	}

	#[test]
	fn log_navigator_is_fire_and_forget() {
		LogNavigator.redirect_to_login("/masuk");
	}
}
