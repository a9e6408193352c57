//! Navigation collaborator used to send the user back to the login view.

// self
use crate::_prelude::*;

/// Receives full-page redirects issued by the pipeline.
///
/// The pipeline calls [`Navigator::redirect`] only when a session is torn down; the
/// implementation decides how a route becomes a visible page change.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Redirects to `route`.
	fn redirect(&self, route: &str);
}

/// Navigator that records every redirect so hosts can poll for them.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator(Arc<Mutex<Vec<String>>>);
impl RecordingNavigator {
	/// Returns every route redirected to so far, oldest first.
	pub fn redirects(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Removes and returns the recorded routes.
	pub fn drain(&self) -> Vec<String> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl Navigator for RecordingNavigator {
	fn redirect(&self, route: &str) {
		self.0.lock().push(route.to_owned());
	}
}

/// Adapts any closure into a [`Navigator`].
pub struct FnNavigator<F>(pub F);
impl<F> Navigator for FnNavigator<F>
where
	F: Fn(&str) + Send + Sync,
{
	fn redirect(&self, route: &str) {
		(self.0)(route)
	}
}
impl<F> Debug for FnNavigator<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnNavigator(..)")
	}
}
