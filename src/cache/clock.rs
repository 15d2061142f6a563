use std::time::Duration;

/// Wall-clock source for staleness checks.
pub trait Clock {
	/// Time since an arbitrary fixed origin.
	fn now(&self) -> Duration;
}

/// Reads `Date.now()` from the JS host.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
	fn now(&self) -> Duration {
		Duration::from_secs_f64(js_sys::Date::now() / 1000.0)
	}
}

#[cfg(test)]
pub use manual::ManualClock;
