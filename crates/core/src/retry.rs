//! Bounded retry with exponential backoff.

use std::time::Duration;

/// How many times a step is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts including the first; `0` is treated as `1`.
	pub max_attempts: u32,
	pub initial_backoff: Duration,
	pub multiplier: u32,
	pub max_backoff: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff: Duration::from_millis(500),
			multiplier: 2,
			max_backoff: Duration::from_secs(10),
		}
	}
}

impl RetryPolicy {
	/// Policy used to restart a whole run after the browser dies.
	pub fn restart() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff: Duration::from_secs(3),
			multiplier: 1,
			max_backoff: Duration::from_secs(3),
		}
	}

	/// `attempts` tries with no delay in between.
	pub fn immediate(attempts: u32) -> Self {
		Self {
			max_attempts: attempts,
			initial_backoff: Duration::ZERO,
			multiplier: 1,
			max_backoff: Duration::ZERO,
		}
	}

	pub fn with_max_attempts(mut self, attempts: u32) -> Self {
		self.max_attempts = attempts;
		self
	}

	pub fn attempts(&self) -> u32 {
		self.max_attempts.max(1)
	}

	/// Whether another attempt may follow the 1-based `attempt` that just failed.
	pub fn allows_retry(&self, attempt: u32) -> bool {
		attempt < self.attempts()
	}

	/// Delay after the 1-based `attempt` failed.
	pub fn delay_after(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1);
		let factor = self.multiplier.max(1).saturating_pow(exponent);
		self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_backoff_doubles_until_capped() {
		let policy = RetryPolicy {
			max_backoff: Duration::from_secs(3),
			..RetryPolicy::default()
		};
		assert_eq!(policy.delay_after(1), Duration::from_millis(500));
		assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
		assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
		assert_eq!(policy.delay_after(4), Duration::from_secs(3));
		assert_eq!(policy.delay_after(40), Duration::from_secs(3));
	}

	#[test]
	fn retry_bound_counts_first_attempt() {
		let policy = RetryPolicy::default();
		assert!(policy.allows_retry(1));
		assert!(policy.allows_retry(2));
		assert!(!policy.allows_retry(3));
	}

	#[test]
	fn zero_attempts_still_tries_once() {
		let policy = RetryPolicy::immediate(0);
		assert_eq!(policy.attempts(), 1);
		assert!(!policy.allows_retry(1));
		assert_eq!(policy.delay_after(1), Duration::ZERO);
	}

	#[test]
	fn restart_policy_waits_fixed_interval() {
		let policy = RetryPolicy::restart();
		assert_eq!(policy.delay_after(1), Duration::from_secs(3));
		assert_eq!(policy.delay_after(2), Duration::from_secs(3));
	}
}
