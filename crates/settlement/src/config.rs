// Copyright 2026 bourse authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// Settlement coordinator configuration
///
/// Lock acquisition is always bounded: a submission that cannot take a
/// row lock within `lock_timeout_ms` aborts cleanly and is retried
/// transparently up to `max_retries` times before a retryable conflict
/// surfaces to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
	/// Transparent whole-transaction retries before surfacing Conflict
	pub max_retries: u32,
	/// Bounded wait for any single row lock, in milliseconds
	pub lock_timeout_ms: u64,
	/// Sleep between transparent retries, in milliseconds
	pub retry_backoff_ms: u64,
}

impl Default for CoordinatorConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			lock_timeout_ms: 1_000,
			retry_backoff_ms: 10,
		}
	}
}

impl CoordinatorConfig {
	/// Load configuration from environment variables
	///
	/// Unset variables fall back to the defaults.
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let defaults = Self::default();
		let cfg = config::Config::builder()
			.set_default("max_retries", u64::from(defaults.max_retries))?
			.set_default("lock_timeout_ms", defaults.lock_timeout_ms)?
			.set_default("retry_backoff_ms", defaults.retry_backoff_ms)?
			.add_source(config::Environment::with_prefix("SETTLEMENT"))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let defaults = Self::default();
		let cfg = config::Config::builder()
			.set_default("max_retries", u64::from(defaults.max_retries))?
			.set_default("lock_timeout_ms", defaults.lock_timeout_ms)?
			.set_default("retry_backoff_ms", defaults.retry_backoff_ms)?
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("SETTLEMENT"))
			.build()?;

		cfg.try_deserialize()
	}
}
