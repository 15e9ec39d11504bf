use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub feed: Feed,
	#[serde(default)]
	pub backfill: Backfill,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Optional. Sent as a bearer token when present.
	#[serde(default)]
	pub api_key: Option<String>,
	pub path: String,
	/// JSON key holding the numeric array in the provider response.
	#[serde(default = "default_response_field")]
	pub response_field: String,
	/// Expected vector length. Zero accepts whatever the provider returns.
	#[serde(default)]
	pub dimensions: u32,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_embedding_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_embedding_retry_delay_ms")]
	pub retry_delay_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Feed {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Scored results below this count are padded with the most recent profiles.
	pub min_results: u32,
}
impl Default for Feed {
	fn default() -> Self {
		Self { default_limit: 10, max_limit: 50, min_results: 10 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Backfill {
	pub batch_size: u32,
	pub pause_ms: u64,
	pub poll_interval_ms: u64,
}
impl Default for Backfill {
	fn default() -> Self {
		Self { batch_size: 50, pause_ms: 500, poll_interval_ms: 60_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_response_field() -> String {
	"embedding".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
	15_000
}

fn default_embedding_max_attempts() -> u32 {
	2
}

fn default_embedding_retry_delay_ms() -> u64 {
	1_500
}
