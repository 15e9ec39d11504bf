mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Backfill, Config, EmbeddingProviderConfig, Feed, Postgres, Providers, Security, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let embedding = &cfg.providers.embedding;

	if embedding.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_base must be non-empty.".to_string(),
		});
	}
	if !embedding.path.starts_with('/') {
		return Err(Error::Validation {
			message: "providers.embedding.path must start with '/'.".to_string(),
		});
	}
	if embedding.response_field.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.response_field must be non-empty.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if embedding.max_attempts == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.max_attempts must be at least one.".to_string(),
		});
	}

	for (key, value) in &embedding.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding.default_headers.{key} must be a string value."
				),
			});
		}
	}

	if cfg.feed.default_limit == 0 {
		return Err(Error::Validation {
			message: "feed.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.max_limit == 0 {
		return Err(Error::Validation {
			message: "feed.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.default_limit > cfg.feed.max_limit {
		return Err(Error::Validation {
			message: "feed.default_limit must not exceed feed.max_limit.".to_string(),
		});
	}
	if cfg.backfill.batch_size == 0 {
		return Err(Error::Validation {
			message: "backfill.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.backfill.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "backfill.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let embedding = &mut cfg.providers.embedding;

	if embedding.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		embedding.api_key = None;
	}

	let trimmed = embedding.api_base.trim().trim_end_matches('/');

	if trimmed.len() != embedding.api_base.len() {
		embedding.api_base = trimmed.to_string();
	}
}
