use std::{future::Future, time::Duration};

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds `text`, retrying transient failures.
///
/// Empty or whitespace-only text returns `None` without a request. Network errors, non-success
/// statuses and malformed bodies are retried up to `max_attempts` times with a fixed
/// `retry_delay_ms` gap; when every attempt fails the result is `None`, never an error.
pub async fn embed(
	cfg: &devmatch_config::EmbeddingProviderConfig,
	text: &str,
) -> Option<Vec<f32>> {
	let text = text.trim();

	if text.is_empty() {
		return None;
	}

	let client = match Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build() {
		Ok(client) => client,
		Err(err) => {
			tracing::error!(
				error = %err,
				provider_id = %cfg.provider_id,
				"Embedding client build failed."
			);

			return None;
		},
	};
	let client = &client;
	let delay = Duration::from_millis(cfg.retry_delay_ms);

	retry_with_delay(cfg.max_attempts, delay, |attempt| async move {
		let result = request_embedding(client, cfg, text).await;

		if let Err(err) = &result {
			tracing::warn!(
				error = %err,
				attempt,
				max_attempts = cfg.max_attempts,
				provider_id = %cfg.provider_id,
				"Embedding request failed."
			);
		}

		result
	})
	.await
}

/// One request to the embedding service.
pub async fn request_embedding(
	client: &Client,
	cfg: &devmatch_config::EmbeddingProviderConfig,
	text: &str,
) -> Result<Vec<f32>> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "text": text });
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(&json, &cfg.response_field, cfg.dimensions)
}

pub fn parse_embedding_response(json: &Value, field: &str, dimensions: u32) -> Result<Vec<f32>> {
	let values = json.get(field).and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse {
			message: format!("Embedding response is missing the {field} array."),
		}
	})?;

	if values.is_empty() {
		return Err(Error::InvalidResponse { message: "Embedding array is empty.".to_string() });
	}

	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	if dimensions != 0 && vec.len() != dimensions as usize {
		return Err(Error::InvalidResponse {
			message: format!("Embedding has {} dimensions, expected {dimensions}.", vec.len()),
		});
	}

	Ok(vec)
}

/// Runs `op` up to `max_attempts` times, sleeping `delay` between attempts. Attempts are
/// numbered from 1.
pub async fn retry_with_delay<T, F, Fut>(
	max_attempts: u32,
	delay: Duration,
	mut op: F,
) -> Option<T>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let max_attempts = max_attempts.max(1);

	for attempt in 1..=max_attempts {
		if let Ok(value) = op(attempt).await {
			return Some(value);
		}
		if attempt < max_attempts {
			tokio::time::sleep(delay).await;
		}
	}

	None
}
