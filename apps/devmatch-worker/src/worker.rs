use std::time::Duration;

use tokio::time;

use devmatch_service::{BackfillReport, MatchService};

/// One full sweep over profiles missing an embedding.
pub async fn run_once(service: &MatchService) -> color_eyre::Result<BackfillReport> {
	let report = service.backfill_embeddings().await?;

	Ok(report)
}

/// Sweeps forever, sleeping `backfill.poll_interval_ms` between sweeps. A failed sweep is logged
/// and retried on the next tick.
pub async fn run_worker(service: &MatchService) -> color_eyre::Result<()> {
	let interval = Duration::from_millis(service.cfg.backfill.poll_interval_ms);

	tracing::info!(
		poll_interval_ms = service.cfg.backfill.poll_interval_ms,
		"Backfill worker started."
	);

	loop {
		if let Err(err) = service.backfill_embeddings().await {
			tracing::error!(error = %err, "Embedding backfill sweep failed.");
		}

		time::sleep(interval).await;
	}
}
