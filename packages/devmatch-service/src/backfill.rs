use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{MatchService, Result};
use devmatch_domain::profile_text;
use devmatch_storage::profiles::{self, ProfileCursor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
	pub scanned: u64,
	pub updated: u64,
	pub skipped: u64,
	pub failed: u64,
}
impl BackfillReport {
	pub fn absorb(&mut self, other: BackfillReport) {
		self.scanned += other.scanned;
		self.updated += other.updated;
		self.skipped += other.skipped;
		self.failed += other.failed;
	}
}

/// One batch of the backfill, and where the next one starts.
#[derive(Debug, Clone, Copy)]
pub struct BackfillBatch {
	pub report: BackfillReport,
	pub next: Option<ProfileCursor>,
}

impl MatchService {
	/// Embeds every profile that has text but no stored vector, oldest first, in batches of
	/// `backfill.batch_size`. Profiles whose embedding fails are counted and left for the next
	/// sweep.
	pub async fn backfill_embeddings(&self) -> Result<BackfillReport> {
		let mut report = BackfillReport::default();
		let mut cursor = None;

		loop {
			let batch = self.backfill_batch(cursor).await?;

			report.absorb(batch.report);

			match batch.next {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		tracing::info!(
			scanned = report.scanned,
			updated = report.updated,
			skipped = report.skipped,
			failed = report.failed,
			"Embedding backfill finished."
		);

		Ok(report)
	}

	/// Processes up to `backfill.batch_size` profiles after `after`. `next` is `None` once the
	/// scan is exhausted.
	pub async fn backfill_batch(&self, after: Option<ProfileCursor>) -> Result<BackfillBatch> {
		let batch_size = self.cfg.backfill.batch_size;
		let pause = Duration::from_millis(self.cfg.backfill.pause_ms);
		let rows = profiles::list_missing_embeddings(&self.db, after, i64::from(batch_size)).await?;
		let mut report = BackfillReport::default();
		let next = if rows.len() as u64 >= u64::from(batch_size) {
			rows.last().map(ProfileCursor::from)
		} else {
			None
		};

		for (idx, profile) in rows.iter().enumerate() {
			report.scanned += 1;

			if idx > 0 && !pause.is_zero() {
				tokio::time::sleep(pause).await;
			}

			let Some(text) = profile_text::embedding_input(&profile.skills, &profile.about) else {
				report.skipped += 1;

				continue;
			};
			let Some(vec) =
				self.providers.embedding.embed(&self.cfg.providers.embedding, &text).await
			else {
				tracing::warn!(user_id = %profile.user_id, "Backfill embedding unavailable.");

				report.failed += 1;

				continue;
			};
			let now = OffsetDateTime::now_utc();

			match profiles::set_embedding(&self.db, profile.user_id, &vec, now).await {
				Ok(()) => report.updated += 1,
				Err(err) => {
					tracing::warn!(
						error = %err,
						user_id = %profile.user_id,
						"Failed to persist backfilled embedding."
					);

					report.failed += 1;
				},
			}
		}

		Ok(BackfillBatch { report, next })
	}
}
