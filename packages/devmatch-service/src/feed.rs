use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, MatchService, ProfileView, Result};
use devmatch_domain::{
	exclusion::ExclusionSet,
	feed::{self, EmbeddedCandidate, EntrySource, PageRequest, RankingMode, RecentCandidate},
	profile_text,
};
use devmatch_storage::{connections, models::Profile, profiles};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedRequest {
	pub page: Option<u32>,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
	#[serde(flatten)]
	pub profile: ProfileView,
	pub similarity: Option<f32>,
	pub source: EntrySource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
	pub data: Vec<FeedItem>,
	pub total: usize,
	pub page: u32,
	pub limit: u32,
	pub pages: u32,
	pub ranking: RankingMode,
}

impl MatchService {
	/// Ranked discovery feed for `user_id`.
	///
	/// Candidates with a cached embedding are ordered by similarity to the requester. When the
	/// requester has no resolvable vector, or fewer than `feed.min_results` candidates could be
	/// scored, recently created profiles fill the remainder after every scored entry.
	pub async fn feed(&self, user_id: Uuid, req: FeedRequest) -> Result<FeedResponse> {
		let page = PageRequest::resolve(
			req.page,
			req.limit,
			self.cfg.feed.default_limit,
			self.cfg.feed.max_limit,
		)?;
		let requester = profiles::get_profile(&self.db.pool, user_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Profile not found.".to_string() })?;
		let requester_vec = self.resolve_requester_vector(&requester).await;
		let excluded = self.exclusion_set(user_id).await?;
		let excluded_ids = excluded.to_vec();
		let scored = match requester_vec.as_deref() {
			Some(vec) => {
				let candidates = profiles::list_embedded_candidates(&self.db, &excluded_ids)
					.await?
					.into_iter()
					.filter_map(|profile| {
						let embedding = profile.cached_embedding()?.to_vec();

						Some(EmbeddedCandidate { user_id: profile.user_id, embedding, item: profile })
					})
					.collect();

				feed::score_candidates(vec, candidates, &excluded)
			},
			None => Vec::new(),
		};
		let shortfall = feed::fallback_shortfall(scored.len(), self.cfg.feed.min_results);
		let scored_count = scored.len();
		let entries = if shortfall > 0 {
			let mut skip = excluded_ids;

			skip.extend(scored.iter().map(|entry| entry.user_id));

			let recent = profiles::list_recent_profiles(&self.db, &skip, shortfall as i64)
				.await?
				.into_iter()
				.map(|profile| RecentCandidate { user_id: profile.user_id, item: profile })
				.collect();

			feed::pad_with_fallback(scored, recent, &excluded, self.cfg.feed.min_results)
		} else {
			scored
		};
		let ranking = if scored_count > 0 { RankingMode::Similarity } else { RankingMode::Fallback };

		tracing::debug!(
			user_id = %user_id,
			ranking = ?ranking,
			scored = scored_count,
			total = entries.len(),
			excluded = excluded.len(),
			"Feed ranked."
		);

		let page = feed::paginate(entries, page);

		Ok(FeedResponse {
			data: page
				.entries
				.into_iter()
				.map(|entry| FeedItem {
					profile: ProfileView::from(&entry.item),
					similarity: entry.similarity,
					source: entry.source,
				})
				.collect(),
			total: page.total,
			page: page.page,
			limit: page.limit,
			pages: page.pages,
			ranking,
		})
	}

	/// Every user `user_id` already has a connection record with, in any status, plus
	/// `user_id` itself.
	pub async fn exclusion_set(&self, user_id: Uuid) -> Result<ExclusionSet> {
		let pairs = connections::list_pairs_for_user(&self.db, user_id).await?;

		Ok(ExclusionSet::from_pairs(user_id, pairs))
	}

	/// Cached vector, or a freshly computed one persisted best-effort.
	pub(crate) async fn resolve_requester_vector(&self, profile: &Profile) -> Option<Vec<f32>> {
		if let Some(vec) = profile.cached_embedding() {
			return Some(vec.to_vec());
		}

		let text = profile_text::embedding_input(&profile.skills, &profile.about)?;
		let vec = self.providers.embedding.embed(&self.cfg.providers.embedding, &text).await?;

		if vec.is_empty() {
			return None;
		}

		let now = OffsetDateTime::now_utc();

		if let Err(err) = profiles::set_embedding(&self.db, profile.user_id, &vec, now).await {
			tracing::warn!(
				error = %err,
				user_id = %profile.user_id,
				"Failed to persist requester embedding."
			);
		}

		Some(vec)
	}
}
