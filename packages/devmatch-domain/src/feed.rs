use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{exclusion::ExclusionSet, similarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
	#[error("page must be at least 1.")]
	InvalidPage,
	#[error("limit must be at least 1.")]
	InvalidLimit,
}

/// How the feed was ordered. `Fallback` means no candidate could be scored, either because the
/// requester has no vector or because no candidate vector is comparable with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
	Similarity,
	Fallback,
}

/// Where a feed entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
	Similarity,
	Recency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
	pub page: u32,
	pub limit: u32,
}
impl PageRequest {
	/// Applies defaults and caps `limit` at `max_limit`.
	pub fn resolve(
		page: Option<u32>,
		limit: Option<u32>,
		default_limit: u32,
		max_limit: u32,
	) -> Result<Self, PageError> {
		let page = page.unwrap_or(1);
		let limit = limit.unwrap_or(default_limit);

		if page == 0 {
			return Err(PageError::InvalidPage);
		}
		if limit == 0 {
			return Err(PageError::InvalidLimit);
		}

		Ok(Self { page, limit: limit.min(max_limit) })
	}

	pub fn offset(&self) -> usize {
		(self.page as usize - 1).saturating_mul(self.limit as usize)
	}

	/// Number of pages needed for `total` items.
	pub fn pages_for(&self, total: usize) -> u32 {
		u32::try_from(total.div_ceil(self.limit as usize)).unwrap_or(u32::MAX)
	}
}

/// A candidate with a cached embedding, as loaded from storage.
#[derive(Debug, Clone)]
pub struct EmbeddedCandidate<T> {
	pub user_id: Uuid,
	pub embedding: Vec<f32>,
	pub item: T,
}

/// A candidate without a similarity signal, in recency order.
#[derive(Debug, Clone)]
pub struct RecentCandidate<T> {
	pub user_id: Uuid,
	pub item: T,
}

#[derive(Debug, Clone)]
pub struct FeedEntry<T> {
	pub user_id: Uuid,
	pub similarity: Option<f32>,
	pub source: EntrySource,
	pub item: T,
}

#[derive(Debug, Clone)]
pub struct FeedPage<T> {
	pub entries: Vec<FeedEntry<T>>,
	pub total: usize,
	pub page: u32,
	pub limit: u32,
	pub pages: u32,
}

/// Scores every candidate against the requester vector and orders them by descending
/// similarity.
///
/// Excluded users, candidates whose vector length differs from the requester's, and pairs with
/// an undefined similarity are dropped. The sort is stable, so candidates with equal scores
/// keep their load order and unchanged inputs always produce the same ranking.
pub fn score_candidates<T>(
	requester: &[f32],
	candidates: Vec<EmbeddedCandidate<T>>,
	excluded: &ExclusionSet,
) -> Vec<FeedEntry<T>> {
	let mut seen = HashSet::new();
	let mut scored = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		if excluded.contains(&candidate.user_id) || !seen.insert(candidate.user_id) {
			continue;
		}
		if candidate.embedding.len() != requester.len() {
			continue;
		}

		let Some(similarity) = similarity::cosine_similarity(requester, &candidate.embedding)
		else {
			continue;
		};

		scored.push(FeedEntry {
			user_id: candidate.user_id,
			similarity: Some(similarity),
			source: EntrySource::Similarity,
			item: candidate.item,
		});
	}

	scored.sort_by(|a, b| {
		similarity::cmp_f32_desc(
			a.similarity.unwrap_or(f32::NAN),
			b.similarity.unwrap_or(f32::NAN),
		)
	});

	scored
}

/// How many fallback entries are needed to reach `min_results`.
pub fn fallback_shortfall(scored: usize, min_results: u32) -> usize {
	(min_results as usize).saturating_sub(scored)
}

/// Appends recency-ordered fallback candidates after the scored entries until `min_results` is
/// reached or the fallback list runs out. Fallback entries never precede scored ones.
pub fn pad_with_fallback<T>(
	mut entries: Vec<FeedEntry<T>>,
	fallback: Vec<RecentCandidate<T>>,
	excluded: &ExclusionSet,
	min_results: u32,
) -> Vec<FeedEntry<T>> {
	let mut needed = fallback_shortfall(entries.len(), min_results);

	if needed == 0 {
		return entries;
	}

	let mut included: HashSet<Uuid> = entries.iter().map(|entry| entry.user_id).collect();

	for candidate in fallback {
		if needed == 0 {
			break;
		}
		if excluded.contains(&candidate.user_id) || !included.insert(candidate.user_id) {
			continue;
		}

		entries.push(FeedEntry {
			user_id: candidate.user_id,
			similarity: None,
			source: EntrySource::Recency,
			item: candidate.item,
		});

		needed -= 1;
	}

	entries
}

/// Slices the ordered feed. A page past the end yields no entries but keeps the totals.
pub fn paginate<T>(entries: Vec<FeedEntry<T>>, request: PageRequest) -> FeedPage<T> {
	let total = entries.len();
	let pages = request.pages_for(total);
	let entries = entries.into_iter().skip(request.offset()).take(request.limit as usize).collect();

	FeedPage { entries, total, page: request.page, limit: request.limit, pages }
}
