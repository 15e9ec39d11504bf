use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MatchService, ProfileView, Result};
use devmatch_domain::{
	feed::PageRequest,
	search::{self, SearchFilter},
};
use devmatch_storage::profiles::{self, ProfileSearch};

const SUGGESTION_LIMIT: i64 = 5;
const POPULAR_SKILLS_LIMIT: i64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
	/// Matches first name, last name, or any skill.
	pub query: Option<String>,
	pub skill: Option<String>,
	pub age_min: Option<u32>,
	pub age_max: Option<u32>,
	pub gender: Option<String>,
	pub page: Option<u32>,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub data: Vec<ProfileView>,
	pub total: usize,
	pub page: u32,
	pub limit: u32,
	pub pages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestionsRequest {
	#[serde(default)]
	pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSuggestion {
	pub user_id: Uuid,
	pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionsResponse {
	pub names: Vec<NameSuggestion>,
	pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCount {
	pub name: String,
	pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularSkillsResponse {
	pub data: Vec<SkillCount>,
}

impl MatchService {
	/// Filtered profile search for `user_id`, newest first, hiding the same users the feed
	/// hides.
	pub async fn search(&self, user_id: Uuid, req: SearchRequest) -> Result<SearchResponse> {
		let page = PageRequest::resolve(
			req.page,
			req.limit,
			self.cfg.feed.default_limit,
			self.cfg.feed.max_limit,
		)?;
		let filter = SearchFilter::new(
			req.query.as_deref(),
			req.skill.as_deref(),
			req.age_min,
			req.age_max,
			req.gender.as_deref(),
		)?;
		let text = filter.text.as_deref().map(search::contains_pattern);
		let skill = filter.skill.as_deref().map(search::contains_pattern);
		let params = ProfileSearch {
			text: text.as_deref(),
			skill: skill.as_deref(),
			age_min: filter.age_min.map(|age| age as i32),
			age_max: filter.age_max.map(|age| age as i32),
			gender: filter.gender.as_deref(),
		};
		let excluded = self.exclusion_set(user_id).await?.to_vec();
		let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
		let (rows, total) = profiles::search_profiles(
			&self.db,
			&params,
			&excluded,
			i64::from(page.limit),
			offset,
		)
		.await?;
		let total = usize::try_from(total).unwrap_or_default();

		tracing::debug!(user_id = %user_id, total, excluded = excluded.len(), "Profile search.");

		Ok(SearchResponse {
			data: rows.iter().map(ProfileView::from).collect(),
			total,
			page: page.page,
			limit: page.limit,
			pages: page.pages_for(total),
		})
	}

	/// Name and skill completions for a partial query. Terms shorter than two characters
	/// suggest nothing.
	pub async fn search_suggestions(
		&self,
		user_id: Uuid,
		req: SuggestionsRequest,
	) -> Result<SuggestionsResponse> {
		let Some(term) = search::suggestion_term(&req.query) else {
			return Ok(SuggestionsResponse::default());
		};
		let pattern = search::contains_pattern(term);
		let names = profiles::suggest_names(&self.db, &pattern, &[user_id], SUGGESTION_LIMIT)
			.await?
			.into_iter()
			.map(|(user_id, first_name, last_name)| NameSuggestion {
				user_id,
				name: format!("{first_name} {last_name}").trim_end().to_string(),
			})
			.collect();
		let skills = profiles::skill_counts(&self.db, Some(&pattern), SUGGESTION_LIMIT)
			.await?
			.into_iter()
			.map(|(skill, _)| skill)
			.collect();

		Ok(SuggestionsResponse { names, skills })
	}

	/// The most listed skills across all profiles.
	pub async fn popular_skills(&self) -> Result<PopularSkillsResponse> {
		let data = profiles::skill_counts(&self.db, None, POPULAR_SKILLS_LIMIT)
			.await?
			.into_iter()
			.map(|(name, count)| SkillCount { name, count })
			.collect();

		Ok(PopularSkillsResponse { data })
	}
}
