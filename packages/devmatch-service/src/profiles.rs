use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, MatchService, ProfileView, Result};
use devmatch_domain::profile_text;
use devmatch_storage::{models::Profile, profiles};

const MAX_NAME_CHARS: usize = 50;
const MAX_AGE: u32 = 150;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProfileRequest {
	/// Identity issued by the auth layer. A fresh id is assigned when absent.
	#[serde(default)]
	pub user_id: Option<Uuid>,
	pub first_name: String,
	#[serde(default)]
	pub last_name: String,
	#[serde(default)]
	pub photo_url: Option<String>,
	#[serde(default)]
	pub age: Option<u32>,
	#[serde(default)]
	pub gender: Option<String>,
	#[serde(default)]
	pub about: String,
	#[serde(default)]
	pub skills: Vec<String>,
}

/// Outcome of the post-signup embedding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
	Stored,
	/// No text to embed.
	Skipped,
	Unavailable,
	PersistFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileResponse {
	pub profile: ProfileView,
	pub embedding: EmbeddingStatus,
}

impl MatchService {
	/// Registers a profile, then embeds its text outside the insert.
	///
	/// The embedding step never fails the signup; its outcome is reported in the response.
	pub async fn create_profile(&self, req: CreateProfileRequest) -> Result<CreateProfileResponse> {
		let mut profile = validate_create(req, OffsetDateTime::now_utc())?;

		profiles::insert_profile(&self.db.pool, &profile).await?;

		tracing::info!(user_id = %profile.user_id, "Profile created.");

		let embedding = self.embed_new_profile(&mut profile).await;

		Ok(CreateProfileResponse { profile: ProfileView::from(&profile), embedding })
	}

	pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileView> {
		let profile = profiles::get_profile(&self.db.pool, user_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Profile not found.".to_string() })?;

		Ok(ProfileView::from(&profile))
	}

	async fn embed_new_profile(&self, profile: &mut Profile) -> EmbeddingStatus {
		let Some(text) = profile_text::embedding_input(&profile.skills, &profile.about) else {
			return EmbeddingStatus::Skipped;
		};
		let Some(vec) = self.providers.embedding.embed(&self.cfg.providers.embedding, &text).await
		else {
			tracing::warn!(user_id = %profile.user_id, "Signup embedding unavailable.");

			return EmbeddingStatus::Unavailable;
		};

		if vec.is_empty() {
			return EmbeddingStatus::Unavailable;
		}

		let now = OffsetDateTime::now_utc();

		match profiles::set_embedding(&self.db, profile.user_id, &vec, now).await {
			Ok(()) => {
				profile.embedding = Some(vec);
				profile.embedding_updated_at = Some(now);

				EmbeddingStatus::Stored
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					user_id = %profile.user_id,
					"Failed to persist signup embedding."
				);

				EmbeddingStatus::PersistFailed
			},
		}
	}
}

pub(crate) fn validate_create(req: CreateProfileRequest, now: OffsetDateTime) -> Result<Profile> {
	let first_name = req.first_name.trim();
	let last_name = req.last_name.trim();

	if first_name.is_empty() {
		return Err(Error::InvalidRequest { message: "first_name is required.".to_string() });
	}
	if first_name.chars().count() > MAX_NAME_CHARS || last_name.chars().count() > MAX_NAME_CHARS {
		return Err(Error::InvalidRequest {
			message: format!("Names must be at most {MAX_NAME_CHARS} characters."),
		});
	}

	let age = match req.age {
		Some(age) if age > MAX_AGE => {
			return Err(Error::InvalidRequest {
				message: format!("age must be at most {MAX_AGE}."),
			});
		},
		Some(age) => Some(age as i32),
		None => None,
	};
	let photo_url = req.photo_url.map(|url| url.trim().to_string()).filter(|url| !url.is_empty());
	let gender = req.gender.map(|gender| gender.trim().to_string()).filter(|g| !g.is_empty());

	Ok(Profile {
		user_id: req.user_id.unwrap_or_else(Uuid::new_v4),
		first_name: first_name.to_string(),
		last_name: last_name.to_string(),
		photo_url,
		age,
		gender,
		about: req.about.trim().to_string(),
		skills: profile_text::normalize_skills(&req.skills),
		embedding: None,
		embedding_updated_at: None,
		created_at: now,
		updated_at: now,
	})
}
