use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
	pub user_id: Uuid,
	pub first_name: String,
	pub last_name: String,
	pub photo_url: Option<String>,
	pub age: Option<i32>,
	pub gender: Option<String>,
	pub about: String,
	pub skills: Vec<String>,
	pub embedding: Option<Vec<f32>>,
	pub embedding_updated_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Profile {
	/// The cached embedding, when present and non-empty.
	pub fn cached_embedding(&self) -> Option<&[f32]> {
		self.embedding.as_deref().filter(|vec| !vec.is_empty())
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConnectionRequest {
	pub request_id: Uuid,
	pub from_user: Uuid,
	pub to_user: Uuid,
	pub status: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatRoom {
	pub room_id: Uuid,
	pub member_low: Uuid,
	pub member_high: Uuid,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReferralRequest {
	pub referral_id: Uuid,
	pub from_user: Uuid,
	pub to_user: Uuid,
	pub company: String,
	pub role: String,
	pub message: Option<String>,
	pub status: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
