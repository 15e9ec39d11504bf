pub mod backfill;
pub mod connections;
pub mod feed;
pub mod profiles;
pub mod referrals;
pub mod search;
pub mod time_serde;

mod error;

pub use backfill::BackfillReport;
pub use connections::{
	CancelRequest, ConnectionItem, ConnectionOp, ConnectionResponse, ConnectionsResponse,
	Direction, ReceivedRequest, ReceivedRequestsResponse, RelationshipStatusResponse,
	ReviewRequest, SendRequest,
};
pub use error::{Error, Result};
pub use feed::{FeedItem, FeedRequest, FeedResponse};
pub use profiles::{CreateProfileRequest, CreateProfileResponse, EmbeddingStatus};
pub use referrals::{
	MyReferralsResponse, ReferralItem, ReferralResponse, ReferralView, ReviewReferralRequest,
	SendReferralRequest,
};
pub use search::{
	NameSuggestion, PopularSkillsResponse, SearchRequest, SearchResponse, SkillCount,
	SuggestionsRequest, SuggestionsResponse,
};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use devmatch_config::{Config, EmbeddingProviderConfig};
use devmatch_domain::{
	connection::{ConnectionState, ConnectionStatus},
	referral::ReferralStatus,
};
use devmatch_providers::embedding;
use devmatch_storage::{
	chat,
	db::Db,
	models::{ConnectionRequest, Profile},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	/// `None` means the vector is unavailable. Implementations never fail loudly.
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Option<Vec<f32>>>;
}

/// Sets up the two-member chat channel for an accepted connection.
///
/// Runs on the accepting transaction's connection, so a failure here rolls the acceptance back
/// and a rollback discards whatever the provisioner wrote.
pub trait ChannelProvisioner
where
	Self: Send + Sync,
{
	fn provision<'a>(
		&'a self,
		conn: &'a mut PgConnection,
		member_a: Uuid,
		member_b: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<ChannelRef>>;
}

pub trait Notifier
where
	Self: Send + Sync,
{
	fn notify(&self, event: &LifecycleEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
	pub room_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
	RequestSent { request_id: Uuid, from_user: Uuid, to_user: Uuid },
	RequestAccepted { request_id: Uuid, from_user: Uuid, to_user: Uuid, room_id: Uuid },
	RequestDeclined { request_id: Uuid, from_user: Uuid, to_user: Uuid },
	RequestCancelled { request_id: Uuid, from_user: Uuid, to_user: Uuid },
	ReferralSent { referral_id: Uuid, from_user: Uuid, to_user: Uuid },
	ReferralReviewed { referral_id: Uuid, from_user: Uuid, to_user: Uuid, status: ReferralStatus },
}
impl LifecycleEvent {
	pub fn name(&self) -> &'static str {
		match self {
			Self::RequestSent { .. } => "request_sent",
			Self::RequestAccepted { .. } => "request_accepted",
			Self::RequestDeclined { .. } => "request_declined",
			Self::RequestCancelled { .. } => "request_cancelled",
			Self::ReferralSent { .. } => "referral_sent",
			Self::ReferralReviewed { .. } => "referral_reviewed",
		}
	}

	/// The user the event is addressed to.
	pub fn recipient(&self) -> Uuid {
		match *self {
			Self::RequestSent { to_user, .. }
			| Self::RequestCancelled { to_user, .. }
			| Self::ReferralSent { to_user, .. } => to_user,
			Self::RequestAccepted { from_user, .. }
			| Self::RequestDeclined { from_user, .. }
			| Self::ReferralReviewed { from_user, .. } => from_user,
		}
	}
}

/// Logs lifecycle events. Used when no real-time transport is wired in.
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify(&self, event: &LifecycleEvent) {
		tracing::info!(event = event.name(), recipient = %event.recipient(), "Lifecycle event.");
	}
}

/// Stores chat rooms in the `chat_rooms` table.
pub struct StoreChannelProvisioner;
impl ChannelProvisioner for StoreChannelProvisioner {
	fn provision<'a>(
		&'a self,
		conn: &'a mut PgConnection,
		member_a: Uuid,
		member_b: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<ChannelRef>> {
		Box::pin(async move {
			let room = chat::find_or_create_room(conn, member_a, member_b, now).await?;

			Ok(ChannelRef { room_id: room.room_id })
		})
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub channels: Arc<dyn ChannelProvisioner>,
	pub notifier: Arc<dyn Notifier>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		channels: Arc<dyn ChannelProvisioner>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self { embedding, channels, notifier }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self {
			embedding: Arc::new(DefaultProviders),
			channels: Arc::new(StoreChannelProvisioner),
			notifier: Arc::new(TracingNotifier),
		}
	}
}

pub struct MatchService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl MatchService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
	pub user_id: Uuid,
	pub first_name: String,
	pub last_name: String,
	pub photo_url: Option<String>,
	pub age: Option<i32>,
	pub gender: Option<String>,
	pub about: String,
	pub skills: Vec<String>,
	pub has_embedding: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<&Profile> for ProfileView {
	fn from(profile: &Profile) -> Self {
		Self {
			user_id: profile.user_id,
			first_name: profile.first_name.clone(),
			last_name: profile.last_name.clone(),
			photo_url: profile.photo_url.clone(),
			age: profile.age,
			gender: profile.gender.clone(),
			about: profile.about.clone(),
			skills: profile.skills.clone(),
			has_embedding: profile.cached_embedding().is_some(),
			created_at: profile.created_at,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionView {
	pub request_id: Uuid,
	pub from_user: Uuid,
	pub to_user: Uuid,
	pub status: ConnectionStatus,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl TryFrom<&ConnectionRequest> for ConnectionView {
	type Error = Error;

	fn try_from(record: &ConnectionRequest) -> Result<Self> {
		Ok(Self {
			request_id: record.request_id,
			from_user: record.from_user,
			to_user: record.to_user,
			status: stored_status(record)?,
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Option<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

pub(crate) fn stored_status(record: &ConnectionRequest) -> Result<ConnectionStatus> {
	record.status.parse().map_err(|err| Error::Storage {
		message: format!("Connection request {} has a corrupt status: {err}", record.request_id),
	})
}

pub(crate) fn connection_state(record: &ConnectionRequest) -> Result<ConnectionState> {
	Ok(ConnectionState {
		from_user: record.from_user,
		to_user: record.to_user,
		status: stored_status(record)?,
	})
}
