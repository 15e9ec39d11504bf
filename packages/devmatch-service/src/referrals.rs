use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, LifecycleEvent, MatchService, ProfileView, Result};
use devmatch_domain::referral::{self, ReferralAction, ReferralState, ReferralStatus};
use devmatch_storage::{models::ReferralRequest, profiles, referrals};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendReferralRequest {
	pub to_user: Uuid,
	pub company: String,
	pub role: String,
	#[serde(default)]
	pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewReferralRequest {
	pub referral_id: Uuid,
	pub action: ReferralAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralView {
	pub referral_id: Uuid,
	pub from_user: Uuid,
	pub to_user: Uuid,
	pub company: String,
	pub role: String,
	pub message: Option<String>,
	pub status: ReferralStatus,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl TryFrom<&ReferralRequest> for ReferralView {
	type Error = Error;

	fn try_from(record: &ReferralRequest) -> Result<Self> {
		Ok(Self {
			referral_id: record.referral_id,
			from_user: record.from_user,
			to_user: record.to_user,
			company: record.company.clone(),
			role: record.role.clone(),
			message: record.message.clone(),
			status: stored_status(record)?,
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralResponse {
	pub success: bool,
	pub message: String,
	pub referral: ReferralView,
}

/// A referral with the profile on the other side of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralItem {
	pub referral: ReferralView,
	pub counterpart: Option<ProfileView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyReferralsResponse {
	pub sent: Vec<ReferralItem>,
	pub received: Vec<ReferralItem>,
}

impl MatchService {
	/// Asks `to_user` for a referral at a company and role. The same ask may only be made once.
	pub async fn send_referral(
		&self,
		from_user: Uuid,
		req: SendReferralRequest,
	) -> Result<ReferralResponse> {
		let ask = referral::check_send(
			from_user,
			req.to_user,
			&req.company,
			&req.role,
			req.message.as_deref(),
		)?;

		if !profiles::profile_exists(&self.db.pool, from_user).await? {
			return Err(Error::NotFound { message: "Sender profile not found.".to_string() });
		}
		if !profiles::profile_exists(&self.db.pool, req.to_user).await? {
			return Err(Error::NotFound { message: "Recipient not found.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let record = ReferralRequest {
			referral_id: Uuid::new_v4(),
			from_user,
			to_user: req.to_user,
			company: ask.company,
			role: ask.role,
			message: ask.message,
			status: ReferralStatus::Pending.as_str().to_string(),
			created_at: now,
			updated_at: now,
		};

		if !referrals::insert_referral(&self.db.pool, &record).await? {
			return Err(Error::Conflict {
				message: "Referral already requested for this company and role.".to_string(),
			});
		}

		tracing::info!(
			referral_id = %record.referral_id,
			from_user = %from_user,
			to_user = %req.to_user,
			"Referral requested."
		);

		self.providers.notifier.notify(&LifecycleEvent::ReferralSent {
			referral_id: record.referral_id,
			from_user,
			to_user: req.to_user,
		});

		Ok(ReferralResponse {
			success: true,
			message: "Referral sent.".to_string(),
			referral: ReferralView::try_from(&record)?,
		})
	}

	/// Referrals `user_id` asked for and referrals asked of them, newest first.
	pub async fn my_referrals(&self, user_id: Uuid) -> Result<MyReferralsResponse> {
		let sent = referrals::list_sent(&self.db, user_id).await?;
		let received = referrals::list_received(&self.db, user_id).await?;
		let counterpart_ids: Vec<Uuid> = sent
			.iter()
			.map(|record| record.to_user)
			.chain(received.iter().map(|record| record.from_user))
			.collect();
		let counterparts: HashMap<Uuid, ProfileView> =
			profiles::list_profiles_by_ids(&self.db, &counterpart_ids)
				.await?
				.iter()
				.map(|profile| (profile.user_id, ProfileView::from(profile)))
				.collect();
		let item = |record: &ReferralRequest, counterpart: Uuid| -> Result<ReferralItem> {
			Ok(ReferralItem {
				referral: ReferralView::try_from(record)?,
				counterpart: counterparts.get(&counterpart).cloned(),
			})
		};

		Ok(MyReferralsResponse {
			sent: sent.iter().map(|record| item(record, record.to_user)).collect::<Result<_>>()?,
			received: received
				.iter()
				.map(|record| item(record, record.from_user))
				.collect::<Result<_>>()?,
		})
	}

	/// Accepts or rejects a pending referral addressed to `actor`.
	pub async fn review_referral(
		&self,
		actor: Uuid,
		req: ReviewReferralRequest,
	) -> Result<ReferralResponse> {
		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;
		let record = referrals::get_referral_for_update(&mut *tx, req.referral_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Referral not found.".to_string() })?;
		let state = ReferralState {
			from_user: record.from_user,
			to_user: record.to_user,
			status: stored_status(&record)?,
		};
		let status = referral::check_review(&state, actor, req.action)?;
		let updated =
			referrals::update_referral_status(&mut *tx, record.referral_id, status.as_str(), now)
				.await?;

		tx.commit().await?;

		tracing::info!(referral_id = %record.referral_id, status = %status, "Referral reviewed.");

		self.providers.notifier.notify(&LifecycleEvent::ReferralReviewed {
			referral_id: record.referral_id,
			from_user: record.from_user,
			to_user: record.to_user,
			status,
		});

		Ok(ReferralResponse {
			success: true,
			message: format!("Referral {status}."),
			referral: ReferralView::try_from(&updated)?,
		})
	}
}

fn stored_status(record: &ReferralRequest) -> Result<ReferralStatus> {
	record.status.parse().map_err(|err| Error::Storage {
		message: format!("Referral {} has a corrupt status: {err}", record.referral_id),
	})
}
