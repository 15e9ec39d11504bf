use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ChannelRef, LifecycleEvent, ConnectionView, Error, MatchService, ProfileView, Result};
use devmatch_domain::connection::{self, ConnectionStatus, ReviewAction, ReviewOutcome, SendIntent};
use devmatch_storage::{connections, models::ConnectionRequest, profiles};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendRequest {
	pub to_user: Uuid,
	pub intent: SendIntent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
	pub request_id: Uuid,
	pub action: ReviewAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelRequest {
	pub request_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionOp {
	Created,
	Accepted,
	Declined,
	Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
	pub success: bool,
	pub message: String,
	pub op: ConnectionOp,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub record: Option<ConnectionView>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub channel: Option<ChannelRef>,
}
impl ConnectionResponse {
	fn ok(op: ConnectionOp, message: impl Into<String>, record: Option<ConnectionView>) -> Self {
		Self { success: true, message: message.into(), op, record, channel: None }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedRequest {
	pub request: ConnectionView,
	pub sender: Option<ProfileView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedRequestsResponse {
	pub requests: Vec<ReceivedRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionItem {
	pub request_id: Uuid,
	#[serde(with = "crate::time_serde")]
	pub since: OffsetDateTime,
	pub profile: ProfileView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsResponse {
	pub connections: Vec<ConnectionItem>,
}

/// Which side of the record the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	Outgoing,
	Incoming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipStatusResponse {
	pub other_user: Uuid,
	pub status: Option<ConnectionStatus>,
	pub direction: Option<Direction>,
	pub record: Option<ConnectionView>,
}

impl MatchService {
	pub async fn send_request(
		&self,
		from_user: Uuid,
		req: SendRequest,
	) -> Result<ConnectionResponse> {
		connection::check_send(from_user, req.to_user)?;

		if !profiles::profile_exists(&self.db.pool, from_user).await? {
			return Err(Error::NotFound { message: "Sender profile not found.".to_string() });
		}
		if !profiles::profile_exists(&self.db.pool, req.to_user).await? {
			return Err(Error::NotFound { message: "Recipient not found.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let status = req.intent.initial_status();
		let record = ConnectionRequest {
			request_id: Uuid::new_v4(),
			from_user,
			to_user: req.to_user,
			status: status.as_str().to_string(),
			created_at: now,
			updated_at: now,
		};

		if !connections::insert_connection(&self.db.pool, &record).await? {
			return Err(Error::Conflict {
				message: "A connection request already exists between these users.".to_string(),
			});
		}

		tracing::info!(
			request_id = %record.request_id,
			from_user = %from_user,
			to_user = %req.to_user,
			status = %status,
			"Connection request created."
		);

		let message = match status {
			ConnectionStatus::Pending => {
				self.providers.notifier.notify(&LifecycleEvent::RequestSent {
					request_id: record.request_id,
					from_user,
					to_user: req.to_user,
				});

				"Connection request sent."
			},
			_ => "User ignored.",
		};

		Ok(ConnectionResponse::ok(
			ConnectionOp::Created,
			message,
			Some(ConnectionView::try_from(&record)?),
		))
	}

	/// Accepts or declines a pending request addressed to `actor`.
	///
	/// The record stays locked for the whole transition. Acceptance provisions the chat channel
	/// before committing, so a provisioning failure leaves the request pending.
	pub async fn review_request(
		&self,
		actor: Uuid,
		req: ReviewRequest,
	) -> Result<ConnectionResponse> {
		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;
		let record = connections::get_connection_for_update(&mut *tx, req.request_id)
			.await?
			.ok_or_else(|| Error::NotFound {
				message: "Connection request not found.".to_string(),
			})?;
		let state = crate::connection_state(&record)?;

		match connection::check_review(&state, actor, req.action)? {
			ReviewOutcome::Accept => {
				let accepted = connections::update_status(
					&mut *tx,
					record.request_id,
					ConnectionStatus::Accepted.as_str(),
					now,
				)
				.await?;
				let channel = self
					.providers
					.channels
					.provision(&mut *tx, record.from_user, record.to_user, now)
					.await?;

				tx.commit().await?;

				tracing::info!(
					request_id = %record.request_id,
					room_id = %channel.room_id,
					"Connection request accepted."
				);

				self.providers.notifier.notify(&LifecycleEvent::RequestAccepted {
					request_id: record.request_id,
					from_user: record.from_user,
					to_user: record.to_user,
					room_id: channel.room_id,
				});

				let mut response = ConnectionResponse::ok(
					ConnectionOp::Accepted,
					"Connection request accepted.",
					Some(ConnectionView::try_from(&accepted)?),
				);

				response.channel = Some(channel);

				Ok(response)
			},
			ReviewOutcome::Delete => {
				connections::delete_connection(&mut *tx, record.request_id).await?;
				tx.commit().await?;

				tracing::info!(request_id = %record.request_id, "Connection request declined.");

				self.providers.notifier.notify(&LifecycleEvent::RequestDeclined {
					request_id: record.request_id,
					from_user: record.from_user,
					to_user: record.to_user,
				});

				Ok(ConnectionResponse::ok(
					ConnectionOp::Declined,
					"Connection request declined.",
					None,
				))
			},
		}
	}

	/// Withdraws a pending request `actor` sent.
	pub async fn cancel_request(
		&self,
		actor: Uuid,
		req: CancelRequest,
	) -> Result<ConnectionResponse> {
		let mut tx = self.db.pool.begin().await?;
		let record = connections::get_connection_for_update(&mut *tx, req.request_id)
			.await?
			.ok_or_else(|| Error::NotFound {
				message: "Connection request not found.".to_string(),
			})?;
		let state = crate::connection_state(&record)?;

		connection::check_cancel(&state, actor)?;
		connections::delete_connection(&mut *tx, record.request_id).await?;
		tx.commit().await?;

		tracing::info!(request_id = %record.request_id, "Connection request cancelled.");

		self.providers.notifier.notify(&LifecycleEvent::RequestCancelled {
			request_id: record.request_id,
			from_user: record.from_user,
			to_user: record.to_user,
		});

		Ok(ConnectionResponse::ok(ConnectionOp::Cancelled, "Connection request cancelled.", None))
	}

	/// Pending requests addressed to `user_id`, newest first.
	pub async fn received_requests(&self, user_id: Uuid) -> Result<ReceivedRequestsResponse> {
		let records = connections::list_received_pending(&self.db, user_id).await?;
		let sender_ids: Vec<Uuid> = records.iter().map(|record| record.from_user).collect();
		let senders: HashMap<Uuid, ProfileView> =
			profiles::list_profiles_by_ids(&self.db, &sender_ids)
				.await?
				.iter()
				.map(|profile| (profile.user_id, ProfileView::from(profile)))
				.collect();
		let mut requests = Vec::with_capacity(records.len());

		for record in &records {
			requests.push(ReceivedRequest {
				request: ConnectionView::try_from(record)?,
				sender: senders.get(&record.from_user).cloned(),
			});
		}

		Ok(ReceivedRequestsResponse { requests })
	}

	/// Counterpart profiles of every accepted record involving `user_id`.
	pub async fn connections(&self, user_id: Uuid) -> Result<ConnectionsResponse> {
		let records = connections::list_accepted_for_user(&self.db, user_id).await?;
		let counterpart_ids: Vec<Uuid> = records
			.iter()
			.map(|record| {
				if record.from_user == user_id { record.to_user } else { record.from_user }
			})
			.collect();
		let mut counterparts: HashMap<Uuid, ProfileView> =
			profiles::list_profiles_by_ids(&self.db, &counterpart_ids)
				.await?
				.iter()
				.map(|profile| (profile.user_id, ProfileView::from(profile)))
				.collect();
		let connections = records
			.iter()
			.zip(counterpart_ids)
			.filter_map(|(record, counterpart)| {
				Some(ConnectionItem {
					request_id: record.request_id,
					since: record.updated_at,
					profile: counterparts.remove(&counterpart)?,
				})
			})
			.collect();

		Ok(ConnectionsResponse { connections })
	}

	/// The record between `user_id` and `other_user`, if any.
	pub async fn relationship_status(
		&self,
		user_id: Uuid,
		other_user: Uuid,
	) -> Result<RelationshipStatusResponse> {
		if user_id == other_user {
			return Err(Error::InvalidRequest {
				message: "other_user must differ from the requester.".to_string(),
			});
		}

		let Some(record) = connections::find_between(&self.db, user_id, other_user).await? else {
			return Ok(RelationshipStatusResponse {
				other_user,
				status: None,
				direction: None,
				record: None,
			});
		};
		let view = ConnectionView::try_from(&record)?;
		let direction =
			if record.from_user == user_id { Direction::Outgoing } else { Direction::Incoming };

		Ok(RelationshipStatusResponse {
			other_user,
			status: Some(view.status),
			direction: Some(direction),
			record: Some(view),
		})
	}
}
