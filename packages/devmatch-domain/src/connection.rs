use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored status of a connection record. Declined, rejected and cancelled requests are deleted,
/// so they have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
	#[serde(alias = "intrested", alias = "interested")]
	Pending,
	Accepted,
	Ignored,
}
impl ConnectionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Accepted => "accepted",
			Self::Ignored => "ignored",
		}
	}
}
impl fmt::Display for ConnectionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for ConnectionStatus {
	type Err = UnknownValue;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"pending" | "intrested" | "interested" => Ok(Self::Pending),
			"accepted" => Ok(Self::Accepted),
			"ignored" => Ok(Self::Ignored),
			other => Err(UnknownValue { kind: "status", value: other.to_string() }),
		}
	}
}

/// What the sender expresses when creating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendIntent {
	#[serde(alias = "intrested", alias = "interested")]
	Pending,
	Ignored,
}
impl SendIntent {
	pub fn initial_status(self) -> ConnectionStatus {
		match self {
			Self::Pending => ConnectionStatus::Pending,
			Self::Ignored => ConnectionStatus::Ignored,
		}
	}
}
impl FromStr for SendIntent {
	type Err = UnknownValue;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"pending" | "intrested" | "interested" => Ok(Self::Pending),
			"ignored" => Ok(Self::Ignored),
			other => Err(UnknownValue { kind: "intent", value: other.to_string() }),
		}
	}
}

/// The recipient's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
	#[serde(alias = "accepted")]
	Accept,
	#[serde(alias = "declined", alias = "reject", alias = "rejected")]
	Decline,
}
impl FromStr for ReviewAction {
	type Err = UnknownValue;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"accept" | "accepted" => Ok(Self::Accept),
			"decline" | "declined" | "reject" | "rejected" => Ok(Self::Decline),
			other => Err(UnknownValue { kind: "action", value: other.to_string() }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}.")]
pub struct UnknownValue {
	pub kind: &'static str,
	pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
	#[error("Cannot send a connection request to yourself.")]
	SelfRequest,
	#[error("Only the recipient may review this request.")]
	NotRecipient,
	#[error("Only the sender may cancel this request.")]
	NotSender,
	#[error("Request is {status}, not pending.")]
	NotPending { status: ConnectionStatus },
}

/// The parts of a connection record the state machine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
	pub from_user: Uuid,
	pub to_user: Uuid,
	pub status: ConnectionStatus,
}
impl ConnectionState {
	pub fn involves(&self, user_id: Uuid) -> bool {
		self.from_user == user_id || self.to_user == user_id
	}

	pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
		if self.from_user == user_id {
			Some(self.to_user)
		} else if self.to_user == user_id {
			Some(self.from_user)
		} else {
			None
		}
	}
}

/// What a successful review does to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
	/// Set the status to accepted and provision a chat channel.
	Accept,
	/// Delete the record.
	Delete,
}

pub fn check_send(from_user: Uuid, to_user: Uuid) -> Result<(), TransitionError> {
	if from_user == to_user {
		return Err(TransitionError::SelfRequest);
	}

	Ok(())
}

pub fn check_review(
	state: &ConnectionState,
	actor: Uuid,
	action: ReviewAction,
) -> Result<ReviewOutcome, TransitionError> {
	if state.to_user != actor {
		return Err(TransitionError::NotRecipient);
	}
	if state.status != ConnectionStatus::Pending {
		return Err(TransitionError::NotPending { status: state.status });
	}

	Ok(match action {
		ReviewAction::Accept => ReviewOutcome::Accept,
		ReviewAction::Decline => ReviewOutcome::Delete,
	})
}

pub fn check_cancel(state: &ConnectionState, actor: Uuid) -> Result<(), TransitionError> {
	if state.from_user != actor {
		return Err(TransitionError::NotSender);
	}
	if state.status != ConnectionStatus::Pending {
		return Err(TransitionError::NotPending { status: state.status });
	}

	Ok(())
}

/// Normalised key of the unordered pair `{a, b}`.
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
	if a <= b { (a, b) } else { (b, a) }
}
