use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connection::UnknownValue;

const MAX_FIELD_CHARS: usize = 100;
const MAX_MESSAGE_CHARS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
	Pending,
	Accepted,
	Rejected,
}
impl ReferralStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Accepted => "accepted",
			Self::Rejected => "rejected",
		}
	}
}
impl fmt::Display for ReferralStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for ReferralStatus {
	type Err = UnknownValue;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"pending" => Ok(Self::Pending),
			"accepted" => Ok(Self::Accepted),
			"rejected" => Ok(Self::Rejected),
			other => Err(UnknownValue { kind: "referral status", value: other.to_string() }),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralAction {
	#[serde(alias = "accepted")]
	Accept,
	#[serde(alias = "rejected", alias = "decline", alias = "declined")]
	Reject,
}
impl ReferralAction {
	pub fn resulting_status(self) -> ReferralStatus {
		match self {
			Self::Accept => ReferralStatus::Accepted,
			Self::Reject => ReferralStatus::Rejected,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferralError {
	#[error("Cannot ask yourself for a referral.")]
	SelfReferral,
	#[error("{field} is required.")]
	MissingField { field: &'static str },
	#[error("{field} must be at most {max} characters.")]
	TooLong { field: &'static str, max: usize },
	#[error("Only the recipient may review this referral.")]
	NotRecipient,
	#[error("Referral is {status}, not pending.")]
	NotPending { status: ReferralStatus },
}

/// A referral ask with trimmed, validated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralAsk {
	pub company: String,
	pub role: String,
	pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralState {
	pub from_user: Uuid,
	pub to_user: Uuid,
	pub status: ReferralStatus,
}

pub fn check_send(
	from_user: Uuid,
	to_user: Uuid,
	company: &str,
	role: &str,
	message: Option<&str>,
) -> Result<ReferralAsk, ReferralError> {
	if from_user == to_user {
		return Err(ReferralError::SelfReferral);
	}

	let company = required(company, "company")?;
	let role = required(role, "role")?;
	let message = message.map(str::trim).filter(|message| !message.is_empty());

	if message.is_some_and(|message| message.chars().count() > MAX_MESSAGE_CHARS) {
		return Err(ReferralError::TooLong { field: "message", max: MAX_MESSAGE_CHARS });
	}

	Ok(ReferralAsk { company, role, message: message.map(str::to_string) })
}

/// Only the recipient decides, and only once.
pub fn check_review(
	state: &ReferralState,
	actor: Uuid,
	action: ReferralAction,
) -> Result<ReferralStatus, ReferralError> {
	if state.to_user != actor {
		return Err(ReferralError::NotRecipient);
	}
	if state.status != ReferralStatus::Pending {
		return Err(ReferralError::NotPending { status: state.status });
	}

	Ok(action.resulting_status())
}

fn required(raw: &str, field: &'static str) -> Result<String, ReferralError> {
	let value = raw.trim();

	if value.is_empty() {
		return Err(ReferralError::MissingField { field });
	}
	if value.chars().count() > MAX_FIELD_CHARS {
		return Err(ReferralError::TooLong { field, max: MAX_FIELD_CHARS });
	}

	Ok(value.to_string())
}
