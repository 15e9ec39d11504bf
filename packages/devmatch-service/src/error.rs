use devmatch_domain::{
	connection::TransitionError, feed::PageError, referral::ReferralError, search::SearchError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Forbidden: {message}")]
	Forbidden { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Invalid transition: {message}")]
	InvalidTransition { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<devmatch_storage::Error> for Error {
	fn from(err: devmatch_storage::Error) -> Self {
		match err {
			devmatch_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			devmatch_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			devmatch_storage::Error::NotFound(message) => Self::NotFound { message },
			devmatch_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<TransitionError> for Error {
	fn from(err: TransitionError) -> Self {
		let message = err.to_string();

		match err {
			TransitionError::SelfRequest => Self::InvalidRequest { message },
			TransitionError::NotRecipient | TransitionError::NotSender => Self::Forbidden { message },
			TransitionError::NotPending { .. } => Self::InvalidTransition { message },
		}
	}
}

impl From<PageError> for Error {
	fn from(err: PageError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

impl From<ReferralError> for Error {
	fn from(err: ReferralError) -> Self {
		let message = err.to_string();

		match err {
			ReferralError::SelfReferral
			| ReferralError::MissingField { .. }
			| ReferralError::TooLong { .. } => Self::InvalidRequest { message },
			ReferralError::NotRecipient => Self::Forbidden { message },
			ReferralError::NotPending { .. } => Self::InvalidTransition { message },
		}
	}
}

impl From<SearchError> for Error {
	fn from(err: SearchError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
