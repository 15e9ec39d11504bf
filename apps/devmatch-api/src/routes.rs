use axum::{
	Json, Router,
	extract::{
		FromRequestParts, Path, Query, State,
		rejection::{JsonRejection, PathRejection, QueryRejection},
	},
	http::{StatusCode, request::Parts},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;
use devmatch_service::{
	CancelRequest, ConnectionResponse, ConnectionsResponse, CreateProfileRequest,
	CreateProfileResponse, Error, FeedRequest, FeedResponse, MyReferralsResponse,
	PopularSkillsResponse, ProfileView, ReceivedRequestsResponse, ReferralResponse,
	RelationshipStatusResponse, ReviewReferralRequest, ReviewRequest, SearchRequest,
	SearchResponse, SendReferralRequest, SendRequest, SuggestionsRequest, SuggestionsResponse,
};

/// Set by the fronting auth layer to the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-devmatch-user-id";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/profiles", post(create_profile))
		.route("/v1/profiles/{user_id}", get(get_profile))
		.route("/v1/feed", get(feed))
		.route("/v1/requests/send", post(send_request))
		.route("/v1/requests/review", post(review_request))
		.route("/v1/requests/cancel", post(cancel_request))
		.route("/v1/requests/received", get(received_requests))
		.route("/v1/requests/status/{other_user}", get(relationship_status))
		.route("/v1/connections", get(connections))
		.route("/v1/referrals/send", post(send_referral))
		.route("/v1/referrals/mine", get(my_referrals))
		.route("/v1/referrals/review", post(review_referral))
		.route("/v1/search", get(search))
		.route("/v1/search/suggestions", get(search_suggestions))
		.route("/v1/search/skills/popular", get(popular_skills))
		.with_state(state)
}

/// The authenticated requester.
#[derive(Debug, Clone, Copy)]
pub struct RequesterId(pub Uuid);
impl<S> FromRequestParts<S> for RequesterId
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let raw = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
			json_error(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "Missing requester identity.")
		})?;
		let user_id = raw
			.to_str()
			.ok()
			.and_then(|value| Uuid::parse_str(value.trim()).ok())
			.ok_or_else(|| {
				json_error(
					StatusCode::UNAUTHORIZED,
					"UNAUTHENTICATED",
					"Requester identity is not a valid id.",
				)
			})?;

		Ok(Self(user_id))
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_profile(
	State(state): State<AppState>,
	payload: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProfileResponse>), ApiError> {
	let Json(payload) = payload?;
	let response = state.service.create_profile(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn get_profile(
	State(state): State<AppState>,
	_requester: RequesterId,
	user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ProfileView>, ApiError> {
	let Path(user_id) = user_id?;
	let response = state.service.get_profile(user_id).await?;

	Ok(Json(response))
}

async fn feed(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	query: Result<Query<FeedRequest>, QueryRejection>,
) -> Result<Json<FeedResponse>, ApiError> {
	let Query(query) = query?;
	let response = state.service.feed(user_id, query).await?;

	Ok(Json(response))
}

async fn send_request(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<ConnectionResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.send_request(user_id, payload).await?;

	Ok(Json(response))
}

async fn review_request(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ConnectionResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.review_request(user_id, payload).await?;

	Ok(Json(response))
}

async fn cancel_request(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	payload: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<ConnectionResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.cancel_request(user_id, payload).await?;

	Ok(Json(response))
}

async fn received_requests(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
) -> Result<Json<ReceivedRequestsResponse>, ApiError> {
	let response = state.service.received_requests(user_id).await?;

	Ok(Json(response))
}

async fn relationship_status(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	other_user: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RelationshipStatusResponse>, ApiError> {
	let Path(other_user) = other_user?;
	let response = state.service.relationship_status(user_id, other_user).await?;

	Ok(Json(response))
}

async fn connections(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
) -> Result<Json<ConnectionsResponse>, ApiError> {
	let response = state.service.connections(user_id).await?;

	Ok(Json(response))
}

async fn send_referral(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	payload: Result<Json<SendReferralRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReferralResponse>), ApiError> {
	let Json(payload) = payload?;
	let response = state.service.send_referral(user_id, payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn my_referrals(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
) -> Result<Json<MyReferralsResponse>, ApiError> {
	let response = state.service.my_referrals(user_id).await?;

	Ok(Json(response))
}

async fn review_referral(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	payload: Result<Json<ReviewReferralRequest>, JsonRejection>,
) -> Result<Json<ReferralResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.review_referral(user_id, payload).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	query: Result<Query<SearchRequest>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let Query(query) = query?;
	let response = state.service.search(user_id, query).await?;

	Ok(Json(response))
}

async fn search_suggestions(
	State(state): State<AppState>,
	RequesterId(user_id): RequesterId,
	query: Result<Query<SuggestionsRequest>, QueryRejection>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
	let Query(query) = query?;
	let response = state.service.search_suggestions(user_id, query).await?;

	Ok(Json(response))
}

async fn popular_skills(
	State(state): State<AppState>,
) -> Result<Json<PopularSkillsResponse>, ApiError> {
	let response = state.service.popular_skills().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::Forbidden { message } => json_error(StatusCode::FORBIDDEN, "FORBIDDEN", message),
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Conflict { message } => json_error(StatusCode::CONFLICT, "CONFLICT", message),
			Error::InvalidTransition { message } =>
				json_error(StatusCode::CONFLICT, "INVALID_TRANSITION", message),
			Error::Provider { message } => {
				tracing::error!(error = %message, "Provider error.");

				internal_error()
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				internal_error()
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}

impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}

impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

fn internal_error() -> ApiError {
	json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "Internal error.")
}
