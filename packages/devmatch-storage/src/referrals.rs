use sqlx::{Executor, Postgres};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::ReferralRequest};

const REFERRAL_COLUMNS: &str = "\
referral_id,
	from_user,
	to_user,
	company,
	role,
	message,
	status,
	created_at,
	updated_at";

/// Inserts the referral unless the sender already asked the recipient for the same company and
/// role. Returns `false` when the ask index rejected it.
pub async fn insert_referral<'e, E>(executor: E, referral: &ReferralRequest) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let inserted: Option<Uuid> = sqlx::query_scalar(
		"\
INSERT INTO referral_requests (
	referral_id,
	from_user,
	to_user,
	company,
	role,
	message,
	status,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT DO NOTHING
RETURNING referral_id",
	)
	.bind(referral.referral_id)
	.bind(referral.from_user)
	.bind(referral.to_user)
	.bind(referral.company.as_str())
	.bind(referral.role.as_str())
	.bind(referral.message.as_deref())
	.bind(referral.status.as_str())
	.bind(referral.created_at)
	.bind(referral.updated_at)
	.fetch_optional(executor)
	.await?;

	Ok(inserted.is_some())
}

/// Loads the referral and holds its row lock until the surrounding transaction ends.
pub async fn get_referral_for_update<'e, E>(
	executor: E,
	referral_id: Uuid,
) -> Result<Option<ReferralRequest>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"\
SELECT {REFERRAL_COLUMNS}
FROM referral_requests
WHERE referral_id = $1
FOR UPDATE"
	);
	let row = sqlx::query_as::<_, ReferralRequest>(&sql)
		.bind(referral_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn update_referral_status<'e, E>(
	executor: E,
	referral_id: Uuid,
	status: &str,
	now: OffsetDateTime,
) -> Result<ReferralRequest>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!(
		"\
UPDATE referral_requests
SET status = $1, updated_at = $2
WHERE referral_id = $3
RETURNING {REFERRAL_COLUMNS}"
	);
	let row = sqlx::query_as::<_, ReferralRequest>(&sql)
		.bind(status)
		.bind(now)
		.bind(referral_id)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

/// Referrals `user_id` asked for, newest first.
pub async fn list_sent(db: &Db, user_id: Uuid) -> Result<Vec<ReferralRequest>> {
	let sql = format!(
		"\
SELECT {REFERRAL_COLUMNS}
FROM referral_requests
WHERE from_user = $1
ORDER BY created_at DESC, referral_id ASC"
	);
	let rows = sqlx::query_as::<_, ReferralRequest>(&sql).bind(user_id).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Referrals addressed to `user_id`, newest first.
pub async fn list_received(db: &Db, user_id: Uuid) -> Result<Vec<ReferralRequest>> {
	let sql = format!(
		"\
SELECT {REFERRAL_COLUMNS}
FROM referral_requests
WHERE to_user = $1
ORDER BY created_at DESC, referral_id ASC"
	);
	let rows = sqlx::query_as::<_, ReferralRequest>(&sql).bind(user_id).fetch_all(&db.pool).await?;

	Ok(rows)
}
