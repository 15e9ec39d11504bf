use sqlx::{Executor, Postgres};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::ConnectionRequest};

/// Inserts the record unless one already exists for the unordered pair. Returns `false` when
/// the pair index rejected it.
pub async fn insert_connection<'e, E>(executor: E, record: &ConnectionRequest) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let inserted: Option<Uuid> = sqlx::query_scalar(
		"\
INSERT INTO connection_requests (request_id, from_user, to_user, status, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT DO NOTHING
RETURNING request_id",
	)
	.bind(record.request_id)
	.bind(record.from_user)
	.bind(record.to_user)
	.bind(record.status.as_str())
	.bind(record.created_at)
	.bind(record.updated_at)
	.fetch_optional(executor)
	.await?;

	Ok(inserted.is_some())
}

pub async fn get_connection<'e, E>(executor: E, request_id: Uuid) -> Result<Option<ConnectionRequest>>
where
	E: Executor<'e, Database = Postgres>,
{
	let row = sqlx::query_as::<_, ConnectionRequest>(
		"\
SELECT request_id, from_user, to_user, status, created_at, updated_at
FROM connection_requests
WHERE request_id = $1",
	)
	.bind(request_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Loads the record and holds its row lock until the surrounding transaction ends.
pub async fn get_connection_for_update<'e, E>(
	executor: E,
	request_id: Uuid,
) -> Result<Option<ConnectionRequest>>
where
	E: Executor<'e, Database = Postgres>,
{
	let row = sqlx::query_as::<_, ConnectionRequest>(
		"\
SELECT request_id, from_user, to_user, status, created_at, updated_at
FROM connection_requests
WHERE request_id = $1
FOR UPDATE",
	)
	.bind(request_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn update_status<'e, E>(
	executor: E,
	request_id: Uuid,
	status: &str,
	now: OffsetDateTime,
) -> Result<ConnectionRequest>
where
	E: Executor<'e, Database = Postgres>,
{
	let row = sqlx::query_as::<_, ConnectionRequest>(
		"\
UPDATE connection_requests
SET status = $1, updated_at = $2
WHERE request_id = $3
RETURNING request_id, from_user, to_user, status, created_at, updated_at",
	)
	.bind(status)
	.bind(now)
	.bind(request_id)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

pub async fn delete_connection<'e, E>(executor: E, request_id: Uuid) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query("DELETE FROM connection_requests WHERE request_id = $1")
		.bind(request_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// `(from_user, to_user)` of every record involving `user_id`, any status.
pub async fn list_pairs_for_user(db: &Db, user_id: Uuid) -> Result<Vec<(Uuid, Uuid)>> {
	let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
		"\
SELECT from_user, to_user
FROM connection_requests
WHERE from_user = $1 OR to_user = $1",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn list_received_pending(db: &Db, user_id: Uuid) -> Result<Vec<ConnectionRequest>> {
	let rows = sqlx::query_as::<_, ConnectionRequest>(
		"\
SELECT request_id, from_user, to_user, status, created_at, updated_at
FROM connection_requests
WHERE to_user = $1 AND status = 'pending'
ORDER BY created_at DESC, request_id ASC",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn list_accepted_for_user(db: &Db, user_id: Uuid) -> Result<Vec<ConnectionRequest>> {
	let rows = sqlx::query_as::<_, ConnectionRequest>(
		"\
SELECT request_id, from_user, to_user, status, created_at, updated_at
FROM connection_requests
WHERE (from_user = $1 OR to_user = $1) AND status = 'accepted'
ORDER BY updated_at DESC, request_id ASC",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// The record for the unordered pair `{a, b}`, whichever side sent it.
pub async fn find_between(db: &Db, a: Uuid, b: Uuid) -> Result<Option<ConnectionRequest>> {
	let row = sqlx::query_as::<_, ConnectionRequest>(
		"\
SELECT request_id, from_user, to_user, status, created_at, updated_at
FROM connection_requests
WHERE LEAST(from_user, to_user) = LEAST($1::uuid, $2::uuid)
	AND GREATEST(from_user, to_user) = GREATEST($1::uuid, $2::uuid)",
	)
	.bind(a)
	.bind(b)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}
