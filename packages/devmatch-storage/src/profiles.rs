use sqlx::{Executor, Postgres};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, db::Db, models::Profile};

const UNIQUE_VIOLATION: &str = "23505";

const PROFILE_COLUMNS: &str = "\
user_id,
	first_name,
	last_name,
	photo_url,
	age,
	gender,
	about,
	skills,
	embedding,
	embedding_updated_at,
	created_at,
	updated_at";

pub async fn insert_profile<'e, E>(executor: E, profile: &Profile) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO profiles (
	user_id,
	first_name,
	last_name,
	photo_url,
	age,
	gender,
	about,
	skills,
	embedding,
	embedding_updated_at,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
	)
	.bind(profile.user_id)
	.bind(profile.first_name.as_str())
	.bind(profile.last_name.as_str())
	.bind(profile.photo_url.as_deref())
	.bind(profile.age)
	.bind(profile.gender.as_deref())
	.bind(profile.about.as_str())
	.bind(profile.skills.as_slice())
	.bind(profile.embedding.as_deref())
	.bind(profile.embedding_updated_at)
	.bind(profile.created_at)
	.bind(profile.updated_at)
	.execute(executor)
	.await
	.map_err(|err| match err.as_database_error().and_then(|db_err| db_err.code()) {
		Some(code) if code == UNIQUE_VIOLATION =>
			Error::Conflict(format!("Profile {} already exists.", profile.user_id)),
		_ => Error::Sqlx(err),
	})?;

	Ok(())
}

pub async fn get_profile<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Profile>>
where
	E: Executor<'e, Database = Postgres>,
{
	let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
	let profile =
		sqlx::query_as::<_, Profile>(&sql).bind(user_id).fetch_optional(executor).await?;

	Ok(profile)
}

pub async fn profile_exists<'e, E>(executor: E, user_id: Uuid) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let exists: bool =
		sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM profiles WHERE user_id = $1)")
			.bind(user_id)
			.fetch_one(executor)
			.await?;

	Ok(exists)
}

pub async fn set_embedding(
	db: &Db,
	user_id: Uuid,
	embedding: &[f32],
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE profiles
SET
	embedding = $1,
	embedding_updated_at = $2,
	updated_at = $2
WHERE user_id = $3",
	)
	.bind(embedding)
	.bind(now)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Profiles outside `excluded` that carry a cached non-empty embedding, newest first.
pub async fn list_embedded_candidates(db: &Db, excluded: &[Uuid]) -> Result<Vec<Profile>> {
	let sql = format!(
		"\
SELECT {PROFILE_COLUMNS}
FROM profiles
WHERE user_id <> ALL($1)
	AND embedding IS NOT NULL
	AND cardinality(embedding) > 0
ORDER BY created_at DESC, user_id ASC"
	);
	let rows = sqlx::query_as::<_, Profile>(&sql).bind(excluded).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Up to `limit` profiles outside `excluded`, newest first.
pub async fn list_recent_profiles(db: &Db, excluded: &[Uuid], limit: i64) -> Result<Vec<Profile>> {
	let sql = format!(
		"\
SELECT {PROFILE_COLUMNS}
FROM profiles
WHERE user_id <> ALL($1)
ORDER BY created_at DESC, user_id ASC
LIMIT $2"
	);
	let rows = sqlx::query_as::<_, Profile>(&sql)
		.bind(excluded)
		.bind(limit)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn list_profiles_by_ids(db: &Db, user_ids: &[Uuid]) -> Result<Vec<Profile>> {
	let sql = format!(
		"\
SELECT {PROFILE_COLUMNS}
FROM profiles
WHERE user_id = ANY($1)
ORDER BY created_at DESC, user_id ASC"
	);
	let rows = sqlx::query_as::<_, Profile>(&sql).bind(user_ids).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Keyset cursor over `(created_at, user_id)` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileCursor {
	pub created_at: OffsetDateTime,
	pub user_id: Uuid,
}
impl From<&Profile> for ProfileCursor {
	fn from(profile: &Profile) -> Self {
		Self { created_at: profile.created_at, user_id: profile.user_id }
	}
}

/// Profiles with no usable embedding but some text to embed, oldest first, strictly after
/// `after` when given.
pub async fn list_missing_embeddings(
	db: &Db,
	after: Option<ProfileCursor>,
	limit: i64,
) -> Result<Vec<Profile>> {
	let sql = format!(
		"\
SELECT {PROFILE_COLUMNS}
FROM profiles
WHERE (embedding IS NULL OR cardinality(embedding) = 0)
	AND (cardinality(skills) > 0 OR btrim(about) <> '')
	AND ($1::timestamptz IS NULL OR (created_at, user_id) > ($1::timestamptz, $2::uuid))
ORDER BY created_at ASC, user_id ASC
LIMIT $3"
	);
	let rows = sqlx::query_as::<_, Profile>(&sql)
		.bind(after.map(|cursor| cursor.created_at))
		.bind(after.map(|cursor| cursor.user_id))
		.bind(limit)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

/// Search filters. `text` and `skill` are `ILIKE` patterns; `gender` matches case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSearch<'a> {
	pub text: Option<&'a str>,
	pub skill: Option<&'a str>,
	pub age_min: Option<i32>,
	pub age_max: Option<i32>,
	pub gender: Option<&'a str>,
}

const SEARCH_PREDICATE: &str = "\
user_id <> ALL($1)
	AND (
		$2::text IS NULL
		OR first_name ILIKE $2
		OR last_name ILIKE $2
		OR EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE $2)
	)
	AND ($3::text IS NULL OR EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE $3))
	AND ($4::int4 IS NULL OR age >= $4)
	AND ($5::int4 IS NULL OR age <= $5)
	AND ($6::text IS NULL OR lower(gender) = lower($6))";

/// One page of matching profiles outside `excluded`, newest first, and the total match count.
pub async fn search_profiles(
	db: &Db,
	filter: &ProfileSearch<'_>,
	excluded: &[Uuid],
	limit: i64,
	offset: i64,
) -> Result<(Vec<Profile>, i64)> {
	let count_sql = format!("SELECT COUNT(*) FROM profiles WHERE {SEARCH_PREDICATE}");
	let total: i64 = sqlx::query_scalar(&count_sql)
		.bind(excluded)
		.bind(filter.text)
		.bind(filter.skill)
		.bind(filter.age_min)
		.bind(filter.age_max)
		.bind(filter.gender)
		.fetch_one(&db.pool)
		.await?;
	let sql = format!(
		"\
SELECT {PROFILE_COLUMNS}
FROM profiles
WHERE {SEARCH_PREDICATE}
ORDER BY created_at DESC, user_id ASC
LIMIT $7 OFFSET $8"
	);
	let rows = sqlx::query_as::<_, Profile>(&sql)
		.bind(excluded)
		.bind(filter.text)
		.bind(filter.skill)
		.bind(filter.age_min)
		.bind(filter.age_max)
		.bind(filter.gender)
		.bind(limit)
		.bind(offset)
		.fetch_all(&db.pool)
		.await?;

	Ok((rows, total))
}

/// `(user_id, first_name, last_name)` of profiles whose name matches `pattern`, newest first.
pub async fn suggest_names(
	db: &Db,
	pattern: &str,
	excluded: &[Uuid],
	limit: i64,
) -> Result<Vec<(Uuid, String, String)>> {
	let rows = sqlx::query_as(
		"\
SELECT user_id, first_name, last_name
FROM profiles
WHERE user_id <> ALL($1) AND (first_name ILIKE $2 OR last_name ILIKE $2)
ORDER BY created_at DESC, user_id ASC
LIMIT $3",
	)
	.bind(excluded)
	.bind(pattern)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Skills by the number of profiles listing them, most common first. `pattern` narrows the
/// skills counted.
pub async fn skill_counts(db: &Db, pattern: Option<&str>, limit: i64) -> Result<Vec<(String, i64)>> {
	let rows = sqlx::query_as(
		"\
SELECT skill, COUNT(DISTINCT user_id) AS profiles
FROM profiles, unnest(skills) AS skill
WHERE $1::text IS NULL OR skill ILIKE $1
GROUP BY skill
ORDER BY profiles DESC, skill ASC
LIMIT $2",
	)
	.bind(pattern)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
