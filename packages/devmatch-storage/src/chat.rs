use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, db::Db, models::ChatRoom};

/// Returns the room for the two members, creating it on first use. Members are stored in
/// sorted order so either argument order resolves to the same room.
pub async fn find_or_create_room(
	conn: &mut PgConnection,
	member_a: Uuid,
	member_b: Uuid,
	now: OffsetDateTime,
) -> Result<ChatRoom> {
	if member_a == member_b {
		return Err(Error::InvalidArgument("A chat room needs two distinct members.".to_string()));
	}

	let (member_low, member_high) =
		if member_a < member_b { (member_a, member_b) } else { (member_b, member_a) };

	sqlx::query(
		"\
INSERT INTO chat_rooms (room_id, member_low, member_high, created_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (member_low, member_high) DO NOTHING",
	)
	.bind(Uuid::new_v4())
	.bind(member_low)
	.bind(member_high)
	.bind(now)
	.execute(&mut *conn)
	.await?;

	let room = sqlx::query_as::<_, ChatRoom>(
		"\
SELECT room_id, member_low, member_high, created_at
FROM chat_rooms
WHERE member_low = $1 AND member_high = $2",
	)
	.bind(member_low)
	.bind(member_high)
	.fetch_one(&mut *conn)
	.await?;

	Ok(room)
}

pub async fn count_rooms_between(db: &Db, member_a: Uuid, member_b: Uuid) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM chat_rooms
WHERE member_low = LEAST($1::uuid, $2::uuid) AND member_high = GREATEST($1::uuid, $2::uuid)",
	)
	.bind(member_a)
	.bind(member_b)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}
