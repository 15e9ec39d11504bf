use std::sync::{Arc, atomic::Ordering};

use devmatch_domain::connection::{ConnectionStatus, ReviewAction, SendIntent};
use devmatch_service::{
	CancelRequest, ConnectionOp, Direction, Error, Providers, ReviewRequest, SendRequest,
};
use devmatch_storage::chat;

use super::{
	RecordingNotifier, SpyProvisioner, StubEmbedding, build_service, providers, seed_profile,
	test_db,
};

fn send(to_user: uuid::Uuid) -> SendRequest {
	SendRequest { to_user, intent: SendIntent::Pending }
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn accept_provisions_channel_exactly_once() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping accept_provisions_channel_exactly_once; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let channels = Arc::new(SpyProvisioner::default());
	let notifier = Arc::new(RecordingNotifier::default());
	let service = build_service(
		&test_db,
		Providers::new(Arc::new(StubEmbedding::new(None)), channels.clone(), notifier.clone()),
	)
	.await
	.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 2, &[], None).await;
	let bob = seed_profile(&service, "Bob", 1, &[], None).await;
	let sent = service.send_request(alice.user_id, send(bob.user_id)).await.expect("Send failed.");
	let record = sent.record.expect("Created record.");

	assert_eq!(sent.op, ConnectionOp::Created);
	assert_eq!(record.status, ConnectionStatus::Pending);

	let accepted = service
		.review_request(
			bob.user_id,
			ReviewRequest { request_id: record.request_id, action: ReviewAction::Accept },
		)
		.await
		.expect("Accept failed.");

	assert_eq!(accepted.op, ConnectionOp::Accepted);
	assert_eq!(accepted.record.map(|view| view.status), Some(ConnectionStatus::Accepted));
	assert!(accepted.channel.is_some());

	let again = service
		.review_request(
			bob.user_id,
			ReviewRequest { request_id: record.request_id, action: ReviewAction::Accept },
		)
		.await;

	assert!(matches!(again, Err(Error::InvalidTransition { .. })));
	assert_eq!(channels.calls.load(Ordering::SeqCst), 1);
	assert_eq!(
		chat::count_rooms_between(&service.db, alice.user_id, bob.user_id)
			.await
			.expect("Count failed."),
		1
	);
	assert_eq!(notifier.names(), vec!["request_sent", "request_accepted"]);

	let connections = service.connections(alice.user_id).await.expect("Connections failed.");

	assert_eq!(connections.connections.len(), 1);
	assert_eq!(connections.connections[0].profile.user_id, bob.user_id);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn cancelled_request_cannot_be_reviewed() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping cancelled_request_cannot_be_reviewed; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 2, &[], None).await;
	let bob = seed_profile(&service, "Bob", 1, &[], None).await;
	let sent = service.send_request(alice.user_id, send(bob.user_id)).await.expect("Send failed.");
	let request_id = sent.record.expect("Created record.").request_id;
	let by_recipient = service.cancel_request(bob.user_id, CancelRequest { request_id }).await;

	assert!(matches!(by_recipient, Err(Error::Forbidden { .. })));

	let cancelled = service
		.cancel_request(alice.user_id, CancelRequest { request_id })
		.await
		.expect("Cancel failed.");

	assert_eq!(cancelled.op, ConnectionOp::Cancelled);
	assert!(cancelled.record.is_none());

	let review = service
		.review_request(bob.user_id, ReviewRequest { request_id, action: ReviewAction::Accept })
		.await;

	assert!(matches!(review, Err(Error::NotFound { .. })));

	let status =
		service.relationship_status(alice.user_id, bob.user_id).await.expect("Status failed.");

	assert_eq!(status.status, None);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn concurrent_sends_leave_one_record_per_pair() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping concurrent_sends_leave_one_record_per_pair; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 2, &[], None).await;
	let bob = seed_profile(&service, "Bob", 1, &[], None).await;
	let (forward, reverse, repeat) = tokio::join!(
		service.send_request(alice.user_id, send(bob.user_id)),
		service.send_request(bob.user_id, send(alice.user_id)),
		service.send_request(alice.user_id, send(bob.user_id)),
	);
	let results = [forward, reverse, repeat];
	let created = results.iter().filter(|result| result.is_ok()).count();
	let conflicts =
		results.iter().filter(|result| matches!(result, Err(Error::Conflict { .. }))).count();

	assert_eq!(created, 1);
	assert_eq!(conflicts, 2);

	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM connection_requests")
		.fetch_one(&service.db.pool)
		.await
		.expect("Count failed.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn invalid_sends_and_reviews_are_rejected() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping invalid_sends_and_reviews_are_rejected; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 3, &[], None).await;
	let bob = seed_profile(&service, "Bob", 2, &[], None).await;
	let carol = seed_profile(&service, "Carol", 1, &[], None).await;

	assert!(matches!(
		service.send_request(alice.user_id, send(alice.user_id)).await,
		Err(Error::InvalidRequest { .. })
	));
	assert!(matches!(
		service.send_request(alice.user_id, send(uuid::Uuid::new_v4())).await,
		Err(Error::NotFound { .. })
	));

	let sent = service.send_request(alice.user_id, send(bob.user_id)).await.expect("Send failed.");
	let request_id = sent.record.expect("Created record.").request_id;

	for actor in [alice.user_id, carol.user_id] {
		let review = service
			.review_request(actor, ReviewRequest { request_id, action: ReviewAction::Accept })
			.await;

		assert!(matches!(review, Err(Error::Forbidden { .. })));
	}

	let received = service.received_requests(bob.user_id).await.expect("Received failed.");

	assert_eq!(received.requests.len(), 1);
	assert_eq!(received.requests[0].sender.as_ref().map(|sender| sender.user_id), Some(alice.user_id));

	let status =
		service.relationship_status(bob.user_id, alice.user_id).await.expect("Status failed.");

	assert_eq!(status.status, Some(ConnectionStatus::Pending));
	assert_eq!(status.direction, Some(Direction::Incoming));

	let declined = service
		.review_request(bob.user_id, ReviewRequest { request_id, action: ReviewAction::Decline })
		.await
		.expect("Decline failed.");

	assert_eq!(declined.op, ConnectionOp::Declined);
	assert!(service.received_requests(bob.user_id).await.expect("Received failed.").requests.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn provisioning_failure_keeps_request_pending() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping provisioning_failure_keeps_request_pending; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let channels = Arc::new(SpyProvisioner { fail: true, ..SpyProvisioner::default() });
	let notifier = Arc::new(RecordingNotifier::default());
	let service = build_service(
		&test_db,
		Providers::new(Arc::new(StubEmbedding::new(None)), channels.clone(), notifier.clone()),
	)
	.await
	.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 2, &[], None).await;
	let bob = seed_profile(&service, "Bob", 1, &[], None).await;
	let sent = service.send_request(alice.user_id, send(bob.user_id)).await.expect("Send failed.");
	let request_id = sent.record.expect("Created record.").request_id;
	let review = service
		.review_request(bob.user_id, ReviewRequest { request_id, action: ReviewAction::Accept })
		.await;

	assert!(matches!(review, Err(Error::Provider { .. })));

	let status =
		service.relationship_status(alice.user_id, bob.user_id).await.expect("Status failed.");

	assert_eq!(status.status, Some(ConnectionStatus::Pending));
	assert_eq!(status.direction, Some(Direction::Outgoing));
	assert_eq!(channels.calls.load(Ordering::SeqCst), 1);
	assert_eq!(notifier.names(), vec!["request_sent"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
