use std::sync::{Arc, atomic::Ordering};

use uuid::Uuid;

use devmatch_domain::feed::{EntrySource, RankingMode};
use devmatch_service::{FeedRequest, SendRequest};

use super::{StubEmbedding, build_service, providers, seed_profile, test_db};

fn unit_with_similarity(similarity: f32) -> Vec<f32> {
	vec![similarity, (1.0 - similarity * similarity).sqrt()]
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn scored_profiles_lead_and_recency_pads_to_threshold() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping scored_profiles_lead_and_recency_pads_to_threshold; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let requester = seed_profile(&service, "Requester", 0, &["rust"], Some(vec![1.0, 0.0])).await;
	let a = seed_profile(&service, "A", 100, &[], Some(unit_with_similarity(0.9))).await;
	let b = seed_profile(&service, "B", 101, &[], Some(unit_with_similarity(0.5))).await;
	let c = seed_profile(&service, "C", 102, &[], Some(unit_with_similarity(0.95))).await;
	let already_asked = seed_profile(&service, "X", 103, &[], Some(vec![1.0, 0.0])).await;
	let mut recent = Vec::new();

	for minutes in 1..=10 {
		recent.push(seed_profile(&service, &format!("F{minutes}"), minutes, &[], None).await);
	}

	service
		.send_request(
			requester.user_id,
			SendRequest {
				to_user: already_asked.user_id,
				intent: devmatch_domain::connection::SendIntent::Pending,
			},
		)
		.await
		.expect("Send failed.");

	let feed = service
		.feed(requester.user_id, FeedRequest::default())
		.await
		.expect("Feed failed.");
	let ids: Vec<Uuid> = feed.data.iter().map(|item| item.profile.user_id).collect();
	let mut expected = vec![c.user_id, a.user_id, b.user_id];

	expected.extend(recent.iter().take(7).map(|profile| profile.user_id));

	assert_eq!(feed.ranking, RankingMode::Similarity);
	assert_eq!(ids, expected);
	assert_eq!(feed.total, 10);
	assert_eq!(feed.pages, 1);
	assert!(feed.data[..3].iter().all(|item| item.source == EntrySource::Similarity));
	assert!(feed.data[3..].iter().all(|item| item.similarity.is_none()));

	let scores: Vec<f32> =
		feed.data[..3].iter().map(|item| item.similarity.expect("Scored entry.")).collect();

	assert!((scores[0] - 0.95).abs() < 1e-4);
	assert!((scores[1] - 0.9).abs() < 1e-4);
	assert!((scores[2] - 0.5).abs() < 1e-4);

	for page in 1..=4 {
		let slice = service
			.feed(requester.user_id, FeedRequest { page: Some(page), limit: Some(3) })
			.await
			.expect("Feed failed.");

		assert!(slice.data.iter().all(|item| {
			item.profile.user_id != requester.user_id
				&& item.profile.user_id != already_asked.user_id
		}));

		if page == 4 {
			assert_eq!(slice.data.len(), 1);
			assert_eq!(slice.pages, 4);
		}
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn requester_without_vector_gets_recency_feed() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping requester_without_vector_gets_recency_feed; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let embedding = Arc::new(StubEmbedding::new(None));
	let service =
		build_service(&test_db, providers(embedding.clone())).await.expect("Failed to build service.");
	let requester = seed_profile(&service, "Requester", 0, &["rust"], None).await;
	let older = seed_profile(&service, "Older", 30, &[], Some(vec![1.0, 0.0])).await;
	let newest = seed_profile(&service, "Newest", 5, &[], None).await;
	let middle = seed_profile(&service, "Middle", 10, &[], Some(vec![0.0, 1.0])).await;
	let feed = service
		.feed(requester.user_id, FeedRequest::default())
		.await
		.expect("Degraded feed must not fail.");
	let ids: Vec<Uuid> = feed.data.iter().map(|item| item.profile.user_id).collect();

	assert_eq!(feed.ranking, RankingMode::Fallback);
	assert_eq!(ids, vec![newest.user_id, middle.user_id, older.user_id]);
	assert!(feed.data.iter().all(|item| item.source == EntrySource::Recency));
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn incomparable_candidates_report_fallback_ranking() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping incomparable_candidates_report_fallback_ranking; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let requester = seed_profile(&service, "Requester", 0, &["rust"], Some(vec![1.0, 0.0])).await;
	let older = seed_profile(&service, "Older", 20, &[], Some(vec![1.0, 0.0, 0.0])).await;
	let newer = seed_profile(&service, "Newer", 10, &[], Some(vec![0.0, 1.0, 0.0])).await;
	let feed = service
		.feed(requester.user_id, FeedRequest::default())
		.await
		.expect("Feed failed.");
	let ids: Vec<Uuid> = feed.data.iter().map(|item| item.profile.user_id).collect();

	assert_eq!(feed.ranking, RankingMode::Fallback);
	assert_eq!(ids, vec![newer.user_id, older.user_id]);
	assert!(feed.data.iter().all(|item| item.source == EntrySource::Recency));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn computed_requester_vector_is_cached() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping computed_requester_vector_is_cached; set DEVMATCH_PG_DSN to run this test.");

		return;
	};
	let embedding = Arc::new(StubEmbedding::new(Some(vec![1.0, 0.0])));
	let service =
		build_service(&test_db, providers(embedding.clone())).await.expect("Failed to build service.");
	let requester = seed_profile(&service, "Requester", 0, &["rust", "sql"], None).await;
	let close = seed_profile(&service, "Close", 20, &[], Some(vec![1.0, 0.1])).await;
	let far = seed_profile(&service, "Far", 10, &[], Some(vec![-1.0, 0.0])).await;
	let first = service
		.feed(requester.user_id, FeedRequest::default())
		.await
		.expect("Feed failed.");

	assert_eq!(first.ranking, RankingMode::Similarity);
	assert_eq!(
		first.data.iter().map(|item| item.profile.user_id).collect::<Vec<_>>(),
		vec![close.user_id, far.user_id]
	);
	assert!(service.get_profile(requester.user_id).await.expect("Lookup failed.").has_embedding);

	service.feed(requester.user_id, FeedRequest::default()).await.expect("Feed failed.");

	assert_eq!(embedding.calls.load(Ordering::SeqCst), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn invalid_pagination_is_rejected() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping invalid_pagination_is_rejected; set DEVMATCH_PG_DSN to run this test.");

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let requester = seed_profile(&service, "Requester", 0, &[], None).await;
	let result =
		service.feed(requester.user_id, FeedRequest { page: Some(0), limit: None }).await;

	assert!(matches!(result, Err(devmatch_service::Error::InvalidRequest { .. })));

	let capped = service
		.feed(requester.user_id, FeedRequest { page: None, limit: Some(500) })
		.await
		.expect("Feed failed.");

	assert_eq!(capped.limit, 50);
	assert!(capped.data.is_empty());
	assert_eq!(capped.pages, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
