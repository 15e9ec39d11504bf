use std::sync::{Arc, atomic::Ordering};

use devmatch_service::{BackfillReport, CreateProfileRequest, EmbeddingStatus, Error};

use super::{StubEmbedding, build_service, providers, seed_profile, test_db};

fn signup(first_name: &str, skills: &[&str], about: &str) -> CreateProfileRequest {
	CreateProfileRequest {
		user_id: None,
		first_name: first_name.to_string(),
		last_name: "Signup".to_string(),
		photo_url: None,
		age: Some(29),
		gender: None,
		about: about.to_string(),
		skills: skills.iter().map(|skill| skill.to_string()).collect(),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn signup_reports_embedding_outcome() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping signup_reports_embedding_outcome; set DEVMATCH_PG_DSN to run this test.");

		return;
	};
	let embedding = Arc::new(StubEmbedding::new(Some(vec![0.3, 0.4])));
	let service =
		build_service(&test_db, providers(embedding.clone())).await.expect("Failed to build service.");
	let stored = service
		.create_profile(signup("Ada", &["rust"], "Compilers."))
		.await
		.expect("Signup failed.");

	assert_eq!(stored.embedding, EmbeddingStatus::Stored);
	assert!(stored.profile.has_embedding);

	let skipped =
		service.create_profile(signup("Blank", &[" "], "  ")).await.expect("Signup failed.");

	assert_eq!(skipped.embedding, EmbeddingStatus::Skipped);
	assert!(skipped.profile.skills.is_empty());
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 1);

	let duplicate = service
		.create_profile(CreateProfileRequest {
			user_id: Some(stored.profile.user_id),
			..signup("Again", &[], "")
		})
		.await;

	assert!(matches!(duplicate, Err(Error::Conflict { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn signup_survives_unavailable_embedding() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping signup_survives_unavailable_embedding; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let created = service
		.create_profile(signup("Grace", &["cobol"], ""))
		.await
		.expect("Signup must not fail.");

	assert_eq!(created.embedding, EmbeddingStatus::Unavailable);

	let fetched = service.get_profile(created.profile.user_id).await.expect("Lookup failed.");

	assert!(!fetched.has_embedding);
	assert!(matches!(service.get_profile(uuid::Uuid::new_v4()).await, Err(Error::NotFound { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn backfill_sweeps_every_batch() {
	let Some(test_db) = test_db().await else {
		eprintln!("Skipping backfill_sweeps_every_batch; set DEVMATCH_PG_DSN to run this test.");

		return;
	};
	let embedding = Arc::new(StubEmbedding::new(Some(vec![1.0, 0.0])));
	let service =
		build_service(&test_db, providers(embedding.clone())).await.expect("Failed to build service.");

	for (idx, name) in ["One", "Two", "Three"].into_iter().enumerate() {
		seed_profile(&service, name, 10 - idx as i64, &["rust"], None).await;
	}

	seed_profile(&service, "Silent", 20, &[], None).await;
	seed_profile(&service, "Done", 30, &["go"], Some(vec![0.0, 1.0])).await;

	let report = service.backfill_embeddings().await.expect("Backfill failed.");

	assert_eq!(report, BackfillReport { scanned: 3, updated: 3, skipped: 0, failed: 0 });
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 3);

	let second = service.backfill_embeddings().await.expect("Backfill failed.");

	assert_eq!(second, BackfillReport::default());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
