use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use devmatch_domain::connection::SendIntent;
use devmatch_service::{Error, MatchService, SearchRequest, SendRequest, SuggestionsRequest};
use devmatch_storage::{models::Profile, profiles};

use super::{StubEmbedding, build_service, providers, seed_profile, test_db};

async fn seed_person(
	service: &MatchService,
	name: &str,
	age_minutes: i64,
	age: i32,
	gender: &str,
	skills: &[&str],
) -> Profile {
	let created_at = OffsetDateTime::now_utc() - Duration::minutes(age_minutes);
	let profile = Profile {
		user_id: Uuid::new_v4(),
		first_name: name.to_string(),
		last_name: "Search".to_string(),
		photo_url: None,
		age: Some(age),
		gender: Some(gender.to_string()),
		about: String::new(),
		skills: skills.iter().map(|skill| skill.to_string()).collect(),
		embedding: None,
		embedding_updated_at: None,
		created_at,
		updated_at: created_at,
	};

	profiles::insert_profile(&service.db.pool, &profile).await.expect("Failed to seed profile.");

	profile
}

fn ids(data: &[devmatch_service::ProfileView]) -> Vec<Uuid> {
	data.iter().map(|profile| profile.user_id).collect()
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn filters_combine_and_related_users_are_hidden() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping filters_combine_and_related_users_are_hidden; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let requester = seed_profile(&service, "Requester", 0, &["rust"], None).await;
	let ada = seed_person(&service, "Ada", 40, 36, "female", &["Rust", "math"]).await;
	let linus = seed_person(&service, "Linus", 30, 54, "male", &["c", "git"]).await;
	let grace = seed_person(&service, "Grace", 20, 45, "Female", &["cobol", "rust_lang"]).await;
	let rustam = seed_person(&service, "Rustam", 10, 28, "male", &["go"]).await;
	let asked = seed_person(&service, "Asked", 5, 30, "female", &["rust"]).await;

	service
		.send_request(
			requester.user_id,
			SendRequest { to_user: asked.user_id, intent: SendIntent::Ignored },
		)
		.await
		.expect("Send failed.");

	let search = |req: SearchRequest| service.search(requester.user_id, req);
	let by_text = search(SearchRequest { query: Some("rust".to_string()), ..Default::default() })
		.await
		.expect("Search failed.");

	assert_eq!(ids(&by_text.data), vec![rustam.user_id, grace.user_id, ada.user_id]);
	assert_eq!(by_text.total, 3);

	let by_skill = search(SearchRequest {
		skill: Some("rust_".to_string()),
		..Default::default()
	})
	.await
	.expect("Search failed.");

	assert_eq!(ids(&by_skill.data), vec![grace.user_id]);

	let by_gender_and_age = search(SearchRequest {
		gender: Some("FEMALE".to_string()),
		age_min: Some(40),
		..Default::default()
	})
	.await
	.expect("Search failed.");

	assert_eq!(ids(&by_gender_and_age.data), vec![grace.user_id]);

	let paged = search(SearchRequest { page: Some(2), limit: Some(3), ..Default::default() })
		.await
		.expect("Search failed.");

	assert_eq!(paged.total, 4);
	assert_eq!(paged.pages, 2);
	assert_eq!(ids(&paged.data), vec![ada.user_id]);

	let everyone = search(SearchRequest::default()).await.expect("Search failed.");

	assert!(!ids(&everyone.data).contains(&requester.user_id));
	assert!(!ids(&everyone.data).contains(&asked.user_id));
	assert!(ids(&everyone.data).contains(&linus.user_id));

	let inverted = search(SearchRequest {
		age_min: Some(50),
		age_max: Some(20),
		..Default::default()
	})
	.await;

	assert!(matches!(inverted, Err(Error::InvalidRequest { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn suggestions_and_popular_skills_count_profiles() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping suggestions_and_popular_skills_count_profiles; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let requester = seed_profile(&service, "Rusty", 0, &["rust"], None).await;
	let ada = seed_person(&service, "Ada", 20, 36, "female", &["rust", "math"]).await;

	seed_person(&service, "Linus", 10, 54, "male", &["c", "rust", "git"]).await;

	let suggestions = service
		.search_suggestions(requester.user_id, SuggestionsRequest { query: "ru".to_string() })
		.await
		.expect("Suggestions failed.");

	assert!(suggestions.names.is_empty());
	assert_eq!(suggestions.skills, vec!["rust".to_string()]);

	let named = service
		.search_suggestions(requester.user_id, SuggestionsRequest { query: "ad".to_string() })
		.await
		.expect("Suggestions failed.");

	assert_eq!(named.names.len(), 1);
	assert_eq!(named.names[0].user_id, ada.user_id);
	assert_eq!(named.names[0].name, "Ada Search");

	let popular = service.popular_skills().await.expect("Popular skills failed.");

	assert_eq!(popular.data[0].name, "rust");
	assert_eq!(popular.data[0].count, 3);
	assert_eq!(popular.data.len(), 4);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
