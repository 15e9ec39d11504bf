use std::sync::Arc;

use devmatch_domain::referral::{ReferralAction, ReferralStatus};
use devmatch_service::{Error, Providers, ReviewReferralRequest, SendReferralRequest};

use super::{RecordingNotifier, SpyProvisioner, StubEmbedding, build_service, seed_profile, test_db};

fn ask(to_user: uuid::Uuid, company: &str, role: &str) -> SendReferralRequest {
	SendReferralRequest {
		to_user,
		company: company.to_string(),
		role: role.to_string(),
		message: Some("Happy to share my resume.".to_string()),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn referral_is_reviewed_once_by_its_recipient() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping referral_is_reviewed_once_by_its_recipient; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let notifier = Arc::new(RecordingNotifier::default());
	let service = build_service(
		&test_db,
		Providers::new(
			Arc::new(StubEmbedding::new(None)),
			Arc::new(SpyProvisioner::default()),
			notifier.clone(),
		),
	)
	.await
	.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 2, &[], None).await;
	let bob = seed_profile(&service, "Bob", 1, &[], None).await;
	let sent = service
		.send_referral(alice.user_id, ask(bob.user_id, " Acme ", "SRE"))
		.await
		.expect("Send failed.");

	assert_eq!(sent.referral.status, ReferralStatus::Pending);
	assert_eq!(sent.referral.company, "Acme");

	let review = |action| ReviewReferralRequest { referral_id: sent.referral.referral_id, action };
	let by_sender = service.review_referral(alice.user_id, review(ReferralAction::Accept)).await;

	assert!(matches!(by_sender, Err(Error::Forbidden { .. })));

	let accepted = service
		.review_referral(bob.user_id, review(ReferralAction::Accept))
		.await
		.expect("Review failed.");

	assert_eq!(accepted.referral.status, ReferralStatus::Accepted);
	assert_eq!(accepted.message, "Referral accepted.");

	let again = service.review_referral(bob.user_id, review(ReferralAction::Reject)).await;

	assert!(matches!(again, Err(Error::InvalidTransition { .. })));
	assert_eq!(notifier.names(), vec!["referral_sent", "referral_reviewed"]);

	let mine = service.my_referrals(alice.user_id).await.expect("Listing failed.");

	assert_eq!(mine.sent.len(), 1);
	assert!(mine.received.is_empty());
	assert_eq!(mine.sent[0].referral.status, ReferralStatus::Accepted);
	assert_eq!(
		mine.sent[0].counterpart.as_ref().map(|profile| profile.user_id),
		Some(bob.user_id)
	);

	let theirs = service.my_referrals(bob.user_id).await.expect("Listing failed.");

	assert_eq!(theirs.received.len(), 1);
	assert_eq!(
		theirs.received[0].counterpart.as_ref().map(|profile| profile.user_id),
		Some(alice.user_id)
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DEVMATCH_PG_DSN to run."]
async fn invalid_and_duplicate_referrals_are_rejected() {
	let Some(test_db) = test_db().await else {
		eprintln!(
			"Skipping invalid_and_duplicate_referrals_are_rejected; set DEVMATCH_PG_DSN to run this test."
		);

		return;
	};
	let service = build_service(&test_db, super::providers(Arc::new(StubEmbedding::new(None))))
		.await
		.expect("Failed to build service.");
	let alice = seed_profile(&service, "Alice", 2, &[], None).await;
	let bob = seed_profile(&service, "Bob", 1, &[], None).await;
	let to_self = service.send_referral(alice.user_id, ask(alice.user_id, "Acme", "SRE")).await;

	assert!(matches!(to_self, Err(Error::InvalidRequest { .. })));

	let missing_role = service.send_referral(alice.user_id, ask(bob.user_id, "Acme", "  ")).await;

	assert!(matches!(missing_role, Err(Error::InvalidRequest { .. })));

	let to_nobody =
		service.send_referral(alice.user_id, ask(uuid::Uuid::new_v4(), "Acme", "SRE")).await;

	assert!(matches!(to_nobody, Err(Error::NotFound { .. })));

	service.send_referral(alice.user_id, ask(bob.user_id, "Acme", "SRE")).await.expect("Send failed.");

	let duplicate = service.send_referral(alice.user_id, ask(bob.user_id, "acme", "sre")).await;

	assert!(matches!(duplicate, Err(Error::Conflict { .. })));

	service
		.send_referral(alice.user_id, ask(bob.user_id, "Acme", "Data engineer"))
		.await
		.expect("A different role is a new ask.");
	service
		.send_referral(bob.user_id, ask(alice.user_id, "Acme", "SRE"))
		.await
		.expect("The reverse direction is a new ask.");

	let unknown = service
		.review_referral(
			bob.user_id,
			ReviewReferralRequest {
				referral_id: uuid::Uuid::new_v4(),
				action: ReferralAction::Reject,
			},
		)
		.await;

	assert!(matches!(unknown, Err(Error::NotFound { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
