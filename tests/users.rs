mod common;

use blog_backend::models::{PageRequest, UpdateUser, UserStatus};
use blog_backend::services::ServiceError;
use blog_backend::utils::verify_token;
use common::{harness, settings, user};

#[tokio::test]
async fn login_issues_a_token_that_becomes_the_session() {
    let h = harness();
    let alice = user(&h.services, "alice").await;
    assert_eq!(alice.nickname, "alice");
    assert_ne!(alice.password_hash, "password");

    let outcome = h.services.users.login("alice", "password").await.unwrap();
    let claims = verify_token(&outcome.token, &settings().jwt_secret).unwrap();
    assert_eq!(claims.sub, alice.id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.exp, outcome.expires_at);

    let current = h.services.users.current_token(alice.id).await.unwrap();
    assert_eq!(current.as_deref(), Some(outcome.token.as_str()));

    h.services.users.logout(alice.id).await.unwrap();
    assert!(h.services.users.current_token(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn bad_credentials_are_rejected_alike() {
    let h = harness();
    user(&h.services, "alice").await;

    let wrong_password = h.services.users.login("alice", "nope").await.unwrap_err();
    assert!(matches!(wrong_password, ServiceError::InvalidCredentials));

    let unknown_user = h.services.users.login("mallory", "password").await.unwrap_err();
    assert!(matches!(unknown_user, ServiceError::InvalidCredentials));
}

#[tokio::test]
async fn disabling_an_account_ends_its_session() {
    let h = harness();
    let alice = user(&h.services, "alice").await;
    h.services.users.login("alice", "password").await.unwrap();

    let disabled = h
        .services
        .users
        .update_user(
            alice.id,
            UpdateUser {
                status: Some(UserStatus::Disabled),
                ..UpdateUser::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(disabled.status, UserStatus::Disabled);
    assert!(h.services.users.current_token(alice.id).await.unwrap().is_none());

    let err = h.services.users.login("alice", "password").await.unwrap_err();
    assert!(matches!(err, ServiceError::AccountDisabled));
}

#[tokio::test]
async fn changing_the_password_requires_the_old_one() {
    let h = harness();
    let alice = user(&h.services, "alice").await;
    h.services.users.login("alice", "password").await.unwrap();

    let err = h
        .services
        .users
        .change_password(alice.id, "wrong", "s3cret")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    h.services
        .users
        .change_password(alice.id, "password", "s3cret")
        .await
        .unwrap();
    assert!(h.services.users.current_token(alice.id).await.unwrap().is_none());

    assert!(h.services.users.login("alice", "password").await.is_err());
    h.services.users.login("alice", "s3cret").await.unwrap();
}

#[tokio::test]
async fn deleted_users_disappear_from_reads_and_lists() {
    let h = harness();
    let alice = user(&h.services, "alice").await;
    user(&h.services, "bob").await;
    let page = PageRequest::new(1, 10);

    assert_eq!(h.services.users.list_users(page).await.unwrap().total, 2);
    h.services.users.get_user(alice.id).await.unwrap();

    h.services.users.delete_user(alice.id).await.unwrap();
    assert!(h.services.users.get_user(alice.id).await.unwrap_err().is_not_found());
    let listed = h.services.users.list_users(page).await.unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].username, "bob");
}
