mod common;

use std::sync::atomic::Ordering;

use auth_service::domain::authorize::PolicyResolver;
use auth_service::domain::identity::errors::AuthError;
use auth_service::domain::identity::models::ChangeEmailCommand;
use auth_service::domain::identity::models::ChangePasswordCommand;
use auth_service::domain::identity::models::LoginCommand;
use auth_service::domain::identity::models::LogoutCommand;
use auth_service::domain::identity::models::LogoutScope;
use auth_service::domain::identity::models::RefreshCommand;
use auth_service::domain::identity::models::RegisterCommand;
use auth_service::domain::identity::models::TokenPair;
use auth_service::domain::identity::ports::IdentityServicePort;
use auth_service::domain::session::models::RefreshSession;
use auth_service::user::models::UserId;
use chrono::Utc;
use common::caller_from;
use common::claims_of;
use common::test_service;
use common::TestIdentityService;
use uuid::Uuid;

async fn register_ann(service: &TestIdentityService) -> TokenPair {
    service
        .register(RegisterCommand {
            email: "ann@example.com".to_string(),
            password: "CorrectHorse1!".to_string(),
            display_name: "Ann".to_string(),
        })
        .await
        .expect("registration should succeed")
}

async fn login_ann(service: &TestIdentityService) -> TokenPair {
    service
        .login(LoginCommand {
            email: "ann@example.com".to_string(),
            password: "CorrectHorse1!".to_string(),
        })
        .await
        .expect("login should succeed")
}

#[tokio::test]
async fn test_register_login_refresh_logout_lifecycle() {
    let (_store, service, jwt) = test_service();

    let first = register_ann(&service).await;
    let claims = claims_of(&jwt, &first);
    assert_eq!(claims.roles, vec!["USER"]);
    assert!(claims.has_permission("auth.service"));

    let rotated = service
        .refresh(RefreshCommand {
            refresh_token: first.refresh_token.to_string(),
            caller: Some(caller_from(&jwt, &first)),
        })
        .await
        .expect("refresh should succeed");
    assert_ne!(rotated.refresh_token, first.refresh_token);
    assert_ne!(rotated.access_token, first.access_token);

    let ack = service
        .logout(
            LogoutCommand {
                refresh_token: Some(rotated.refresh_token.to_string()),
                all_devices: false,
            },
            &caller_from(&jwt, &rotated),
        )
        .await
        .expect("logout should succeed");
    assert_eq!(ack.scope, LogoutScope::Current);

    let dead = service
        .refresh(RefreshCommand {
            refresh_token: rotated.refresh_token.to_string(),
            caller: None,
        })
        .await;
    assert!(matches!(dead, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_rotation_retires_the_old_refresh_token() {
    let (_store, service, jwt) = test_service();
    let first = register_ann(&service).await;

    service
        .refresh(RefreshCommand {
            refresh_token: first.refresh_token.to_string(),
            caller: Some(caller_from(&jwt, &first)),
        })
        .await
        .expect("first rotation should succeed");

    let replay = service
        .refresh(RefreshCommand {
            refresh_token: first.refresh_token.to_string(),
            caller: None,
        })
        .await;
    assert!(matches!(replay, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_refresh_rejects_access_token_from_another_pair() {
    let (_store, service, jwt) = test_service();
    register_ann(&service).await;

    let pair_a = login_ann(&service).await;
    let pair_b = login_ann(&service).await;

    // Same user, but pair B's access token against pair A's refresh token
    let result = service
        .refresh(RefreshCommand {
            refresh_token: pair_a.refresh_token.to_string(),
            caller: Some(caller_from(&jwt, &pair_b)),
        })
        .await;
    assert!(matches!(result, Err(AuthError::Forbidden(_))));

    // The matched pair still rotates fine
    assert!(service
        .refresh(RefreshCommand {
            refresh_token: pair_a.refresh_token.to_string(),
            caller: Some(caller_from(&jwt, &pair_a)),
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_refresh_rejects_another_users_session() {
    let (_store, service, jwt) = test_service();
    let ann = register_ann(&service).await;

    let bob = service
        .register(RegisterCommand {
            email: "bob@example.com".to_string(),
            password: "BobsPassword1!".to_string(),
            display_name: "Bob".to_string(),
        })
        .await
        .unwrap();

    let result = service
        .refresh(RefreshCommand {
            refresh_token: ann.refresh_token.to_string(),
            caller: Some(caller_from(&jwt, &bob)),
        })
        .await;
    assert!(matches!(result, Err(AuthError::Forbidden(_))));
}

#[tokio::test]
async fn test_expired_session_cannot_refresh() {
    let (store, service, _jwt) = test_service();
    register_ann(&service).await;

    let expired = RefreshSession {
        id: Uuid::new_v4(),
        user_id: UserId::new(),
        jti: Uuid::new_v4(),
        refresh_token: Uuid::new_v4(),
        created_at: Utc::now() - chrono::Duration::days(31),
        expires_at: Utc::now() - chrono::Duration::days(1),
    };
    store.insert_session(expired.clone());

    let result = service
        .refresh(RefreshCommand {
            refresh_token: expired.refresh_token.to_string(),
            caller: None,
        })
        .await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_garbage_refresh_token_behaves_as_unknown() {
    let (_store, service, _jwt) = test_service();
    register_ann(&service).await;

    let result = service
        .refresh(RefreshCommand {
            refresh_token: "not-a-uuid".to_string(),
            caller: None,
        })
        .await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn test_rotation_survives_old_session_delete_failure() {
    let (store, service, jwt) = test_service();
    let first = register_ann(&service).await;

    store.fail_session_deletes.store(true, Ordering::SeqCst);
    let rotated = service
        .refresh(RefreshCommand {
            refresh_token: first.refresh_token.to_string(),
            caller: Some(caller_from(&jwt, &first)),
        })
        .await
        .expect("rotation is fail-open on delete failure");
    store.fail_session_deletes.store(false, Ordering::SeqCst);

    // The new pair works, and the undeleted old session self-expires later
    assert!(service
        .refresh(RefreshCommand {
            refresh_token: rotated.refresh_token.to_string(),
            caller: None,
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_logout_all_devices_revokes_every_session() {
    let (store, service, jwt) = test_service();
    let first = register_ann(&service).await;
    let second = login_ann(&service).await;
    let third = login_ann(&service).await;

    let caller = caller_from(&jwt, &third);
    assert_eq!(store.session_count_for(&caller.user_id), 3);

    let ack = service
        .logout(
            LogoutCommand {
                refresh_token: None,
                all_devices: true,
            },
            &caller,
        )
        .await
        .unwrap();
    assert_eq!(ack.scope, LogoutScope::All);
    assert_eq!(store.session_count_for(&caller.user_id), 0);

    for pair in [first, second, third] {
        let result = service
            .refresh(RefreshCommand {
                refresh_token: pair.refresh_token.to_string(),
                caller: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }
}

#[tokio::test]
async fn test_password_change_revokes_sessions_and_rotates_credential() {
    let (_store, service, jwt) = test_service();
    let pair = register_ann(&service).await;
    let caller = caller_from(&jwt, &pair);

    let ack = service
        .change_password(
            ChangePasswordCommand {
                current_password: "CorrectHorse1!".to_string(),
                new_password: "EvenBetter2@".to_string(),
            },
            &caller,
        )
        .await
        .unwrap();
    assert!(ack.sessions_revoked);

    let replay = service
        .refresh(RefreshCommand {
            refresh_token: pair.refresh_token.to_string(),
            caller: None,
        })
        .await;
    assert!(matches!(replay, Err(AuthError::InvalidOrExpiredToken)));

    let old_password = service
        .login(LoginCommand {
            email: "ann@example.com".to_string(),
            password: "CorrectHorse1!".to_string(),
        })
        .await;
    assert!(matches!(old_password, Err(AuthError::InvalidCredentials)));

    assert!(service
        .login(LoginCommand {
            email: "ann@example.com".to_string(),
            password: "EvenBetter2@".to_string(),
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_change_email_conflicts_and_requires_password() {
    let (_store, service, jwt) = test_service();
    let ann = register_ann(&service).await;
    service
        .register(RegisterCommand {
            email: "bob@example.com".to_string(),
            password: "BobsPassword1!".to_string(),
            display_name: "Bob".to_string(),
        })
        .await
        .unwrap();

    let caller = caller_from(&jwt, &ann);

    let taken = service
        .change_email(
            ChangeEmailCommand {
                new_email: "BOB@example.com".to_string(),
                password: "CorrectHorse1!".to_string(),
            },
            &caller,
        )
        .await;
    assert!(matches!(taken, Err(AuthError::Conflict(_))));

    let wrong_password = service
        .change_email(
            ChangeEmailCommand {
                new_email: "ann.new@example.com".to_string(),
                password: "nope".to_string(),
            },
            &caller,
        )
        .await;
    assert!(matches!(wrong_password, Err(AuthError::Validation(_))));

    let ack = service
        .change_email(
            ChangeEmailCommand {
                new_email: "ann.new@example.com".to_string(),
                password: "CorrectHorse1!".to_string(),
            },
            &caller,
        )
        .await
        .unwrap();
    assert!(ack.sessions_revoked);

    assert!(service
        .login(LoginCommand {
            email: "ann.new@example.com".to_string(),
            password: "CorrectHorse1!".to_string(),
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_deleted_account_blocks_reregistration_and_login() {
    let (_store, service, jwt) = test_service();
    let pair = register_ann(&service).await;
    let caller = caller_from(&jwt, &pair);

    service.delete_profile(&caller).await.unwrap();

    // Idempotent
    assert!(service.delete_profile(&caller).await.is_ok());

    let reregister = service
        .register(RegisterCommand {
            email: "Ann@Example.com".to_string(),
            password: "Another1!".to_string(),
            display_name: "Ann Again".to_string(),
        })
        .await;
    assert!(matches!(reregister, Err(AuthError::Conflict(_))));

    let login = service
        .login(LoginCommand {
            email: "ann@example.com".to_string(),
            password: "CorrectHorse1!".to_string(),
        })
        .await;
    assert!(matches!(login, Err(AuthError::InvalidCredentials)));

    // Deleted accounts are not revealed
    assert!(!service.check_email("ann@example.com").await.unwrap());
}

#[tokio::test]
async fn test_check_email_sees_active_accounts_only() {
    let (_store, service, _jwt) = test_service();
    register_ann(&service).await;

    assert!(service.check_email("ANN@example.com").await.unwrap());
    assert!(!service.check_email("ghost@example.com").await.unwrap());
    assert!(!service.check_email("not-an-email").await.unwrap());
    assert!(service.check_email("   ").await.is_err());
}

#[tokio::test]
async fn test_permission_snapshot_is_stale_until_reissue() {
    let (store, service, jwt) = test_service();
    let pair = register_ann(&service).await;
    let caller = caller_from(&jwt, &pair);
    let policies = PolicyResolver::new();

    let issued_claims = claims_of(&jwt, &pair);
    assert!(policies.authorize(&issued_claims, "auth.service").is_ok());

    store.revoke_roles(&caller.user_id);

    // The outstanding token keeps its snapshot
    assert!(policies.authorize(&issued_claims, "auth.service").is_ok());

    // A fresh issuance reflects the revocation
    let new_pair = login_ann(&service).await;
    let new_claims = claims_of(&jwt, &new_pair);
    assert!(matches!(
        policies.authorize(&new_claims, "auth.service"),
        Err(AuthError::Forbidden(_))
    ));
}
