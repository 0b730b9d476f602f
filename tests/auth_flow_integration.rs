//! Integration tests for the session-token lifecycle.
//!
//! Exercises the issue -> validate -> revoke pipeline end to end against a
//! real SQLite-backed user store, without going through HTTP.

use std::sync::Arc;

use taskhub_backend::auth::{
    AuthError, JwtHandler, RevocationRegistry, SessionAuthenticator, UserStore,
};
use tempfile::NamedTempFile;

struct Fixture {
    users: Arc<UserStore>,
    jwt: Arc<JwtHandler>,
    revocations: Arc<RevocationRegistry>,
    sessions: SessionAuthenticator,
    _temp: NamedTempFile,
}

fn fixture() -> Fixture {
    let temp = NamedTempFile::new().unwrap();
    let users = Arc::new(UserStore::new(temp.path().to_str().unwrap()).unwrap());
    let jwt = Arc::new(JwtHandler::new("integration-test-secret".to_string(), 30));
    let revocations = Arc::new(RevocationRegistry::new());
    let sessions = SessionAuthenticator::new(jwt.clone(), revocations.clone(), users.clone());

    Fixture {
        users,
        jwt,
        revocations,
        sessions,
        _temp: temp,
    }
}

#[test]
fn issue_validate_revoke_lifecycle() {
    let fx = fixture();
    let user = fx
        .users
        .create_user("u1", "u1@example.com", "password123")
        .unwrap()
        .expect("registration should succeed");

    // Freshly issued token resolves back to its subject
    let (token, expires_in) = fx.jwt.issue_token(&user.id).unwrap();
    assert_eq!(expires_in, 30 * 60);

    let resolved = fx.sessions.authenticate(&token).unwrap();
    assert_eq!(resolved.id, user.id);
    assert_eq!(resolved.username, "u1");

    // After revocation the same token is terminally rejected, even though
    // signature and expiry would still be fine
    let expires_at = fx.jwt.peek_expiry(&token).unwrap();
    fx.revocations.revoke(&token, expires_at);

    assert!(matches!(
        fx.sessions.authenticate(&token),
        Err(AuthError::Revoked)
    ));

    // Revoking again changes nothing
    fx.revocations.revoke(&token, expires_at);
    assert!(matches!(
        fx.sessions.authenticate(&token),
        Err(AuthError::Revoked)
    ));
    assert_eq!(fx.revocations.len(), 1);
}

#[test]
fn expired_token_rejected_without_revocation() {
    let fx = fixture();
    let user = fx
        .users
        .create_user("u2", "u2@example.com", "password123")
        .unwrap()
        .unwrap();

    let (token, _) = fx.jwt.issue_token_with_ttl(&user.id, -1).unwrap();
    assert!(matches!(
        fx.sessions.authenticate(&token),
        Err(AuthError::InvalidToken)
    ));
}

#[test]
fn soft_deleted_user_fails_validation_with_live_token() {
    let fx = fixture();
    let user = fx
        .users
        .create_user("u3", "u3@example.com", "password123")
        .unwrap()
        .unwrap();

    let (token, _) = fx.jwt.issue_token(&user.id).unwrap();
    assert!(fx.sessions.authenticate(&token).is_ok());

    fx.users.set_active(&user.id, false).unwrap();

    // Token is unexpired and unrevoked, yet the subject is now absent
    assert!(matches!(
        fx.sessions.authenticate(&token),
        Err(AuthError::UserNotFound)
    ));
}

#[test]
fn duplicate_registration_keeps_first_record() {
    let fx = fixture();

    fx.users
        .create_user("alice", "a@x.com", "pw1")
        .unwrap()
        .expect("first registration should succeed");

    let second = fx.users.create_user("alice", "b@y.com", "pw2").unwrap();
    assert!(second.is_none());

    let kept = fx.users.find_by_username("alice").unwrap().unwrap();
    assert_eq!(kept.email, "a@x.com");
    assert!(fx
        .users
        .verify_credentials("alice", "pw1")
        .unwrap()
        .is_some());
    assert!(fx
        .users
        .verify_credentials("alice", "pw2")
        .unwrap()
        .is_none());
}

#[test]
fn concurrent_sessions_are_independent() {
    let fx = fixture();
    let user = fx
        .users
        .create_user("u4", "u4@example.com", "password123")
        .unwrap()
        .unwrap();

    // A user may hold several live tokens; revoking one leaves the others
    let (first, _) = fx.jwt.issue_token_with_ttl(&user.id, 30).unwrap();
    let (second, _) = fx.jwt.issue_token_with_ttl(&user.id, 60).unwrap();
    assert_ne!(first, second);

    let exp = fx.jwt.peek_expiry(&first).unwrap();
    fx.revocations.revoke(&first, exp);

    assert!(matches!(
        fx.sessions.authenticate(&first),
        Err(AuthError::Revoked)
    ));
    assert!(fx.sessions.authenticate(&second).is_ok());
}
