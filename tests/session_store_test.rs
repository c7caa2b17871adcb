mod common;

use classroom_auth::stores::SessionStore;
use classroom_auth::types::db::{session, user};
use classroom_auth::types::internal::Role;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use common::{create_user, setup_test_app, TEST_SESSION_SECRET};

#[tokio::test]
async fn test_issue_and_resolve() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Teacher).await;

    let token = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();
    let resolved = app.session_store.resolve(&app.db, &token).await.unwrap().unwrap();

    assert_eq!(resolved.id, alice.id);
    assert_eq!(resolved.role, Role::Teacher);
}

#[tokio::test]
async fn test_only_token_hash_is_stored() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;

    let token = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();
    let rows = session::Entity::find().all(&app.db).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].token_hash, token);
    assert_eq!(rows[0].token_hash, app.session_store.hash_token(&token));
    assert_eq!(rows[0].user_id, alice.id);
}

#[tokio::test]
async fn test_hash_depends_on_secret() {
    let a = SessionStore::new(TEST_SESSION_SECRET.as_bytes()).unwrap();
    let b = SessionStore::new(b"some-other-secret-that-is-long-enough").unwrap();

    assert_eq!(a.hash_token("token"), a.hash_token("token"));
    assert_ne!(a.hash_token("token"), b.hash_token("token"));
}

#[tokio::test]
async fn test_tokens_are_unique() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;

    let first = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();
    let second = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();

    assert_ne!(first, second);
    assert!(first.len() >= 43);
}

#[tokio::test]
async fn test_zero_ttl_expires_immediately_and_row_is_removed() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;

    let token = app.session_store.issue(&app.db, &alice.id, 0).await.unwrap();

    assert!(app.session_store.resolve(&app.db, &token).await.unwrap().is_none());
    assert!(app.session_store.resolve(&app.db, &token).await.unwrap().is_none());
    assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_and_empty_tokens_resolve_to_none() {
    let app = setup_test_app().await;

    assert!(app.session_store.resolve(&app.db, "").await.unwrap().is_none());
    assert!(app.session_store.resolve(&app.db, "not-a-token").await.unwrap().is_none());
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;
    let token = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();

    assert_eq!(
        app.session_store.revoke(&app.db, &token).await.unwrap(),
        Some(alice.id.clone())
    );
    assert_eq!(app.session_store.revoke(&app.db, &token).await.unwrap(), None);
    assert!(app.session_store.resolve(&app.db, &token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_revoke_all_and_revoke_all_except() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;
    let bob = create_user(&app, "bob", "Chalkboard7", Role::Student).await;

    let keep = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();
    for _ in 0..2 {
        app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();
    }
    let bobs = app.session_store.issue(&app.db, &bob.id, 3600).await.unwrap();

    assert_eq!(
        app.session_store
            .revoke_all_except(&app.db, &alice.id, &keep)
            .await
            .unwrap(),
        2
    );
    assert!(app.session_store.resolve(&app.db, &keep).await.unwrap().is_some());

    assert_eq!(app.session_store.revoke_all(&app.db, &alice.id).await.unwrap(), 1);
    assert!(app.session_store.resolve(&app.db, &keep).await.unwrap().is_none());

    // Other users are untouched
    assert!(app.session_store.resolve(&app.db, &bobs).await.unwrap().is_some());
}

#[tokio::test]
async fn test_purge_expired() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;

    let live = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();
    app.session_store.issue(&app.db, &alice.id, 0).await.unwrap();
    app.session_store.issue(&app.db, &alice.id, -60).await.unwrap();

    assert_eq!(app.auth_service.purge_expired_sessions().await.unwrap(), 2);
    assert_eq!(app.session_store.purge_expired(&app.db).await.unwrap(), 0);
    assert!(app.session_store.resolve(&app.db, &live).await.unwrap().is_some());
}

async fn set_active(db: &DatabaseConnection, user_id: &str, active: bool) {
    user::Entity::update_many()
        .col_expr(user::Column::IsActive, Expr::value(active))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_live_session_of_disabled_user_does_not_resolve() {
    let app = setup_test_app().await;
    let alice = create_user(&app, "alice", "Chalkboard7", Role::Student).await;
    let token = app.session_store.issue(&app.db, &alice.id, 3600).await.unwrap();

    // Flip the flag on the row itself so the session survives
    set_active(&app.db, &alice.id, false).await;

    assert!(app.session_store.resolve(&app.db, &token).await.unwrap().is_none());
    assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 1);

    set_active(&app.db, &alice.id, true).await;
    let resolved = app.session_store.resolve(&app.db, &token).await.unwrap().unwrap();
    assert_eq!(resolved.id, alice.id);
}
