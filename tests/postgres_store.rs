//! Credential store tests against a real Postgres.
//!
//! Each test creates its own database from `configuration.yaml` (or `APP__`
//! overrides) and migrates it. Run with `cargo test -- --ignored` when a
//! server is available.

use nevernote::configuration::{get_configuration, DatabaseSettings};
use nevernote::error::{AppError, AuthError, DatabaseError};
use nevernote::store::{NewUser, PgUserRepository, UserRepository};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

async fn spawn_repository() -> PgUserRepository {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    PgUserRepository::new(configure_database(&configuration.database).await)
}

fn new_user(email: &str) -> NewUser {
    NewUser::new(email.to_string(), "hash".to_string())
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn create_and_find_user() {
    let repo = spawn_repository().await;

    let user = repo.create(new_user("ursula@example.com")).await.unwrap();

    assert_eq!(user.token_version, 0);
    assert_eq!(user.username, "ursula");
    let by_id = repo.find_by_id(user.id).await.unwrap().expect("User not found by id");
    assert_eq!(by_id.email, "ursula@example.com");
    let by_email = repo
        .find_by_email("ursula@example.com")
        .await
        .unwrap()
        .expect("User not found by email");
    assert_eq!(by_email.id, user.id);
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicate_email_maps_to_duplicate_account() {
    let repo = spawn_repository().await;
    repo.create(new_user("ursula@example.com")).await.unwrap();

    let err = repo.create(new_user("ursula@example.com")).await.unwrap_err();

    assert_eq!(err.auth_kind(), Some(AuthError::DuplicateAccount));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn increment_unknown_user_is_not_found() {
    let repo = spawn_repository().await;

    let err = repo.increment_token_version(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a running Postgres"]
async fn concurrent_increments_are_all_counted() {
    let repo = Arc::new(spawn_repository().await);
    let user = repo.create(new_user("ursula@example.com")).await.unwrap();
    let user_id = user.id;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment_token_version(user_id).await })
        })
        .collect();

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().expect("Increment failed"));
    }
    versions.sort_unstable();

    // every caller saw a distinct version: 1..=20
    assert_eq!(versions, (1..=20).collect::<Vec<i32>>());
    let stored = repo.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(stored.token_version, 20);
}
