use super::*;

#[tokio::test]
async fn static_sessions_resolve_known_tokens() {
    let sessions = StaticSessions::new([("tok-1".to_owned(), EntityId::new("u1"))]);
    assert_eq!(sessions.resolve("tok-1").await.unwrap(), Some(EntityId::new("u1")));
}

#[tokio::test]
async fn static_sessions_reject_unknown_tokens() {
    let sessions = StaticSessions::new([("tok-1".to_owned(), EntityId::new("u1"))]);
    assert_eq!(sessions.resolve("tok-2").await.unwrap(), None);
    assert_eq!(sessions.resolve("").await.unwrap(), None);
}

#[tokio::test]
async fn default_static_sessions_resolve_nothing() {
    assert_eq!(StaticSessions::default().resolve("tok-1").await.unwrap(), None);
}

#[test]
fn identity_error_code() {
    let err = IdentityError::Database(sqlx::Error::PoolTimedOut);
    assert_eq!(err.error_code(), "E_IDENTITY");
    assert!(!err.retryable());
}

// =============================================================================
// PgSessions (live database)
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;

    async fn pool() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for live-db-tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("src/db/migrations").run(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn pg_sessions_resolve_active_and_ignore_expired() {
        let pool = pool().await;
        let user = crate::ids::new_record_id();
        let active = crate::ids::new_record_id();
        let expired = crate::ids::new_record_id();
        sqlx::query("INSERT INTO users (id, name) VALUES ($1, 'Live Test')")
            .bind(user.as_str())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(active.as_str())
            .bind(user.as_str())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, now() - interval '1 day')")
            .bind(expired.as_str())
            .bind(user.as_str())
            .execute(&pool)
            .await
            .unwrap();

        let sessions = PgSessions::new(pool);
        assert_eq!(sessions.resolve(active.as_str()).await.unwrap(), Some(user));
        assert_eq!(sessions.resolve(expired.as_str()).await.unwrap(), None);
    }
}
