use super::*;

#[test]
fn game_from_row_maps_arrays() {
    let game = game_from_row(("g1".into(), vec!["c1".into(), "c2".into()], vec!["u1".into()]));
    assert_eq!(game.id, EntityId::new("g1"));
    assert_eq!(game.comments, vec![EntityId::new("c1"), EntityId::new("c2")]);
    assert_eq!(game.upvotes, vec![EntityId::new("u1")]);
}

#[test]
fn comment_from_row_maps_optional_parent() {
    let top = comment_from_row(("c1".into(), "g1".into(), None, "u1".into(), "hi".into(), vec!["c2".into()]));
    assert_eq!(top.parent_id, None);
    assert_eq!(top.children, vec![EntityId::new("c2")]);

    let reply = comment_from_row(("c2".into(), "g1".into(), Some("c1".into()), "u2".into(), "yo".into(), Vec::new()));
    assert_eq!(reply.parent_id, Some(EntityId::new("c1")));
    assert_eq!(reply.author, EntityId::new("u2"));
    assert_eq!(reply.content, "yo");
}

#[test]
fn id_strings_preserve_order() {
    let ids = vec![EntityId::new("b"), EntityId::new("a")];
    assert_eq!(id_strings(&ids), vec!["b".to_owned(), "a".to_owned()]);
}

#[test]
fn non_database_errors_are_not_unique_violations() {
    assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
}

// =============================================================================
// LIVE DATABASE
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::ids::new_record_id;
    use crate::services::comment::{NewComment, create_comment};
    use crate::services::tx::TxPolicy;
    use crate::services::vote::toggle_upvote;

    async fn store() -> (PgStore, PgPool) {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for live-db-tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("src/db/migrations").run(&pool).await.expect("migrate");
        (PgStore::new(pool.clone()), pool)
    }

    async fn seed_game(pool: &PgPool) -> EntityId {
        let id = new_record_id();
        sqlx::query("INSERT INTO games (id, title) VALUES ($1, 'live test')")
            .bind(id.as_str())
            .execute(pool)
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn rollback_discards_insert() {
        let (store, pool) = store().await;
        let game_id = seed_game(&pool).await;
        let comment_id = new_record_id();

        let mut txn = store.begin().await.unwrap();
        txn.insert_comment(&CommentRecord {
            id: comment_id.clone(),
            game_id: game_id.clone(),
            parent_id: None,
            author: EntityId::new("u1"),
            content: "gone".into(),
            children: Vec::new(),
        })
        .await
        .unwrap();
        txn.rollback().await.unwrap();

        let mut txn = store.begin().await.unwrap();
        assert!(txn.load_comment(&comment_id, LoadMode::Read).await.unwrap().is_none());
        txn.commit().await.unwrap();
    }

    #[tokio::test]
    async fn save_game_on_missing_row_is_missing() {
        let (store, _pool) = store().await;
        let mut txn = store.begin().await.unwrap();
        let err = txn.save_game(&GameRecord::new(new_record_id())).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }

    #[tokio::test]
    async fn comment_tree_is_linked_in_postgres() {
        let (store, pool) = store().await;
        let game_id = seed_game(&pool).await;
        let policy = TxPolicy::default();

        let root = create_comment(
            &store,
            policy,
            &NewComment { game_id: game_id.clone(), parent_id: None, author: EntityId::new("u1"), content: "a".into() },
        )
        .await
        .unwrap();
        let child = create_comment(
            &store,
            policy,
            &NewComment {
                game_id: game_id.clone(),
                parent_id: Some(root.clone()),
                author: EntityId::new("u2"),
                content: "b".into(),
            },
        )
        .await
        .unwrap();

        let mut txn = store.begin().await.unwrap();
        let game = txn.load_game(&game_id, LoadMode::Read).await.unwrap().unwrap();
        let parent = txn.load_comment(&root, LoadMode::Read).await.unwrap().unwrap();
        txn.commit().await.unwrap();
        assert_eq!(game.comments, vec![root]);
        assert_eq!(parent.children, vec![child]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_by_distinct_users_all_count() {
        let (store, pool) = store().await;
        let game_id = seed_game(&pool).await;

        let mut handles = Vec::new();
        for n in 0..10 {
            let store = store.clone();
            let game_id = game_id.clone();
            handles.push(tokio::spawn(async move {
                toggle_upvote(&store, TxPolicy::default(), &game_id, &EntityId::new(format!("u{n}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut txn = store.begin().await.unwrap();
        let game = txn.load_game(&game_id, LoadMode::Read).await.unwrap().unwrap();
        txn.commit().await.unwrap();
        assert_eq!(game.upvotes.len(), 10);
    }
}
