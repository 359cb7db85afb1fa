use graphmind_core::db::migrations::{current_version, latest_version};
use graphmind_core::db::{open_db, open_shared, open_shared_in_memory, DbError};
use graphmind_core::{
    ContentPatch, ItemType, ManualClock, RepoError, SqliteVaultRepository, VaultItem, VaultQuery,
    VaultRepository, VaultService, VaultServiceError, VaultUpsert,
};
use serde_json::json;
use uuid::Uuid;

fn sqlite_service(clock: &ManualClock) -> VaultService<SqliteVaultRepository> {
    let conn = open_shared_in_memory().unwrap();
    let repo = SqliteVaultRepository::try_new(conn).unwrap();
    VaultService::new(repo).with_clock(Box::new(clock.clone()))
}

#[test]
fn open_db_applies_all_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("vault.sqlite3")).unwrap();
    assert_eq!(current_version(&conn).unwrap(), latest_version());
}

#[test]
fn open_db_rejects_newer_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }

    let result = open_db(&path);
    assert!(matches!(
        result,
        Err(DbError::UnsupportedSchemaVersion { db_version: 99, .. })
    ));
}

#[test]
fn sqlite_roundtrip_preserves_every_field() {
    let clock = ManualClock::new(1_000);
    let service = sqlite_service(&clock);

    let created = service
        .create(
            "owner-a",
            serde_json::from_value(json!({
                "type": "array3d",
                "title": "Voxels",
                "tags": ["scan", "ct"],
                "content": [[[1, 2], [3, 4]], [[5, 6], [7, 8]]],
                "links": ["project-7", { "kind": "studio" }]
            }))
            .unwrap(),
        )
        .unwrap();

    let loaded = service.get_owned("owner-a", created.id).unwrap();
    assert_eq!(loaded, created);
    let dims = loaded.shape().and_then(|shape| shape.dims_label());
    assert_eq!(dims.as_deref(), Some("2x2x2"));
}

#[test]
fn sqlite_upsert_is_last_write_wins() {
    let clock = ManualClock::new(1_000);
    let service = sqlite_service(&clock);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Curve3d))
        .unwrap();

    clock.advance(1);
    service
        .patch_content(
            "owner-a",
            created.id,
            ContentPatch::new(json!({ "x": "t", "y": "t", "z": "t", "samples": 99 })),
        )
        .unwrap();
    clock.advance(1);
    let last = service
        .patch_content(
            "owner-a",
            created.id,
            ContentPatch::new(json!({ "x": "sin(t)", "samples": 12 })),
        )
        .unwrap();

    let loaded = service.get_owned("owner-a", created.id).unwrap();
    assert_eq!(loaded, last);
    assert_eq!(loaded.expr(), Some("x(t)=sin(t)"));
    assert_eq!(loaded.samples(), Some(12));
}

#[test]
fn sqlite_listing_orders_by_recency_and_scopes_owner() {
    let clock = ManualClock::new(1_000);
    let service = sqlite_service(&clock);

    for title in ["old", "mid", "new"] {
        clock.advance(10);
        service
            .create(
                "owner-a",
                serde_json::from_value(json!({ "type": "equation", "title": title })).unwrap(),
            )
            .unwrap();
    }
    service
        .create("owner-b", VaultUpsert::new(ItemType::Equation))
        .unwrap();

    let titles: Vec<String> = service
        .list_full("owner-a", &VaultQuery::new())
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, vec!["new", "mid", "old"]);
}

#[test]
fn sqlite_foreign_owner_sees_not_found_and_cannot_delete() {
    let clock = ManualClock::new(1_000);
    let service = sqlite_service(&clock);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Surface3d))
        .unwrap();

    assert!(matches!(
        service.get_owned("owner-b", created.id),
        Err(VaultServiceError::NotFound(_))
    ));
    service.delete("owner-b", created.id).unwrap();
    assert!(service.get_owned("owner-a", created.id).is_ok());

    service.delete("owner-a", created.id).unwrap();
    assert!(matches!(
        service.get_owned("owner-a", created.id),
        Err(VaultServiceError::NotFound(_))
    ));
}

#[test]
fn sqlite_repo_rejects_writes_into_foreign_partition() {
    let repo = SqliteVaultRepository::try_new(open_shared_in_memory().unwrap()).unwrap();
    let item = VaultItem {
        id: Uuid::new_v4(),
        owner_id: "owner-a".to_string(),
        title: "Line".to_string(),
        body: graphmind_core::ItemBody::empty(ItemType::Equation),
        tags: Vec::new(),
        content: None,
        links: Vec::new(),
        updated_at: 1,
    };

    assert!(matches!(
        repo.put_item("owner-b", &item),
        Err(RepoError::OwnerMismatch { .. })
    ));
    assert!(matches!(
        repo.get_item("owner-a", item.id),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.sqlite3");
    let clock = ManualClock::new(1_000);

    let created = {
        let repo = SqliteVaultRepository::try_new(open_shared(&path).unwrap()).unwrap();
        let service = VaultService::new(repo).with_clock(Box::new(clock.clone()));
        service
            .create(
                "owner-a",
                serde_json::from_value(json!({ "type": "equation", "formula": "e=mc^2" }))
                    .unwrap(),
            )
            .unwrap()
    };

    let repo = SqliteVaultRepository::try_new(open_shared(&path).unwrap()).unwrap();
    assert_eq!(repo.get_item("owner-a", created.id).unwrap(), created);
}

#[test]
fn try_new_requires_migrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let shared = graphmind_core::db::share(conn);
    assert!(matches!(
        SqliteVaultRepository::try_new(shared),
        Err(RepoError::Db(_))
    ));
}

#[test]
fn create_after_reopen_is_not_stamped_before_stored_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.sqlite3");

    let stored = {
        let repo = SqliteVaultRepository::try_new(open_shared(&path).unwrap()).unwrap();
        let service = VaultService::new(repo).with_clock(Box::new(ManualClock::new(5_000)));
        service
            .create("owner-a", VaultUpsert::new(ItemType::Equation))
            .unwrap()
    };

    let repo = SqliteVaultRepository::try_new(open_shared(&path).unwrap()).unwrap();
    let service = VaultService::new(repo).with_clock(Box::new(ManualClock::new(4_000)));
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Curve3d))
        .unwrap();
    assert_eq!(stored.updated_at, 5_000);
    assert!(created.updated_at >= stored.updated_at);

    let other_owner = service
        .create("owner-b", VaultUpsert::new(ItemType::Curve3d))
        .unwrap();
    assert_eq!(other_owner.updated_at, 4_000);
}

#[test]
fn concurrent_writers_on_shared_connection_all_land() {
    let clock = ManualClock::new(1_000);
    let service = sqlite_service(&clock);

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let service = &service;
            scope.spawn(move || {
                for index in 0..25 {
                    let created = service
                        .create("owner-a", VaultUpsert::new(ItemType::Equation))
                        .unwrap();
                    service
                        .patch_meta(
                            "owner-a",
                            created.id,
                            serde_json::from_value(json!({
                                "title": format!("w{worker}-{index}"),
                                "tags": ["bulk"]
                            }))
                            .unwrap(),
                        )
                        .unwrap();
                }
            });
        }
    });

    let listed = service
        .list_full("owner-a", &VaultQuery::new().with_tag("bulk"))
        .unwrap();
    assert_eq!(listed.len(), 100);
}

#[test]
fn concurrent_same_key_writes_keep_one_writer_result() {
    let clock = ManualClock::new(1_000);
    let service = sqlite_service(&clock);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Equation))
        .unwrap();

    let results: Vec<VaultItem> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let service = &service;
                scope.spawn(move || {
                    service
                        .patch_meta(
                            "owner-a",
                            created.id,
                            serde_json::from_value(json!({ "title": format!("writer {writer}") }))
                                .unwrap(),
                        )
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let stored = service.get_owned("owner-a", created.id).unwrap();
    assert!(results.contains(&stored));
}
