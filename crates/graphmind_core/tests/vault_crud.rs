use graphmind_core::{
    InMemoryVaultRepository, ItemType, ManualClock, VaultQuery, VaultRepository, VaultService,
    VaultServiceError, VaultUpsert,
};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

fn service_at(start_ms: i64) -> (VaultService<InMemoryVaultRepository>, ManualClock) {
    let clock = ManualClock::new(start_ms);
    let service =
        VaultService::new(InMemoryVaultRepository::new()).with_clock(Box::new(clock.clone()));
    (service, clock)
}

fn upsert(body: serde_json::Value) -> VaultUpsert {
    serde_json::from_value(body).unwrap()
}

#[test]
fn create_assigns_unique_ids_and_non_decreasing_timestamps() {
    let service = VaultService::new(InMemoryVaultRepository::new());

    let mut ids = HashSet::new();
    let mut last_updated_at = i64::MIN;
    for index in 0..50 {
        let body = upsert(json!({ "type": "equation", "title": format!("eq {index}") }));
        let item = service.create("owner-a", body).unwrap();
        assert!(ids.insert(item.id));
        assert!(item.updated_at >= last_updated_at);
        last_updated_at = item.updated_at;
    }
}

#[test]
fn create_fills_type_defaults() {
    let (service, _clock) = service_at(1_000);

    let item = service
        .create("owner-a", VaultUpsert::new(ItemType::Surface3d))
        .unwrap();
    assert_eq!(item.title, "3D Surface");
    assert_eq!(item.owner_id, "owner-a");
    assert!(item.tags.is_empty());
    assert!(item.links.is_empty());
    assert_eq!(item.content, None);
    assert_eq!(item.updated_at, 1_000);
}

#[test]
fn create_drops_formula_for_non_equation() {
    let (service, _clock) = service_at(1_000);

    let item = service
        .create(
            "owner-a",
            upsert(json!({ "type": "curve3d", "formula": "y=x", "expr": "t" })),
        )
        .unwrap();
    assert_eq!(item.formula(), None);
    assert_eq!(item.expr(), Some("t"));
}

#[test]
fn rejected_create_leaves_store_untouched() {
    let (service, _clock) = service_at(1_000);

    let missing = service.create("owner-a", upsert(json!({ "title": "no type" })));
    assert!(matches!(missing, Err(VaultServiceError::InvalidArgument(_))));

    let invalid = service.create("owner-a", upsert(json!({ "type": "torus" })));
    assert!(matches!(invalid, Err(VaultServiceError::InvalidArgument(_))));

    assert!(service
        .repository()
        .list_by_owner("owner-a")
        .unwrap()
        .is_empty());
}

#[test]
fn update_preserves_identity_and_refreshes_timestamp() {
    let (service, clock) = service_at(1_000);
    let created = service
        .create(
            "owner-a",
            upsert(json!({
                "type": "equation",
                "title": "Line",
                "formula": "y=x",
                "tags": ["algebra"]
            })),
        )
        .unwrap();

    clock.set(2_000);
    let updated = service
        .update(
            "owner-a",
            created.id,
            upsert(json!({ "title": "Parabola", "formula": "y=x^2" })),
        )
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.owner_id, "owner-a");
    assert_eq!(updated.title, "Parabola");
    assert_eq!(updated.formula(), Some("y=x^2"));
    assert_eq!(updated.tags, vec!["algebra".to_string()]);
    assert_eq!(updated.updated_at, 2_000);
    assert_eq!(service.get_owned("owner-a", created.id).unwrap(), updated);
}

#[test]
fn update_never_moves_timestamp_backwards() {
    let (service, clock) = service_at(5_000);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Equation))
        .unwrap();

    clock.set(4_000);
    let updated = service
        .update("owner-a", created.id, upsert(json!({ "title": "Later" })))
        .unwrap();
    assert_eq!(updated.updated_at, 5_000);
}

#[test]
fn update_keeps_fields_sent_as_null_or_blank() {
    let (service, clock) = service_at(1_000);
    let created = service
        .create(
            "owner-a",
            upsert(json!({
                "type": "surface3d",
                "title": "Saddle",
                "expr": "x^2-y^2",
                "samples": 32,
                "tags": ["geo"]
            })),
        )
        .unwrap();

    clock.advance(10);
    let updated = service
        .update(
            "owner-a",
            created.id,
            upsert(json!({ "title": "  ", "expr": null, "samples": null, "tags": null })),
        )
        .unwrap();

    assert_eq!(updated.title, "Saddle");
    assert_eq!(updated.expr(), Some("x^2-y^2"));
    assert_eq!(updated.samples(), Some(32));
    assert_eq!(updated.tags, vec!["geo".to_string()]);
}

#[test]
fn missing_item_operations_return_not_found() {
    let (service, _clock) = service_at(1_000);
    let id = Uuid::new_v4();

    assert!(matches!(
        service.get_owned("owner-a", id),
        Err(VaultServiceError::NotFound(missing)) if missing == id
    ));
    assert!(matches!(
        service.update("owner-a", id, upsert(json!({ "title": "x" }))),
        Err(VaultServiceError::NotFound(_))
    ));
}

#[test]
fn foreign_owner_cannot_read_update_or_delete() {
    let (service, _clock) = service_at(1_000);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Equation))
        .unwrap();

    assert!(matches!(
        service.get_owned("owner-b", created.id),
        Err(VaultServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.update("owner-b", created.id, upsert(json!({ "title": "stolen" }))),
        Err(VaultServiceError::NotFound(_))
    ));

    service.delete("owner-b", created.id).unwrap();
    assert_eq!(service.get_owned("owner-a", created.id).unwrap(), created);
    assert!(service
        .list_full("owner-b", &VaultQuery::new())
        .unwrap()
        .is_empty());
}

#[test]
fn delete_removes_item_and_is_idempotent() {
    let (service, _clock) = service_at(1_000);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Array3d))
        .unwrap();

    service.delete("owner-a", created.id).unwrap();
    assert!(matches!(
        service.get_owned("owner-a", created.id),
        Err(VaultServiceError::NotFound(_))
    ));

    service.delete("owner-a", created.id).unwrap();
}

#[test]
fn create_is_not_stamped_before_owner_newest_item() {
    let (service, clock) = service_at(9_000);
    let first = service
        .create("owner-a", VaultUpsert::new(ItemType::Equation))
        .unwrap();

    clock.set(3_000);
    let second = service
        .create("owner-a", VaultUpsert::new(ItemType::Equation))
        .unwrap();
    assert!(second.updated_at >= first.updated_at);
}

#[test]
fn concurrent_creates_and_patches_on_distinct_items_all_land() {
    let service = VaultService::new(InMemoryVaultRepository::new());

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let service = &service;
            scope.spawn(move || {
                for index in 0..50 {
                    let created = service
                        .create("owner-a", VaultUpsert::new(ItemType::Curve3d))
                        .unwrap();
                    let patch = serde_json::from_value(json!({
                        "title": format!("w{worker}-{index}"),
                        "tags": ["bulk"]
                    }))
                    .unwrap();
                    service.patch_meta("owner-a", created.id, patch).unwrap();
                }
            });
        }
    });

    let listed = service
        .list_full("owner-a", &VaultQuery::new().with_tag("bulk"))
        .unwrap();
    assert_eq!(listed.len(), 400);
    let titles: HashSet<String> = listed.into_iter().map(|item| item.title).collect();
    assert_eq!(titles.len(), 400);
}

#[test]
fn concurrent_same_key_writes_are_last_write_wins() {
    let (service, _clock) = service_at(1_000);
    let created = service
        .create("owner-a", VaultUpsert::new(ItemType::Equation))
        .unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let service = &service;
                scope.spawn(move || {
                    let body = upsert(json!({ "formula": format!("y={writer}x") }));
                    service.update("owner-a", created.id, body).unwrap()
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
