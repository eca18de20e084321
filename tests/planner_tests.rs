//! End-to-end planning tests against in-memory vault stores.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vault_sync::identity;
use vault_sync::item::{CustomField, Login, LoginUri, VaultItem};
use vault_sync::planner::SyncPlanner;
use vault_sync::store::{StoreError, StoreResult, VaultStore};

/// In-memory vault store double. Mutation calls are counted so tests can
/// assert that planning never writes to either side.
struct MemoryStore {
    items: Mutex<Vec<VaultItem>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    fn new(items: Vec<VaultItem>) -> Self {
        MemoryStore {
            items: Mutex::new(items),
            writes: AtomicUsize::new(0),
        }
    }

    fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl VaultStore for MemoryStore {
    fn list_items(&self) -> StoreResult<Vec<VaultItem>> {
        Ok(self.items.lock().unwrap().clone())
    }

    fn get_item(&self, id: &str) -> StoreResult<VaultItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| StoreError::Protocol(format!("no item {id}")))
    }

    fn create_item(&self, item: &VaultItem) -> StoreResult<VaultItem> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.items.lock().unwrap().push(item.clone());
        Ok(item.clone())
    }

    fn edit_item(&self, _id: &str, item: &VaultItem) -> StoreResult<VaultItem> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(item.clone())
    }

    fn delete_item(&self, _id: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Delegating wrapper so a test can keep a handle on a store after the
/// planner takes ownership of its box.
struct SharedStore(Arc<MemoryStore>);

impl VaultStore for SharedStore {
    fn list_items(&self) -> StoreResult<Vec<VaultItem>> {
        self.0.list_items()
    }

    fn get_item(&self, id: &str) -> StoreResult<VaultItem> {
        self.0.get_item(id)
    }

    fn create_item(&self, item: &VaultItem) -> StoreResult<VaultItem> {
        self.0.create_item(item)
    }

    fn edit_item(&self, id: &str, item: &VaultItem) -> StoreResult<VaultItem> {
        self.0.edit_item(id, item)
    }

    fn delete_item(&self, id: &str) -> StoreResult<()> {
        self.0.delete_item(id)
    }
}

/// Store whose fetch always fails.
struct UnreachableStore;

impl VaultStore for UnreachableStore {
    fn list_items(&self) -> StoreResult<Vec<VaultItem>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn get_item(&self, _id: &str) -> StoreResult<VaultItem> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn create_item(&self, _item: &VaultItem) -> StoreResult<VaultItem> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn edit_item(&self, _id: &str, _item: &VaultItem) -> StoreResult<VaultItem> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn delete_item(&self, _id: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn login_item(id: &str, name: &str, username: &str, uri: &str) -> VaultItem {
    VaultItem {
        id: Some(id.to_string()),
        name: name.to_string(),
        login: Some(Login {
            username: Some(username.to_string()),
            uris: Some(vec![LoginUri {
                uri: Some(uri.to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn planner(source: Vec<VaultItem>, destination: Vec<VaultItem>) -> SyncPlanner {
    SyncPlanner::with_workers(
        Box::new(MemoryStore::new(source)),
        Box::new(MemoryStore::new(destination)),
        4,
    )
    .unwrap()
}

#[test]
fn scenario_a_source_only_item_is_created() {
    let bank = login_item("src-1", "Bank", "alice", "https://bank.com");
    let plan = planner(vec![bank], vec![]).plan().unwrap();

    assert_eq!(plan.to_create.len(), 1);
    assert_eq!(plan.to_create[0].name, "Bank");
    assert!(plan.to_update.is_empty());
    assert!(plan.to_delete.is_empty());
}

#[test]
fn scenario_b_identical_content_different_metadata_is_noop() {
    let mut src = login_item("src-1", "Bank", "alice", "https://bank.com");
    let mut dst = login_item("dst-9", "Bank", "alice", "https://bank.com");
    src.revision_date = Some("2026-01-01T00:00:00Z".to_string());
    dst.revision_date = Some("2026-06-15T12:00:00Z".to_string());
    let shared = identity::compute_fingerprint(&src);
    identity::set_fingerprint(&mut src, &shared);
    identity::set_fingerprint(&mut dst, &shared);

    let plan = planner(vec![src], vec![dst]).plan().unwrap();
    assert!(plan.is_empty());
}

#[test]
fn scenario_c_custom_field_change_is_an_update() {
    let mut src = login_item("src-1", "Bank", "alice", "https://bank.com");
    let mut dst = login_item("dst-1", "Bank", "alice", "https://bank.com");
    src.set_custom_field("env", "staging");
    dst.set_custom_field("env", "prod");

    let plan = planner(vec![src], vec![dst]).plan().unwrap();
    assert_eq!(plan.to_update.len(), 1);
    let (update_src, update_dst) = &plan.to_update[0];
    assert_eq!(update_src.id.as_deref(), Some("src-1"));
    assert_eq!(update_dst.id.as_deref(), Some("dst-1"));
    assert!(plan.to_create.is_empty());
    assert!(plan.to_delete.is_empty());
}

#[test]
fn scenario_d_unmatched_destination_item_is_deleted() {
    let src = login_item("src-1", "Bank", "alice", "https://bank.com");
    let dst_known = login_item("dst-1", "Bank", "alice", "https://bank.com");
    let dst_stale = login_item("dst-2", "Old Forum", "bob", "https://forum.example.org");

    let plan = planner(vec![src], vec![dst_known, dst_stale]).plan().unwrap();
    assert_eq!(plan.to_delete.len(), 1);
    assert_eq!(plan.to_delete[0].name, "Old Forum");
    assert!(plan.to_create.is_empty());
}

#[test]
fn scenario_e_blank_identity_items_fuzzy_match() {
    // Neither side can fingerprint these (empty name, username, and URI),
    // so they meet in the fuzzy phase on identical (name, first URI) keys.
    let mut src = VaultItem {
        id: Some("src-1".to_string()),
        ..Default::default()
    };
    src.notes = Some("from source".to_string());
    let mut dst = VaultItem {
        id: Some("dst-1".to_string()),
        ..Default::default()
    };
    dst.notes = Some("from destination".to_string());

    let plan = planner(vec![src.clone()], vec![dst]).plan().unwrap();
    // Fuzzy-matched pair with differing notes lands in to_update
    assert_eq!(plan.to_update.len(), 1);
    assert!(plan.to_create.is_empty());
    assert!(plan.to_delete.is_empty());

    // Same pair with identical content is left unchanged
    let dst_same = VaultItem {
        id: Some("dst-2".to_string()),
        notes: Some("from source".to_string()),
        ..Default::default()
    };
    let plan = planner(vec![src], vec![dst_same]).plan().unwrap();
    assert!(plan.is_empty());
}

#[test]
fn no_op_when_vaults_are_identical() {
    let items: Vec<VaultItem> = vec![
        login_item("a", "Bank", "alice", "https://bank.com"),
        login_item("b", "Mail", "alice", "https://mail.example.com"),
        login_item("c", "Forum", "bob", "https://forum.example.org"),
    ];
    let plan = planner(items.clone(), items).plan().unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.change_count(), 0);
}

#[test]
fn planning_never_writes_to_either_store() {
    let source = Arc::new(MemoryStore::new(vec![login_item(
        "s",
        "Bank",
        "alice",
        "https://bank.com",
    )]));
    let destination = Arc::new(MemoryStore::new(vec![login_item(
        "d",
        "Forum",
        "bob",
        "https://forum.example.org",
    )]));

    let planner = SyncPlanner::with_workers(
        Box::new(SharedStore(source.clone())),
        Box::new(SharedStore(destination.clone())),
        2,
    )
    .unwrap();
    let plan = planner.plan().unwrap();

    assert_eq!(plan.to_create.len(), 1);
    assert_eq!(plan.to_delete.len(), 1);
    assert_eq!(source.write_count(), 0);
    assert_eq!(destination.write_count(), 0);
}

#[test]
fn source_fetch_failure_aborts_planning() {
    let planner = SyncPlanner::with_workers(
        Box::new(UnreachableStore),
        Box::new(MemoryStore::new(vec![])),
        2,
    )
    .unwrap();

    let err = planner.plan().unwrap_err();
    assert!(err.to_string().contains("Source vault unavailable"));
}

#[test]
fn destination_fetch_failure_aborts_planning() {
    let planner = SyncPlanner::with_workers(
        Box::new(MemoryStore::new(vec![])),
        Box::new(UnreachableStore),
        2,
    )
    .unwrap();

    let err = planner.plan().unwrap_err();
    assert!(err.to_string().contains("Destination vault unavailable"));
}

#[test]
fn every_destination_item_lands_in_exactly_one_bucket() {
    // A mix of matched-unchanged, updated, deleted, and blank items
    let mut updated_src = login_item("s1", "Bank", "alice", "https://bank.com");
    updated_src.notes = Some("new notes".to_string());
    let updated_dst = login_item("d1", "Bank", "alice", "https://bank.com");

    let unchanged_src = login_item("s2", "Mail", "alice", "https://mail.example.com");
    let unchanged_dst = login_item("d2", "Mail", "alice", "https://mail.example.com");

    let stale_dst = login_item("d3", "Forum", "bob", "https://forum.example.org");
    let blank_dst = VaultItem {
        id: Some("d4".to_string()),
        notes: Some("orphan".to_string()),
        ..Default::default()
    };

    let plan = planner(
        vec![updated_src, unchanged_src],
        vec![updated_dst, unchanged_dst, stale_dst, blank_dst],
    )
    .plan()
    .unwrap();

    let update_ids: HashSet<&str> = plan
        .to_update
        .iter()
        .filter_map(|(_, d)| d.id.as_deref())
        .collect();
    let delete_ids: HashSet<&str> = plan.to_delete.iter().filter_map(|d| d.id.as_deref()).collect();

    assert_eq!(update_ids, HashSet::from(["d1"]));
    assert_eq!(delete_ids, HashSet::from(["d3", "d4"]));
    assert!(update_ids.is_disjoint(&delete_ids));
    // d2 is matched-unchanged: present in no bucket
    assert_eq!(plan.to_update.len() + plan.to_delete.len(), 3);
}

#[test]
fn duplicate_destination_fingerprints_all_land_in_a_bucket() {
    // Two destination items collapse onto one fingerprint; the displaced
    // one must still be classified, not silently vanish from the plan
    let dup_a = login_item("d1", "Bank", "alice", "https://bank.com");
    let dup_b = login_item("d2", "Bank", "alice", "https://bank.com");

    let plan = planner(vec![], vec![dup_a, dup_b]).plan().unwrap();

    let delete_ids: HashSet<&str> = plan.to_delete.iter().filter_map(|d| d.id.as_deref()).collect();
    assert_eq!(delete_ids, HashSet::from(["d1", "d2"]));
    assert!(plan.to_create.is_empty());
    assert!(plan.to_update.is_empty());
}

#[test]
fn source_items_get_sync_id_assigned_before_matching() {
    let src = login_item("s1", "Bank", "alice", "https://bank.com");
    let plan = planner(vec![src], vec![]).plan().unwrap();

    let created = &plan.to_create[0];
    let attached = identity::fingerprint(created).expect("sync_id attached");
    assert_eq!(attached, identity::compute_fingerprint(created));
}

#[test]
fn existing_sync_id_is_trusted_for_matching() {
    // Same stored identity on both sides but drifted content: still an
    // update pair, even though freshly computed fingerprints would differ.
    let mut src = login_item("s1", "Bank", "alice", "https://bank.com");
    let mut dst = login_item("d1", "Bank (renamed)", "alice", "https://bank.com");
    src.fields = Some(vec![CustomField::text("sync_id", "shared-identity")]);
    dst.fields = Some(vec![CustomField::text("sync_id", "shared-identity")]);

    let plan = planner(vec![src], vec![dst]).plan().unwrap();
    assert_eq!(plan.to_update.len(), 1);
    assert!(plan.to_create.is_empty());
    assert!(plan.to_delete.is_empty());
}
