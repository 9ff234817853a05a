//! Behavioral tests for the scoping decorator: what actually reaches the
//! backend, and what the stored rows look like afterwards.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use gestor_context::{RequestContext, RequestScope};
use gestor_core::{RequestId, TenantId, UserId};
use gestor_store::records::{MembershipRecord, ProfileRecord, ProfileUpdate, UserRecord};
use gestor_store::{
    DataStore, DeletedAtClause, Entity, Filter, MemoryStore, Operation, Outcome, Patch,
    ScopedStore, StoreError,
};

/// Flat description of one operation as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
struct SeenOp {
    entity: &'static str,
    op: &'static str,
    key_filter: bool,
    tenant_filter: Option<TenantId>,
    deleted_at: DeletedAtClause,
    soft_delete_patch: bool,
}

fn describe<E: Entity>(op: &Operation<E>) -> SeenOp {
    fn from_filter<E: Entity>(
        entity_op: (&'static str, &'static str),
        filter: &Filter<E>,
        soft_delete_patch: bool,
    ) -> SeenOp {
        SeenOp {
            entity: entity_op.0,
            op: entity_op.1,
            key_filter: filter.key.is_some(),
            tenant_filter: filter.tenant_id,
            deleted_at: filter.deleted_at,
            soft_delete_patch,
        }
    }

    match op {
        Operation::FindUnique { .. } => SeenOp {
            entity: E::KIND,
            op: op.kind(),
            key_filter: true,
            tenant_filter: None,
            deleted_at: DeletedAtClause::Unspecified,
            soft_delete_patch: false,
        },
        Operation::Create { .. } => SeenOp {
            entity: E::KIND,
            op: op.kind(),
            key_filter: false,
            tenant_filter: None,
            deleted_at: DeletedAtClause::Unspecified,
            soft_delete_patch: false,
        },
        Operation::FindFirst { filter }
        | Operation::FindMany { filter }
        | Operation::Count { filter }
        | Operation::Delete { filter }
        | Operation::DeleteMany { filter } => from_filter((E::KIND, op.kind()), filter, false),
        Operation::Update { filter, patch } | Operation::UpdateMany { filter, patch } => {
            from_filter(
                (E::KIND, op.kind()),
                filter,
                matches!(patch, Patch::SoftDelete { .. }),
            )
        }
    }
}

/// Backend that logs every operation it receives, then executes it in memory.
#[derive(Debug, Default)]
struct RecordingStore {
    memory: MemoryStore,
    seen: Mutex<Vec<SeenOp>>,
}

impl RecordingStore {
    fn seen(&self) -> Vec<SeenOp> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataStore for RecordingStore {
    async fn execute<E: Entity>(&self, op: Operation<E>) -> Result<Outcome<E>, StoreError> {
        self.seen.lock().unwrap().push(describe(&op));
        self.memory.execute(op).await
    }
}

fn scoped() -> ScopedStore<RecordingStore> {
    ScopedStore::new(RecordingStore::default())
}

fn profile(tenant: TenantId, code: &str) -> ProfileRecord {
    ProfileRecord::new(Uuid::new_v4(), tenant, code, code.to_uppercase(), vec![])
}

fn in_tenant(tenant: TenantId) -> RequestContext {
    RequestContext::anonymous(RequestId::generate()).with_tenant(tenant)
}

#[tokio::test]
async fn delete_by_id_without_tenant_context_is_one_update_with_no_tenant_filter() {
    let store = scoped();
    let row = profile(TenantId::new(), "admin");
    let id = row.id;
    store.inner().memory.seed([row]);

    // No scope established at all: system/background code path.
    let outcome = store
        .execute::<ProfileRecord>(Operation::Delete {
            filter: Filter::by_key(id),
        })
        .await
        .unwrap();
    assert!(outcome.into_one().unwrap().is_some());

    let seen = store.inner().seen();
    assert_eq!(
        seen,
        vec![SeenOp {
            entity: "profile",
            op: "update",
            key_filter: true,
            tenant_filter: None,
            deleted_at: DeletedAtClause::Unspecified,
            soft_delete_patch: true,
        }]
    );

    // The row is still there, just dead.
    let rows = store.inner().memory.rows::<ProfileRecord>();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].deleted_at.is_some());
    assert!(!rows[0].active);
}

#[tokio::test]
async fn reads_are_confined_to_the_active_tenant() {
    let store = scoped();
    let (t1, t2) = (TenantId::new(), TenantId::new());
    store
        .inner()
        .memory
        .seed([profile(t1, "admin"), profile(t1, "viewer"), profile(t2, "admin")]);

    let mine = RequestScope::run(in_tenant(t1), async {
        store
            .execute::<ProfileRecord>(Operation::FindMany {
                filter: Filter::all(),
            })
            .await
            .unwrap()
            .into_many()
            .unwrap()
    })
    .await;

    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|p| p.tenant_id == Some(t1)));
}

#[tokio::test]
async fn writes_cannot_touch_another_tenants_rows() {
    let store = scoped();
    let (t1, t2) = (TenantId::new(), TenantId::new());
    store
        .inner()
        .memory
        .seed([profile(t1, "admin"), profile(t2, "admin")]);

    let affected = RequestScope::run(in_tenant(t1), async {
        store
            .execute::<ProfileRecord>(Operation::UpdateMany {
                filter: Filter::all(),
                patch: Patch::Fields(ProfileUpdate {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                }),
            })
            .await
            .unwrap()
            .into_count()
            .unwrap()
    })
    .await;

    assert_eq!(affected, 1);
    let untouched = store
        .inner()
        .memory
        .rows::<ProfileRecord>()
        .into_iter()
        .find(|p| p.tenant_id == Some(t2))
        .unwrap();
    assert_eq!(untouched.name, "ADMIN");
}

#[tokio::test]
async fn find_unique_is_downgraded_to_a_tenant_filtered_first_match() {
    let store = scoped();
    let (t1, t2) = (TenantId::new(), TenantId::new());
    let foreign = profile(t2, "admin");
    let foreign_id = foreign.id;
    store.inner().memory.seed([profile(t1, "admin"), foreign]);

    let found = RequestScope::run(in_tenant(t1), async {
        store
            .execute::<ProfileRecord>(Operation::FindUnique { key: foreign_id })
            .await
            .unwrap()
            .into_one()
            .unwrap()
    })
    .await;

    // The row exists, but not in this tenant.
    assert!(found.is_none());
    let seen = store.inner().seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].op, "find_first");
    assert!(seen[0].key_filter);
    assert_eq!(seen[0].tenant_filter, Some(t1));
    assert_eq!(seen[0].deleted_at, DeletedAtClause::IsNull);
}

#[tokio::test]
async fn create_injects_the_active_tenant_over_whatever_the_caller_set() {
    let store = scoped();
    let (t1, t2) = (TenantId::new(), TenantId::new());

    let created = RequestScope::run(in_tenant(t1), async {
        store
            .execute(Operation::Create {
                row: profile(t2, "smuggled"),
            })
            .await
            .unwrap()
            .into_created()
            .unwrap()
    })
    .await;

    assert_eq!(created.tenant_id, Some(t1));
    assert_eq!(
        store.inner().memory.rows::<ProfileRecord>()[0].tenant_id,
        Some(t1)
    );
}

#[tokio::test]
async fn soft_deleted_rows_are_invisible_by_default_but_reachable_explicitly() {
    let store = scoped();
    let mut dead = UserRecord::new(UserId::new(1), "old@x.com", "Old", "h");
    dead.mark_deleted(Utc::now());
    let live = UserRecord::new(UserId::new(2), "new@x.com", "New", "h");
    store.inner().memory.seed([dead, live]);

    let visible = store
        .execute::<UserRecord>(Operation::FindMany {
            filter: Filter::all(),
        })
        .await
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].email, "new@x.com");

    // Explicit clause wins over the default.
    let trashed = store
        .execute::<UserRecord>(Operation::FindMany {
            filter: Filter::all().with_deleted(DeletedAtClause::IsNotNull),
        })
        .await
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(trashed.len(), 1);
    assert_eq!(trashed[0].email, "old@x.com");
}

#[tokio::test]
async fn unscoped_access_passes_through_across_tenants() {
    let store = scoped();
    let (t1, t2) = (TenantId::new(), TenantId::new());
    store
        .inner()
        .memory
        .seed([profile(t1, "admin"), profile(t2, "admin")]);

    // Background-job path: no request scope at all.
    let all = store
        .execute::<ProfileRecord>(Operation::FindMany {
            filter: Filter::all(),
        })
        .await
        .unwrap()
        .into_many()
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn hard_delete_survives_for_entities_without_soft_delete() {
    let store = scoped();
    let t1 = TenantId::new();
    let membership = MembershipRecord::new(Uuid::new_v4(), UserId::new(1), t1, vec![]);
    let id = membership.id;
    store.inner().memory.seed([membership]);

    RequestScope::run(in_tenant(t1), async {
        store
            .execute::<MembershipRecord>(Operation::Delete {
                filter: Filter::by_key(id),
            })
            .await
            .unwrap()
    })
    .await;

    // Memberships are hard-unlinked, and the delete carried the tenant filter.
    assert!(store.inner().memory.rows::<MembershipRecord>().is_empty());
    let seen = store.inner().seen();
    assert_eq!(seen[0].op, "delete");
    assert_eq!(seen[0].tenant_filter, Some(t1));
}
