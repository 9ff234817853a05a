//! Membership snapshot assembly.
//!
//! Builds the tenant/role/permission view that gets embedded into access
//! tokens. Always read fresh from storage at issuance — tokens carry a
//! snapshot, and this is where the snapshot comes from.

use gestor_auth::{PermissionCode, RoleGrant, TenantMembership};
use gestor_core::UserId;
use gestor_store::records::{MembershipRecord, ProfileRecord};
use gestor_store::{DataStore, FieldValue, Filter, Operation, StoreError};

/// Every tenant membership held by `subject_id`, with role grants resolved.
///
/// Runs unscoped on purpose: the snapshot must span all of the subject's
/// tenants. Soft-deleted and inactive profiles drop out of the grants.
pub async fn load_memberships<S: DataStore>(
    store: &S,
    subject_id: UserId,
) -> Result<Vec<TenantMembership>, StoreError> {
    let memberships = store
        .execute::<MembershipRecord>(Operation::FindMany {
            filter: Filter::all().with_equals("user_id", FieldValue::Int(subject_id.as_i64())),
        })
        .await?
        .into_many()?;

    let mut snapshot = Vec::with_capacity(memberships.len());
    for membership in memberships {
        let Some(tenant_id) = membership.tenant_id else {
            continue;
        };

        let mut roles = Vec::with_capacity(membership.profile_ids.len());
        for profile_id in membership.profile_ids {
            let profile = store
                .execute::<ProfileRecord>(Operation::FindUnique { key: profile_id })
                .await?
                .into_one()?;
            let Some(profile) = profile else {
                // Deleted since the membership was granted.
                continue;
            };
            if !profile.active {
                continue;
            }
            roles.push(RoleGrant::new(
                profile.code,
                profile
                    .permission_codes
                    .into_iter()
                    .map(PermissionCode::new)
                    .collect(),
            ));
        }

        snapshot.push(TenantMembership::new(tenant_id, roles));
    }

    Ok(snapshot)
}
