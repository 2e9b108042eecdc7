//! Visibility filtering and token access against the in-memory store.

use std::sync::Arc;

use ovr_auth::{
    InvitationExpiry, SecureDataAccess, SharedAccessManager, SharingConfig, VisibilityOptions,
};
use ovr_core::{
    IncidentStatus, NewIncident, NewInvestigation, Principal, ResourceRef, Role, SharedPrincipal,
    UserPrincipal,
};
use ovr_db_memory::InMemoryStore;
use ovr_storage::{IncidentStorage, InvestigationStorage};

const REPORTER: i64 = 3;
const SUPERVISOR: i64 = 4;
const ANALYST: i64 = 2;

async fn seeded() -> (Arc<InMemoryStore>, Vec<i64>) {
    let store = Arc::new(InMemoryStore::new());
    let mut ids = Vec::new();
    for new in [
        NewIncident::draft(REPORTER).with_supervisor(SUPERVISOR),
        NewIncident::submitted(REPORTER).with_supervisor(SUPERVISOR),
        NewIncident::submitted(10).with_status(IncidentStatus::Closed),
        NewIncident::draft(ANALYST),
    ] {
        ids.push(store.create_incident(new).await.unwrap().id);
    }
    (store, ids)
}

fn user(id: i64, role: Role) -> Principal {
    UserPrincipal::new(id, [role]).into()
}

async fn visible_ids(
    access: &SecureDataAccess,
    principal: &Principal,
    options: VisibilityOptions,
) -> Vec<i64> {
    let mut ids: Vec<i64> = access
        .list_visible_incidents(principal, options)
        .await
        .unwrap()
        .into_iter()
        .map(|incident| incident.id)
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn listing_by_tier() {
    let (store, ids) = seeded().await;
    let access = SecureDataAccess::new(store);
    let &[draft, submitted, closed, analyst_draft] = ids.as_slice() else {
        panic!("expected four incidents");
    };

    let analyst = user(ANALYST, Role::QualityAnalyst);
    assert_eq!(
        visible_ids(&access, &analyst, VisibilityOptions::default()).await,
        vec![submitted, closed]
    );
    assert_eq!(
        visible_ids(&access, &analyst, VisibilityOptions::with_drafts()).await,
        vec![submitted, closed, analyst_draft]
    );

    let supervisor = user(SUPERVISOR, Role::Supervisor);
    assert_eq!(
        visible_ids(&access, &supervisor, VisibilityOptions::default()).await,
        vec![submitted]
    );

    let reporter = user(REPORTER, Role::Employee);
    assert_eq!(
        visible_ids(&access, &reporter, VisibilityOptions::default()).await,
        vec![submitted]
    );
    assert_eq!(
        visible_ids(&access, &reporter, VisibilityOptions::with_drafts()).await,
        vec![draft, submitted]
    );
}

#[tokio::test]
async fn invisible_incidents_are_not_found() {
    let (store, ids) = seeded().await;
    let access = SecureDataAccess::new(store);
    let draft = ids[0];

    let reporter = user(REPORTER, Role::Employee);
    assert_eq!(
        access.get_visible_incident(&reporter, draft).await.unwrap().id,
        draft
    );

    let admin = user(1, Role::Admin);
    let hidden = access.get_visible_incident(&admin, draft).await.unwrap_err();
    let missing = access.get_visible_incident(&admin, 999).await.unwrap_err();
    assert!(hidden.is_not_found());
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn token_holder_reaches_only_its_resource() {
    let (store, ids) = seeded().await;
    let investigation = store
        .create_investigation(NewInvestigation {
            incident_id: ids[1],
            created_by: ANALYST,
        })
        .await
        .unwrap();
    let other = store
        .create_investigation(NewInvestigation {
            incident_id: ids[2],
            created_by: ANALYST,
        })
        .await
        .unwrap();
    let manager = SharedAccessManager::new(store.clone(), SharingConfig::default());
    let analyst = UserPrincipal::new(ANALYST, [Role::QualityAnalyst]);

    let resource = ResourceRef::investigation(investigation.id);
    let invitation = manager
        .create_invitation(&analyst, resource, "ext@partner.org", InvitationExpiry::Default)
        .await
        .unwrap();
    manager
        .accept_invitation(&invitation.token, None)
        .await
        .unwrap();

    let holder = Principal::Shared(SharedPrincipal {
        resource,
        token: invitation.token.clone(),
    });
    let grant = manager.verify_access(&holder, resource).await.unwrap();
    assert_eq!(grant.acting_user, ANALYST);

    let err = manager
        .verify_access(&holder, ResourceRef::investigation(other.id))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // Token holders never see incident rows.
    let access = SecureDataAccess::new(store);
    assert!(
        access
            .list_visible_incidents(&holder, VisibilityOptions::default())
            .await
            .unwrap()
            .is_empty()
    );
}
