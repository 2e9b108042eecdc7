//! End-to-end workflow scenarios against the in-memory store.

use std::sync::Arc;

use ovr_core::{
    AssignmentStatus, IncidentId, IncidentStatus, NewIncident, Principal, ResourceRef, Role,
    SharedPrincipal, UserPrincipal,
};
use ovr_db_memory::InMemoryStore;
use ovr_storage::{AssignmentStorage, IncidentStorage};
use ovr_workflow::{ActionOutcome, Dispatcher};
use serde_json::{Value, json};

const REPORTER: i64 = 3;
const HOD: i64 = 7;
const INVESTIGATOR: i64 = 12;
const QI: i64 = 2;

struct Fixture {
    store: Arc<InMemoryStore>,
    dispatcher: Dispatcher,
    incident_id: IncidentId,
}

impl Fixture {
    async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let incident = store
            .create_incident(NewIncident::submitted(REPORTER))
            .await
            .unwrap();
        let dispatcher = Dispatcher::standard(store.clone()).unwrap();
        Self {
            store,
            dispatcher,
            incident_id: incident.id,
        }
    }

    async fn run(
        &self,
        principal: &Principal,
        action: &str,
        data: Value,
    ) -> ovr_core::WorkflowResult<ActionOutcome> {
        self.dispatcher
            .dispatch(principal, self.incident_id, action, Some(&data))
            .await
    }

    async fn status(&self) -> IncidentStatus {
        self.store
            .get_incident(self.incident_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}

fn user(id: i64, role: Role) -> Principal {
    UserPrincipal::new(id, [role]).into()
}

fn close_payload() -> Value {
    json!({"feedback": "Thorough review", "severityLevel": "medium", "formComplete": true})
}

fn hod_payload() -> Value {
    json!({
        "investigationFindings": "Bed rail latch worn",
        "problemsIdentified": "No preventive maintenance",
        "causeClassification": "equipment",
        "preventionRecommendation": "Quarterly rail inspection"
    })
}

#[tokio::test]
async fn happy_path_reaches_closed() {
    let fx = Fixture::new().await;
    let qi = user(QI, Role::QualityAnalyst);
    let hod = user(HOD, Role::DepartmentHead);
    let investigator = user(INVESTIGATOR, Role::Employee);

    let outcome = fx
        .run(&qi, "qi-assign-hod", json!({"departmentHeadId": HOD}))
        .await
        .unwrap();
    let ActionOutcome::Incident(incident) = outcome else {
        panic!("expected incident");
    };
    assert_eq!(incident.department_head_id, Some(HOD));
    assert_eq!(incident.qi_received_by, Some(QI));

    let outcome = fx
        .run(&hod, "assign-investigator", json!({"investigatorId": INVESTIGATOR}))
        .await
        .unwrap();
    let ActionOutcome::Assignment(assignment) = outcome else {
        panic!("expected assignment");
    };
    assert_eq!(assignment.status, AssignmentStatus::Pending);

    fx.run(&investigator, "submit-findings", json!({"findings": "Latch spring broken"}))
        .await
        .unwrap();
    let assignments = fx.store.list_assignments(fx.incident_id).await.unwrap();
    assert!(assignments[0].is_submitted());

    fx.run(&hod, "hod-submit", hod_payload()).await.unwrap();
    assert_eq!(fx.status().await, IncidentStatus::QiFinalReview);

    let outcome = fx.run(&qi, "qi-close", close_payload()).await.unwrap();
    let ActionOutcome::Incident(closed) = outcome else {
        panic!("expected incident");
    };
    assert_eq!(closed.status, IncidentStatus::Closed);
    assert!(closed.closed_at.is_some());
    assert_eq!(fx.status().await, IncidentStatus::Closed);
}

#[tokio::test]
async fn closed_incidents_accept_no_actions() {
    let fx = Fixture::new().await;
    let qi = user(QI, Role::QualityManager);
    fx.run(&qi, "qi-assign-hod", json!({"departmentHeadId": HOD}))
        .await
        .unwrap();
    fx.run(&user(HOD, Role::DepartmentHead), "hod-submit", hod_payload())
        .await
        .unwrap();
    fx.run(&qi, "qi-close", close_payload()).await.unwrap();

    let admin = user(1, Role::Admin);
    assert!(
        fx.dispatcher
            .allowed_actions(&admin, fx.incident_id)
            .await
            .unwrap()
            .is_empty()
    );
    let err = fx
        .run(&qi, "qi-assign-hod", json!({"departmentHeadId": 9}))
        .await
        .unwrap_err();
    assert!(err.is_authorization());
}

#[tokio::test]
async fn duplicate_assignment_fails_validation() {
    let fx = Fixture::new().await;
    let qi = user(QI, Role::QualityAnalyst);
    let data = json!({"investigatorId": INVESTIGATOR});

    fx.run(&qi, "assign-investigator", data.clone()).await.unwrap();
    let err = fx.run(&qi, "assign-investigator", data).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.path(), Some("data.investigatorId"));
    assert_eq!(
        fx.store.list_assignments(fx.incident_id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn only_assigned_investigators_submit_findings() {
    let fx = Fixture::new().await;
    let err = fx
        .run(
            &user(INVESTIGATOR, Role::Employee),
            "submit-findings",
            json!({"findings": "x"}),
        )
        .await
        .unwrap_err();
    assert!(err.is_authorization());
}

#[tokio::test]
async fn supervisor_approve_is_always_rejected() {
    let fx = Fixture::new().await;
    for role in Role::ALL {
        let err = fx
            .run(&user(4, role), "supervisor-approve", json!({}))
            .await
            .unwrap_err();
        assert!(err.is_authorization(), "{role} was not rejected");
    }
}

#[tokio::test]
async fn payload_errors_carry_paths() {
    let fx = Fixture::new().await;
    let qi = user(QI, Role::QualityAnalyst);

    let err = fx
        .run(&qi, "qi-assign-hod", json!({"departmentHeadId": -4}))
        .await
        .unwrap_err();
    assert_eq!(err.path(), Some("data.departmentHeadId"));

    let err = fx
        .run(&qi, "hod-submit", json!({"investigationFindings": ""}))
        .await
        .unwrap_err();
    assert_eq!(err.path(), Some("data.investigationFindings"));

    let err = fx.run(&qi, "escalate", json!({})).await.unwrap_err();
    assert_eq!(err.path(), Some("action"));
}

#[tokio::test]
async fn wrong_role_is_authorization() {
    let fx = Fixture::new().await;
    let err = fx
        .run(
            &user(REPORTER, Role::Employee),
            "qi-assign-hod",
            json!({"departmentHeadId": HOD}),
        )
        .await
        .unwrap_err();
    assert!(err.is_authorization());
    assert!(err.to_string().contains("QI staff"));
}

#[tokio::test]
async fn token_principals_cannot_dispatch() {
    let fx = Fixture::new().await;
    let shared = Principal::Shared(SharedPrincipal {
        resource: ResourceRef::investigation(1),
        token: "deadbeef".to_string(),
    });
    let err = fx
        .run(&shared, "qi-assign-hod", json!({"departmentHeadId": HOD}))
        .await
        .unwrap_err();
    assert!(err.is_authorization());
    assert_eq!(fx.status().await, IncidentStatus::HodAssigned);
}

#[tokio::test]
async fn missing_incident_is_not_found() {
    let fx = Fixture::new().await;
    let err = fx
        .dispatcher
        .dispatch(
            &user(QI, Role::QualityAnalyst),
            fx.incident_id + 100,
            "qi-close",
            Some(&close_payload()),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
