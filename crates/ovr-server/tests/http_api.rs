use std::sync::Arc;

use ovr_db_memory::InMemoryStore;
use ovr_server::bootstrap::{DemoData, seed_demo_data};
use ovr_server::{AppConfig, AppState, build_app};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

struct TestServer {
    base: String,
    client: reqwest::Client,
    seeded: DemoData,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let cfg = AppConfig::default();
        let store = Arc::new(InMemoryStore::new());
        let seeded = seed_demo_data(store.as_ref()).await.expect("seed");
        let state = AppState::new(store, &cfg).expect("state");
        let app = build_app(&cfg, state);

        // Bind to an ephemeral port
        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            seeded,
            shutdown: tx,
            handle,
        }
    }

    fn as_user(
        &self,
        builder: reqwest::RequestBuilder,
        id: i64,
        roles: &str,
    ) -> reqwest::RequestBuilder {
        builder
            .header("x-user-id", id.to_string())
            .header("x-user-roles", roles)
    }

    async fn action(&self, incident: i64, user: i64, roles: &str, body: Value) -> (u16, Value) {
        let resp = self
            .as_user(
                self.client
                    .post(format!("{}/incidents/{incident}/actions", self.base)),
                user,
                roles,
            )
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

const QI: (i64, &str) = (2, "quality_analyst");
const HOD: (i64, &str) = (7, "department_head");
const REPORTER: (i64, &str) = (3, "employee");

#[tokio::test]
async fn health_and_missing_identity() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = server
        .client
        .get(format!("{}/incidents", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    server.stop().await;
}

#[tokio::test]
async fn workflow_over_http() {
    let server = TestServer::start().await;
    let incident = server.seeded.open_incident;

    // Allowed actions for QI at hod_assigned
    let resp = server
        .as_user(
            server
                .client
                .get(format!("{}/incidents/{incident}/actions", server.base)),
            QI.0,
            QI.1,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    let actions: Vec<&str> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(actions, vec!["qi-assign-hod", "assign-investigator"]);

    // Payload error carries the field path
    let (status, body) = server
        .action(incident, QI.0, QI.1, json!({"action": "qi-assign-hod", "data": {}}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "validation");
    assert_eq!(body["path"], "data.departmentHeadId");

    // Wrong status
    let (status, body) = server
        .action(
            incident,
            QI.0,
            QI.1,
            json!({"action": "qi-close", "data": {"feedback": "x", "severityLevel": "low"}}),
        )
        .await;
    assert_eq!(status, 403);
    assert!(body["message"].as_str().unwrap().contains("qi_final_review"));

    let (status, _) = server
        .action(
            incident,
            QI.0,
            QI.1,
            json!({"action": "qi-assign-hod", "data": {"departmentHeadId": HOD.0}}),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = server
        .action(
            incident,
            HOD.0,
            HOD.1,
            json!({"action": "assign-investigator", "data": {"investigatorId": 12}}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["investigatorId"], 12);
    assert_eq!(body["status"], "pending");

    let (status, body) = server
        .action(
            incident,
            HOD.0,
            HOD.1,
            json!({"action": "assign-investigator", "data": {"investigatorId": 12}}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["path"], "data.investigatorId");

    let (status, body) = server
        .action(
            incident,
            12,
            "employee",
            json!({"action": "submit-findings", "data": {"findings": "Latch spring broken"}}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "submitted");

    let (status, body) = server
        .action(
            incident,
            HOD.0,
            HOD.1,
            json!({"action": "hod-submit", "data": {
                "investigationFindings": "Worn latch",
                "problemsIdentified": "No maintenance schedule",
                "causeClassification": "equipment",
                "preventionRecommendation": "Quarterly inspection"
            }}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "qi_final_review");

    let (status, body) = server
        .action(
            incident,
            QI.0,
            QI.1,
            json!({"action": "qi-close", "data": {"feedback": "Good", "severityLevel": "high"}}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "closed");
    assert_eq!(body["severityLevel"], "high");

    server.stop().await;
}

#[tokio::test]
async fn unknown_incident_and_bad_bodies() {
    let server = TestServer::start().await;

    let (status, body) = server
        .action(
            999,
            QI.0,
            QI.1,
            json!({"action": "qi-assign-hod", "data": {"departmentHeadId": 7}}),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not_found");

    let (status, body) = server
        .action(1, QI.0, QI.1, json!({"action": "reopen"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["path"], "action");

    let resp = server
        .as_user(
            server.client.post(format!("{}/incidents/1/actions", server.base)),
            QI.0,
            QI.1,
        )
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["path"], "body");

    server.stop().await;
}

#[tokio::test]
async fn incident_listing_respects_visibility() {
    let server = TestServer::start().await;
    let list = |user: (i64, &'static str), query: &'static str| {
        let request = server
            .client
            .get(format!("{}/incidents{query}", server.base));
        let request = server.as_user(request, user.0, user.1);
        async move {
            let resp = request.send().await.unwrap();
            assert!(resp.status().is_success());
            let body: Value = resp.json().await.unwrap();
            body.as_array().unwrap().len()
        }
    };

    assert_eq!(list(REPORTER, "").await, 2);
    assert_eq!(list(REPORTER, "?includeDrafts=true").await, 3);
    assert_eq!(list(QI, "").await, 2);
    assert_eq!(list(QI, "?myReportsOnly=true").await, 0);
    assert_eq!(list((40, "employee"), "").await, 0);

    // Another user's draft reads as not found
    let draft = server.seeded.draft_incident;
    let resp = server
        .as_user(
            server
                .client
                .get(format!("{}/incidents/{draft}", server.base)),
            QI.0,
            QI.1,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    server.stop().await;
}

#[tokio::test]
async fn shared_token_collaboration() {
    let server = TestServer::start().await;
    let investigation = server.seeded.investigation;
    let invitations_url = format!("{}/investigations/{investigation}/invitations", server.base);

    let resp = server
        .as_user(server.client.post(&invitations_url), QI.0, QI.1)
        .json(&json!({"email": "consultant@partner.org"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let invitation: Value = resp.json().await.unwrap();
    let token = invitation["token"].as_str().unwrap().to_string();
    assert_eq!(invitation["status"], "pending");
    assert_eq!(invitation["role"], "investigator");

    let investigation_url = format!("{}/investigations/{investigation}", server.base);

    // Pending tokens open nothing, and look the same as a missing record
    let resp = server
        .client
        .get(&investigation_url)
        .query(&[("token", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let resp = server
        .client
        .get(format!("{}/investigations/9999", server.base))
        .query(&[("token", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = server
        .client
        .post(format!("{}/invitations/accept", server.base))
        .json(&json!({"token": token}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let accepted: Value = resp.json().await.unwrap();
    assert_eq!(accepted["status"], "accepted");
    assert!(accepted.get("token").is_none());

    let resp = server
        .client
        .patch(&investigation_url)
        .query(&[("token", token.as_str())])
        .json(&json!({"findings": "Interviewed night staff"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["findings"], "Interviewed night staff");

    // The token opens nothing else
    let resp = server
        .client
        .get(format!("{}/corrective-actions/{}", server.base, server.seeded.corrective_action))
        .query(&[("token", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Listing hides tokens
    let resp = server
        .as_user(server.client.get(&invitations_url), QI.0, QI.1)
        .send()
        .await
        .unwrap();
    let listed: Value = resp.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(listed[0].get("token").is_none());

    // Revocation shuts the token out
    let id = invitation["id"].as_str().unwrap();
    let resp = server
        .as_user(
            server.client.delete(format!("{}/invitations/{id}", server.base)),
            QI.0,
            QI.1,
        )
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let resp = server
        .client
        .get(&investigation_url)
        .query(&[("token", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    server.stop().await;
}

#[tokio::test]
async fn corrective_action_checklist_and_close() {
    let server = TestServer::start().await;
    let id = server.seeded.corrective_action;
    let base = format!("{}/corrective-actions/{id}", server.base);

    let resp = server
        .as_user(server.client.post(format!("{base}/close")), HOD.0, HOD.1)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["path"], "checklist");

    for item in ["order-parts", "install", "train"] {
        let resp = server
            .as_user(
                server
                    .client
                    .post(format!("{base}/checklist/{item}/toggle")),
                HOD.0,
                HOD.1,
            )
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success(), "toggle {item}");
    }

    let resp = server
        .as_user(server.client.get(format!("{base}/progress")), HOD.0, HOD.1)
        .send()
        .await
        .unwrap();
    let progress: Value = resp.json().await.unwrap();
    assert_eq!(progress, json!({"completed": 3, "total": 3}));

    let resp = server
        .as_user(server.client.post(format!("{base}/close")), HOD.0, HOD.1)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let closed: Value = resp.json().await.unwrap();
    assert_eq!(closed["status"], "closed");
    assert_eq!(closed["closedBy"], HOD.0);

    // Strangers cannot tell it exists
    let resp = server
        .as_user(server.client.get(&base), 40, "employee")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    server.stop().await;
}
