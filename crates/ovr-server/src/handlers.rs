use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use ovr_auth::{InvitationExpiry, VisibilityOptions};
use ovr_core::{
    IncidentId, InvestigationUpdate, InvitationRole, InvitationStatus, Principal, ResourceRef,
    SharedAccessInvitation, UserId, WorkflowAction,
};
use ovr_workflow::ActionRequest;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Caller, user_from_headers};
use crate::server::AppState;

// ============================================================================
// Extractors with uniform error bodies
// ============================================================================

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

// ============================================================================
// Health
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

// ============================================================================
// Incidents
// ============================================================================

pub async fn list_incidents(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(options): ApiQuery<VisibilityOptions>,
) -> ApiResult<impl IntoResponse> {
    let principal: Principal = caller.into_user("list incidents")?.into();
    let incidents = state
        .incidents
        .list_visible_incidents(&principal, options)
        .await?;
    Ok(Json(incidents))
}

pub async fn get_incident(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<IncidentId>,
) -> ApiResult<impl IntoResponse> {
    let principal: Principal = caller.into_user("read incidents")?.into();
    let incident = state.incidents.get_visible_incident(&principal, id).await?;
    Ok(Json(incident))
}

pub async fn perform_action(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<IncidentId>,
    ApiJson(request): ApiJson<ActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal: Principal = caller.into_user("perform workflow actions")?.into();
    let outcome = state
        .dispatcher
        .dispatch(&principal, id, &request.action, request.data.as_ref())
        .await?;
    Ok(Json(outcome))
}

#[derive(Serialize)]
pub struct AllowedActionsResponse {
    actions: Vec<WorkflowAction>,
}

pub async fn allowed_actions(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<IncidentId>,
) -> ApiResult<impl IntoResponse> {
    let principal: Principal = caller.into_user("perform workflow actions")?.into();
    let actions = state.dispatcher.allowed_actions(&principal, id).await?;
    Ok(Json(AllowedActionsResponse { actions }))
}

// ============================================================================
// Investigations
// ============================================================================

pub async fn get_investigation(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let principal = caller.for_resource(ResourceRef::investigation(id));
    Ok(Json(state.investigations.get(&principal, id).await?))
}

pub async fn update_investigation(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<InvestigationUpdate>,
) -> ApiResult<impl IntoResponse> {
    let principal = caller.for_resource(ResourceRef::investigation(id));
    Ok(Json(
        state.investigations.update(&principal, id, update).await?,
    ))
}

// ============================================================================
// Corrective actions
// ============================================================================

pub async fn get_corrective_action(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let principal = caller.for_resource(ResourceRef::corrective_action(id));
    Ok(Json(state.corrective_actions.get(&principal, id).await?))
}

pub async fn corrective_action_progress(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let principal = caller.for_resource(ResourceRef::corrective_action(id));
    Ok(Json(
        state
            .corrective_actions
            .checklist_progress(&principal, id)
            .await?,
    ))
}

pub async fn toggle_checklist_item(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath((id, item_id)): ApiPath<(i64, String)>,
) -> ApiResult<impl IntoResponse> {
    let principal = caller.for_resource(ResourceRef::corrective_action(id));
    Ok(Json(
        state
            .corrective_actions
            .toggle_checklist_item(&principal, id, &item_id)
            .await?,
    ))
}

pub async fn close_corrective_action(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let principal = caller.for_resource(ResourceRef::corrective_action(id));
    Ok(Json(state.corrective_actions.close(&principal, id).await?))
}

// ============================================================================
// Invitations
// ============================================================================

/// Invitation as listed to collaborators. The token is only returned once,
/// when the invitation is created.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationView {
    id: Uuid,
    #[serde(flatten)]
    resource: ResourceRef,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    role: InvitationRole,
    status: InvitationStatus,
    invited_by: UserId,
    #[serde(with = "time::serde::rfc3339::option")]
    expires_at: Option<OffsetDateTime>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    last_accessed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<SharedAccessInvitation> for InvitationView {
    fn from(invitation: SharedAccessInvitation) -> Self {
        Self {
            id: invitation.id,
            resource: invitation.resource,
            email: invitation.email,
            user_id: invitation.user_id,
            role: invitation.role,
            status: invitation.status,
            invited_by: invitation.invited_by,
            expires_at: invitation.expires_at,
            last_accessed_at: invitation.last_accessed_at,
            created_at: invitation.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    pub email: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub never_expires: bool,
}

impl CreateInvitationRequest {
    fn expiry(&self) -> InvitationExpiry {
        match (self.never_expires, self.expires_at) {
            (true, _) => InvitationExpiry::Never,
            (false, Some(at)) => InvitationExpiry::At(at),
            (false, None) => InvitationExpiry::Default,
        }
    }
}

async fn list_invitations(
    state: AppState,
    caller: Caller,
    resource: ResourceRef,
) -> ApiResult<Json<Vec<InvitationView>>> {
    let principal = caller.for_resource(resource);
    let invitations = state.sharing.list_invitations(&principal, resource).await?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

async fn create_invitation(
    state: AppState,
    caller: Caller,
    resource: ResourceRef,
    request: CreateInvitationRequest,
) -> ApiResult<(StatusCode, Json<SharedAccessInvitation>)> {
    let user = caller.into_user("invite collaborators")?;
    let invitation = state
        .sharing
        .create_invitation(&user, resource, &request.email, request.expiry())
        .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn list_investigation_invitations(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    list_invitations(state, caller, ResourceRef::investigation(id)).await
}

pub async fn create_investigation_invitation(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<CreateInvitationRequest>,
) -> ApiResult<impl IntoResponse> {
    create_invitation(state, caller, ResourceRef::investigation(id), request).await
}

pub async fn list_corrective_action_invitations(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    list_invitations(state, caller, ResourceRef::corrective_action(id)).await
}

pub async fn create_corrective_action_invitation(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<CreateInvitationRequest>,
) -> ApiResult<impl IntoResponse> {
    create_invitation(state, caller, ResourceRef::corrective_action(id), request).await
}

#[derive(Debug, Deserialize)]
pub struct AcceptInvitationRequest {
    pub token: String,
}

/// Accepts an invitation. A signed-in employee binds it to themselves.
pub async fn accept_invitation(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<AcceptInvitationRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user_from_headers(&headers)?;
    let invitation = state
        .sharing
        .accept_invitation(&request.token, user.as_ref())
        .await?;
    Ok(Json(InvitationView::from(invitation)))
}

pub async fn revoke_invitation(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = caller.into_user("revoke invitations")?;
    let invitation = state.sharing.revoke_invitation(&user, id).await?;
    Ok(Json(InvitationView::from(invitation)))
}
