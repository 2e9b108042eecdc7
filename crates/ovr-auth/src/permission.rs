//! Workflow action permissions.
//!
//! An action is permitted when two checks pass, in order:
//! 1. the incident is in one of the statuses the action accepts,
//! 2. the principal holds a qualifying role or relationship.
//!
//! Both failures are reported as [`WorkflowError::Authorization`] with
//! distinct messages.

use ovr_core::{
    Incident, IncidentStatus, InvestigatorAssignment, Principal, Role, UserPrincipal,
    WorkflowAction, WorkflowError, WorkflowResult,
};

/// Statuses from which an action may be performed.
///
/// `supervisor-approve` has been retired from the live workflow and accepts
/// no status.
#[must_use]
pub fn allowed_statuses(action: WorkflowAction) -> &'static [IncidentStatus] {
    match action {
        WorkflowAction::SupervisorApprove => &[],
        WorkflowAction::QiAssignHod
        | WorkflowAction::AssignInvestigator
        | WorkflowAction::SubmitFindings
        | WorkflowAction::HodSubmit => &[IncidentStatus::HodAssigned],
        WorkflowAction::QiClose => &[IncidentStatus::QiFinalReview],
    }
}

/// Checks the status precondition of an action.
pub fn check_status(action: WorkflowAction, incident: &Incident) -> WorkflowResult<()> {
    let allowed = allowed_statuses(action);
    if allowed.is_empty() {
        return Err(WorkflowError::authorization(format!(
            "{action} is disabled and cannot be performed in any status"
        )));
    }
    if allowed.contains(&incident.status) {
        return Ok(());
    }

    let names: Vec<&str> = allowed.iter().map(IncidentStatus::as_str).collect();
    Err(WorkflowError::authorization(format!(
        "Incident must be in {} status",
        names.join(" or ")
    )))
}

/// Checks the role or relationship precondition of an action.
///
/// `assignments` must hold the incident's investigator assignments when the
/// action needs them (see [`WorkflowAction::needs_assignments`]).
pub fn check_role(
    action: WorkflowAction,
    user: &UserPrincipal,
    incident: &Incident,
    assignments: &[InvestigatorAssignment],
) -> WorkflowResult<()> {
    let (allowed, message) = match action {
        WorkflowAction::SupervisorApprove => (
            user.is_supervisory() || user.is_override(),
            "Only supervisors can approve incidents",
        ),
        WorkflowAction::QiAssignHod => (
            user.is_quality() || user.is_override(),
            "Only QI staff can assign a department head",
        ),
        WorkflowAction::AssignInvestigator => (
            user.has_role(Role::DepartmentHead) || user.is_quality() || user.is_override(),
            "Only department heads or QI staff can assign investigators",
        ),
        WorkflowAction::SubmitFindings => (
            assignments
                .iter()
                .any(|assignment| assignment.investigator_id == user.id),
            "Only assigned investigators can submit findings",
        ),
        WorkflowAction::HodSubmit => (
            incident.is_department_head(user.id) || user.is_override(),
            "Only the assigned department head can submit the investigation",
        ),
        WorkflowAction::QiClose => (
            user.is_quality() || user.is_override(),
            "Only QI staff can close incidents",
        ),
    };

    if allowed {
        Ok(())
    } else {
        Err(WorkflowError::authorization(message))
    }
}

/// Validates that a principal may perform an action on an incident.
///
/// Shared-access principals never take part in the workflow.
pub fn validate_action(
    principal: &Principal,
    action: WorkflowAction,
    incident: &Incident,
    assignments: &[InvestigatorAssignment],
) -> WorkflowResult<()> {
    check_status(action, incident)?;

    let Some(user) = principal.as_user() else {
        return Err(WorkflowError::authorization(
            "Shared-access collaborators cannot perform workflow actions",
        ));
    };

    check_role(action, user, incident, assignments).inspect_err(|_| {
        tracing::debug!(
            user_id = user.id,
            incident_id = incident.id,
            action = %action,
            "Role check failed"
        );
    })
}

/// Non-failing variant of [`validate_action`].
#[must_use]
pub fn can_perform_action(
    principal: &Principal,
    action: WorkflowAction,
    incident: &Incident,
    assignments: &[InvestigatorAssignment],
) -> bool {
    validate_action(principal, action, incident, assignments).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovr_core::{NewIncident, NewInvestigatorAssignment, ResourceRef, SharedPrincipal};
    use time::macros::datetime;

    fn incident(status: IncidentStatus) -> Incident {
        NewIncident::submitted(3)
            .with_status(status)
            .with_department_head(7)
            .into_incident(1, datetime!(2026-01-01 00:00 UTC))
    }

    fn assignment(investigator: i64) -> InvestigatorAssignment {
        NewInvestigatorAssignment {
            incident_id: 1,
            investigator_id: investigator,
            assigned_by: 7,
            assigned_at: datetime!(2026-01-02 00:00 UTC),
        }
        .into_assignment(1)
    }

    fn principal_for(action: WorkflowAction) -> Principal {
        let user = match action {
            WorkflowAction::SupervisorApprove => UserPrincipal::new(4, [Role::Supervisor]),
            WorkflowAction::QiAssignHod | WorkflowAction::QiClose => {
                UserPrincipal::new(2, [Role::QualityManager])
            }
            WorkflowAction::AssignInvestigator => UserPrincipal::new(7, [Role::DepartmentHead]),
            WorkflowAction::SubmitFindings => UserPrincipal::new(12, [Role::Employee]),
            WorkflowAction::HodSubmit => UserPrincipal::new(7, [Role::DepartmentHead]),
        };
        user.into()
    }

    #[test]
    fn status_gating_is_exhaustive() {
        let assignments = vec![assignment(12)];
        for action in WorkflowAction::ALL {
            let principal = principal_for(action);
            for status in IncidentStatus::ALL {
                let expected = allowed_statuses(action).contains(&status);
                let result = validate_action(&principal, action, &incident(status), &assignments);
                assert_eq!(
                    result.is_ok(),
                    expected,
                    "{action} at {status}: {result:?}"
                );
                if let Err(err) = result {
                    assert!(err.is_authorization());
                }
            }
        }
    }

    #[test]
    fn supervisor_approve_is_always_rejected() {
        let admin: Principal = UserPrincipal::new(1, [Role::Admin, Role::Supervisor]).into();
        for status in IncidentStatus::ALL {
            let err = validate_action(
                &admin,
                WorkflowAction::SupervisorApprove,
                &incident(status),
                &[],
            )
            .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Not authorized: supervisor-approve is disabled and cannot be performed in any status"
            );
        }
    }

    #[test]
    fn wrong_status_names_required_status() {
        let qi = principal_for(WorkflowAction::QiClose);
        let err = validate_action(
            &qi,
            WorkflowAction::QiClose,
            &incident(IncidentStatus::HodAssigned),
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not authorized: Incident must be in qi_final_review status"
        );
    }

    #[test]
    fn status_is_checked_before_role() {
        let nobody: Principal = UserPrincipal::new(99, [Role::Employee]).into();
        let err = validate_action(
            &nobody,
            WorkflowAction::QiClose,
            &incident(IncidentStatus::Draft),
            &[],
        )
        .unwrap_err();
        assert!(err.to_string().contains("qi_final_review"));

        let err = validate_action(
            &nobody,
            WorkflowAction::QiClose,
            &incident(IncidentStatus::QiFinalReview),
            &[],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Only QI staff"));
    }

    #[test]
    fn role_predicates() {
        let hod = incident(IncidentStatus::HodAssigned);
        let assignments = vec![assignment(12)];

        let analyst: Principal = UserPrincipal::new(2, [Role::QualityAnalyst]).into();
        let developer: Principal = UserPrincipal::new(3, [Role::Developer]).into();
        let executive: Principal = UserPrincipal::new(5, [Role::Executive]).into();
        let other_hod: Principal = UserPrincipal::new(8, [Role::DepartmentHead]).into();
        let investigator: Principal = UserPrincipal::new(12, []).into();

        assert!(can_perform_action(&analyst, WorkflowAction::QiAssignHod, &hod, &[]));
        assert!(can_perform_action(&developer, WorkflowAction::QiAssignHod, &hod, &[]));
        assert!(!can_perform_action(&executive, WorkflowAction::QiAssignHod, &hod, &[]));

        assert!(can_perform_action(&other_hod, WorkflowAction::AssignInvestigator, &hod, &[]));
        assert!(!can_perform_action(&executive, WorkflowAction::AssignInvestigator, &hod, &[]));

        assert!(can_perform_action(
            &investigator,
            WorkflowAction::SubmitFindings,
            &hod,
            &assignments
        ));
        assert!(!can_perform_action(
            &analyst,
            WorkflowAction::SubmitFindings,
            &hod,
            &assignments
        ));

        // Department head role alone is not enough: must be the one of record.
        assert!(!can_perform_action(&other_hod, WorkflowAction::HodSubmit, &hod, &[]));
        assert!(can_perform_action(&developer, WorkflowAction::HodSubmit, &hod, &[]));
    }

    #[test]
    fn shared_principals_cannot_dispatch() {
        let shared = Principal::Shared(SharedPrincipal {
            resource: ResourceRef::investigation(1),
            token: "a".repeat(64),
        });
        let err = validate_action(
            &shared,
            WorkflowAction::HodSubmit,
            &incident(IncidentStatus::HodAssigned),
            &[],
        )
        .unwrap_err();
        assert!(err.is_authorization());
    }
}
