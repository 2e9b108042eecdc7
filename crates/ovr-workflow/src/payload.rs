//! Action payload schemas.
//!
//! Each action accepts a JSON object under `data`. Parsing checks the shape
//! field by field and reports the first violation with its path, e.g.
//! `data.departmentHeadId: must be a positive integer`. Unknown fields are
//! ignored. A `null` or absent `data` is read as an empty object.

use ovr_core::{SeverityLevel, UserId, WorkflowAction, WorkflowError, WorkflowResult};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SupervisorApprovePayload {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QiAssignHodPayload {
    pub department_head_id: UserId,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignInvestigatorPayload {
    pub investigator_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFindingsPayload {
    pub findings: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HodSubmitPayload {
    pub investigation_findings: String,
    pub problems_identified: String,
    pub cause_classification: String,
    pub cause_details: Option<String>,
    pub prevention_recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QiClosePayload {
    pub feedback: String,
    pub severity_level: SeverityLevel,
    pub form_complete: bool,
    pub cause_identified: bool,
    pub cause_classified: bool,
    pub prevention_appropriate: bool,
    pub feedback_appropriate: bool,
}

/// A validated payload, one variant per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    SupervisorApprove(SupervisorApprovePayload),
    QiAssignHod(QiAssignHodPayload),
    AssignInvestigator(AssignInvestigatorPayload),
    SubmitFindings(SubmitFindingsPayload),
    HodSubmit(HodSubmitPayload),
    QiClose(QiClosePayload),
}

impl ActionPayload {
    /// Validates raw `data` against the schema of `action`.
    pub fn parse(action: WorkflowAction, data: Option<&Value>) -> WorkflowResult<Self> {
        let fields = Fields::from_data(data)?;
        let payload = match action {
            WorkflowAction::SupervisorApprove => {
                Self::SupervisorApprove(SupervisorApprovePayload {
                    notes: fields.optional_str("notes")?,
                })
            }
            WorkflowAction::QiAssignHod => Self::QiAssignHod(QiAssignHodPayload {
                department_head_id: fields.positive_id("departmentHeadId")?,
                notes: fields.optional_str("notes")?,
            }),
            WorkflowAction::AssignInvestigator => {
                Self::AssignInvestigator(AssignInvestigatorPayload {
                    investigator_id: fields.positive_id("investigatorId")?,
                })
            }
            WorkflowAction::SubmitFindings => Self::SubmitFindings(SubmitFindingsPayload {
                findings: fields.required_str("findings")?,
            }),
            WorkflowAction::HodSubmit => Self::HodSubmit(HodSubmitPayload {
                investigation_findings: fields.required_str("investigationFindings")?,
                problems_identified: fields.required_str("problemsIdentified")?,
                cause_classification: fields.required_str("causeClassification")?,
                cause_details: fields.optional_str("causeDetails")?,
                prevention_recommendation: fields.required_str("preventionRecommendation")?,
            }),
            WorkflowAction::QiClose => Self::QiClose(QiClosePayload {
                feedback: fields.required_str("feedback")?,
                severity_level: fields.severity("severityLevel")?,
                form_complete: fields.flag("formComplete")?,
                cause_identified: fields.flag("causeIdentified")?,
                cause_classified: fields.flag("causeClassified")?,
                prevention_appropriate: fields.flag("preventionAppropriate")?,
                feedback_appropriate: fields.flag("feedbackAppropriate")?,
            }),
        };
        Ok(payload)
    }

    /// The action this payload belongs to.
    #[must_use]
    pub fn action(&self) -> WorkflowAction {
        match self {
            Self::SupervisorApprove(_) => WorkflowAction::SupervisorApprove,
            Self::QiAssignHod(_) => WorkflowAction::QiAssignHod,
            Self::AssignInvestigator(_) => WorkflowAction::AssignInvestigator,
            Self::SubmitFindings(_) => WorkflowAction::SubmitFindings,
            Self::HodSubmit(_) => WorkflowAction::HodSubmit,
            Self::QiClose(_) => WorkflowAction::QiClose,
        }
    }
}

/// Field accessor over the `data` object.
struct Fields<'a> {
    obj: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn from_data(data: Option<&'a Value>) -> WorkflowResult<Self> {
        match data {
            None | Some(Value::Null) => Ok(Self { obj: None }),
            Some(Value::Object(obj)) => Ok(Self { obj: Some(obj) }),
            Some(_) => Err(WorkflowError::invalid_field("data", "must be an object")),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.obj
            .and_then(|obj| obj.get(name))
            .filter(|value| !value.is_null())
    }

    fn required_str(&self, name: &str) -> WorkflowResult<String> {
        let value = self.get(name).ok_or_else(|| invalid(name, "is required"))?;
        let text = value
            .as_str()
            .ok_or_else(|| invalid(name, "must be a string"))?;
        if text.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
        Ok(text.to_string())
    }

    fn optional_str(&self, name: &str) -> WorkflowResult<Option<String>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(_) => Err(invalid(name, "must be a string")),
        }
    }

    fn positive_id(&self, name: &str) -> WorkflowResult<UserId> {
        let value = self.get(name).ok_or_else(|| invalid(name, "is required"))?;
        match value.as_i64() {
            Some(id) if id > 0 => Ok(id),
            _ => Err(invalid(name, "must be a positive integer")),
        }
    }

    fn flag(&self, name: &str) -> WorkflowResult<bool> {
        match self.get(name) {
            None => Ok(false),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(_) => Err(invalid(name, "must be a boolean")),
        }
    }

    fn severity(&self, name: &str) -> WorkflowResult<SeverityLevel> {
        let value = self.get(name).ok_or_else(|| invalid(name, "is required"))?;
        value
            .as_str()
            .and_then(|text| {
                SeverityLevel::ALL
                    .into_iter()
                    .find(|level| level.as_str() == text)
            })
            .ok_or_else(|| invalid(name, "must be one of low, medium, high, critical"))
    }
}

fn invalid(name: &str, message: &str) -> WorkflowError {
    WorkflowError::invalid_field(format!("data.{name}"), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(action: WorkflowAction, data: Value) -> WorkflowResult<ActionPayload> {
        ActionPayload::parse(action, Some(&data))
    }

    #[test]
    fn absent_data_is_empty_object() {
        let payload = ActionPayload::parse(WorkflowAction::SupervisorApprove, None).unwrap();
        assert_eq!(
            payload,
            ActionPayload::SupervisorApprove(SupervisorApprovePayload::default())
        );
        let err = ActionPayload::parse(WorkflowAction::SubmitFindings, Some(&Value::Null))
            .unwrap_err();
        assert_eq!(err.path(), Some("data.findings"));
    }

    #[test]
    fn data_must_be_an_object() {
        let err = parse(WorkflowAction::QiAssignHod, json!([1, 2])).unwrap_err();
        assert_eq!(err.path(), Some("data"));
    }

    #[test]
    fn department_head_must_be_positive_integer() {
        for bad in [
            json!({}),
            json!({"departmentHeadId": "7"}),
            json!({"departmentHeadId": 0}),
            json!({"departmentHeadId": 1.5}),
        ] {
            let err = parse(WorkflowAction::QiAssignHod, bad).unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.path(), Some("data.departmentHeadId"));
        }
        let payload = parse(
            WorkflowAction::QiAssignHod,
            json!({"departmentHeadId": 7, "notes": "urgent"}),
        )
        .unwrap();
        assert_eq!(
            payload,
            ActionPayload::QiAssignHod(QiAssignHodPayload {
                department_head_id: 7,
                notes: Some("urgent".to_string()),
            })
        );
    }

    #[test]
    fn blank_findings_are_rejected() {
        let err = parse(WorkflowAction::SubmitFindings, json!({"findings": "   "})).unwrap_err();
        assert_eq!(err.path(), Some("data.findings"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn hod_submit_reports_first_missing_field() {
        let err = parse(
            WorkflowAction::HodSubmit,
            json!({
                "investigationFindings": "Rail latch worn",
                "problemsIdentified": "No maintenance log"
            }),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("data.causeClassification"));
    }

    #[test]
    fn qi_close_flags_default_to_false() {
        let payload = parse(
            WorkflowAction::QiClose,
            json!({"feedback": "Thorough", "severityLevel": "high", "formComplete": true}),
        )
        .unwrap();
        let ActionPayload::QiClose(close) = payload else {
            panic!("wrong variant");
        };
        assert_eq!(close.severity_level, SeverityLevel::High);
        assert!(close.form_complete);
        assert!(!close.cause_identified && !close.feedback_appropriate);

        let err = parse(
            WorkflowAction::QiClose,
            json!({"feedback": "x", "severityLevel": "catastrophic"}),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("data.severityLevel"));

        let err = parse(
            WorkflowAction::QiClose,
            json!({"feedback": "x", "severityLevel": "low", "causeIdentified": "yes"}),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("data.causeIdentified"));
    }

    #[test]
    fn payload_knows_its_action() {
        for action in WorkflowAction::ALL {
            let data = json!({
                "departmentHeadId": 1, "investigatorId": 1, "findings": "f",
                "investigationFindings": "a", "problemsIdentified": "b",
                "causeClassification": "c", "preventionRecommendation": "d",
                "feedback": "e", "severityLevel": "low"
            });
            assert_eq!(parse(action, data).unwrap().action(), action);
        }
    }
}
