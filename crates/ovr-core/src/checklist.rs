//! Checklist codec for corrective actions.
//!
//! A checklist is persisted as a JSON text blob:
//!
//! ```json
//! [{"id": "1", "text": "Replace bed rail", "completed": true,
//!   "completedAt": "2026-01-01T10:00:00Z", "completedBy": 7}]
//! ```
//!
//! All functions are pure. `completedAt` and `completedBy` are set and
//! cleared together.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::UserId;
use crate::error::WorkflowError;

/// One checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<UserId>,
}

impl ChecklistItem {
    /// An uncompleted item.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
            completed_at: None,
            completed_by: None,
        }
    }
}

/// Malformed checklist blobs and unknown items.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("checklist is not valid JSON: {message}")]
    InvalidJson { message: String },

    #[error("checklist must be a JSON array")]
    NotAnArray,

    #[error("checklist item {index} must be an object")]
    ItemNotObject { index: usize },

    #[error("checklist item {index} is missing a string 'id'")]
    MissingId { index: usize },

    #[error("checklist item {index} is missing a string 'text'")]
    MissingText { index: usize },

    #[error("checklist item {index} is missing a boolean 'completed'")]
    MissingCompleted { index: usize },

    #[error("checklist item {index} repeats id '{id}'")]
    DuplicateId { index: usize, id: String },

    #[error("checklist item {index} has an invalid '{field}'")]
    InvalidField { index: usize, field: &'static str },

    #[error("checklist item '{id}' not found")]
    ItemNotFound { id: String },

    #[error("checklist could not be encoded: {message}")]
    Encode { message: String },
}

impl ChecklistError {
    /// Field path of the offending value, relative to the corrective action.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::InvalidJson { .. } | Self::NotAnArray | Self::Encode { .. } => {
                "checklist".to_string()
            }
            Self::ItemNotObject { index } => format!("checklist[{index}]"),
            Self::MissingId { index } | Self::DuplicateId { index, .. } => {
                format!("checklist[{index}].id")
            }
            Self::MissingText { index } => format!("checklist[{index}].text"),
            Self::MissingCompleted { index } => format!("checklist[{index}].completed"),
            Self::InvalidField { index, field } => format!("checklist[{index}].{field}"),
            Self::ItemNotFound { .. } => "itemId".to_string(),
        }
    }
}

impl From<ChecklistError> for WorkflowError {
    fn from(err: ChecklistError) -> Self {
        WorkflowError::invalid_field(err.path(), err.to_string())
    }
}

/// Parses a checklist blob. Item ids must be unique.
pub fn parse(blob: &str) -> Result<Vec<ChecklistItem>, ChecklistError> {
    let value: Value = serde_json::from_str(blob).map_err(|e| ChecklistError::InvalidJson {
        message: e.to_string(),
    })?;
    let Value::Array(entries) = value else {
        return Err(ChecklistError::NotAnArray);
    };

    let mut seen = HashSet::with_capacity(entries.len());
    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let item = parse_item(index, entry)?;
        if !seen.insert(item.id.clone()) {
            return Err(ChecklistError::DuplicateId { index, id: item.id });
        }
        items.push(item);
    }
    Ok(items)
}

fn parse_item(index: usize, entry: &Value) -> Result<ChecklistItem, ChecklistError> {
    let Value::Object(obj) = entry else {
        return Err(ChecklistError::ItemNotObject { index });
    };

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ChecklistError::MissingId { index })?;
    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .ok_or(ChecklistError::MissingText { index })?;
    let completed = obj
        .get("completed")
        .and_then(Value::as_bool)
        .ok_or(ChecklistError::MissingCompleted { index })?;

    let completed_at = match obj.get("completedAt") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            OffsetDateTime::parse(s, &Rfc3339).map_err(|_| ChecklistError::InvalidField {
                index,
                field: "completedAt",
            })?,
        ),
        Some(_) => {
            return Err(ChecklistError::InvalidField {
                index,
                field: "completedAt",
            });
        }
    };
    let completed_by = match obj.get("completedBy") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_i64().ok_or(ChecklistError::InvalidField {
            index,
            field: "completedBy",
        })?),
    };

    Ok(ChecklistItem {
        id: id.to_string(),
        text: text.to_string(),
        completed,
        completed_at,
        completed_by,
    })
}

/// Serialises items to the canonical blob.
///
/// Keys follow the field order of [`ChecklistItem`], so equal lists produce
/// equal blobs.
pub fn serialize(items: &[ChecklistItem]) -> Result<String, ChecklistError> {
    serde_json::to_string(items).map_err(|e| ChecklistError::Encode {
        message: e.to_string(),
    })
}

/// Flips the completion state of one item and returns the new blob.
///
/// Completing stamps `completedAt`/`completedBy`; un-completing clears both.
pub fn toggle_item(
    blob: &str,
    item_id: &str,
    user: UserId,
    now: OffsetDateTime,
) -> Result<String, ChecklistError> {
    let mut items = parse(blob)?;
    let item = items
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or_else(|| ChecklistError::ItemNotFound {
            id: item_id.to_string(),
        })?;

    item.completed = !item.completed;
    if item.completed {
        item.completed_at = Some(now);
        item.completed_by = Some(user);
    } else {
        item.completed_at = None;
        item.completed_by = None;
    }

    serialize(&items)
}

/// Returns `true` iff the list is non-empty and every item is completed.
#[must_use]
pub fn is_complete(items: &[ChecklistItem]) -> bool {
    !items.is_empty() && items.iter().all(|item| item.completed)
}

/// Returns `(completed, total)`.
#[must_use]
pub fn progress(items: &[ChecklistItem]) -> (usize, usize) {
    let completed = items.iter().filter(|item| item.completed).count();
    (completed, items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const BLOB: &str = r#"[
        {"id": "a", "text": "Replace bed rail", "completed": false},
        {"id": "b", "text": "Retrain night staff", "completed": true,
         "completedAt": "2026-02-01T09:30:00Z", "completedBy": 7}
    ]"#;

    #[test]
    fn parses_items() {
        let items = parse(BLOB).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], ChecklistItem::new("a", "Replace bed rail"));
        assert!(items[1].completed);
        assert_eq!(items[1].completed_at, Some(datetime!(2026-02-01 09:30 UTC)));
        assert_eq!(items[1].completed_by, Some(7));
    }

    #[test]
    fn round_trip_is_deterministic() {
        let items = parse(BLOB).unwrap();
        let blob = serialize(&items).unwrap();
        assert_eq!(parse(&blob).unwrap(), items);
        assert_eq!(serialize(&parse(&blob).unwrap()).unwrap(), blob);
        assert!(blob.starts_with(r#"[{"id":"a","text":"Replace bed rail","completed":false}"#));
    }

    #[test]
    fn malformed_blobs_report_the_index() {
        assert!(matches!(
            parse("{not json"),
            Err(ChecklistError::InvalidJson { .. })
        ));
        assert_eq!(parse(r#"{"id": "a"}"#), Err(ChecklistError::NotAnArray));
        assert_eq!(
            parse(r#"[{"id":"a","text":"x","completed":true}, 3]"#),
            Err(ChecklistError::ItemNotObject { index: 1 })
        );
        assert_eq!(
            parse(r#"[{"text":"x","completed":true}]"#),
            Err(ChecklistError::MissingId { index: 0 })
        );
        assert_eq!(
            parse(r#"[{"id":"a","completed":true}]"#),
            Err(ChecklistError::MissingText { index: 0 })
        );
        assert_eq!(
            parse(r#"[{"id":"a","text":"x","completed":"yes"}]"#),
            Err(ChecklistError::MissingCompleted { index: 0 })
        );
        assert_eq!(
            parse(r#"[{"id":"a","text":"x","completed":true,"completedAt":"yesterday"}]"#),
            Err(ChecklistError::InvalidField {
                index: 0,
                field: "completedAt"
            })
        );
    }

    #[test]
    fn errors_convert_to_validation_with_path() {
        let err: WorkflowError = ChecklistError::MissingText { index: 3 }.into();
        assert!(err.is_validation());
        assert_eq!(err.path(), Some("checklist[3].text"));
    }

    #[test]
    fn toggle_sets_and_clears_completion_together() {
        let now = datetime!(2026-03-01 12:00 UTC);
        let toggled = toggle_item(BLOB, "a", 12, now).unwrap();
        let items = parse(&toggled).unwrap();
        assert!(items[0].completed);
        assert_eq!(items[0].completed_at, Some(now));
        assert_eq!(items[0].completed_by, Some(12));

        let untoggled = toggle_item(&toggled, "a", 12, now).unwrap();
        let items = parse(&untoggled).unwrap();
        assert!(!items[0].completed);
        assert_eq!(items[0].completed_at, None);
        assert_eq!(items[0].completed_by, None);
    }

    #[test]
    fn toggle_unknown_item() {
        let now = datetime!(2026-03-01 12:00 UTC);
        assert_eq!(
            toggle_item(BLOB, "zzz", 1, now),
            Err(ChecklistError::ItemNotFound {
                id: "zzz".to_string()
            })
        );
    }

    #[test]
    fn completeness_and_progress() {
        assert!(!is_complete(&[]));
        assert_eq!(progress(&[]), (0, 0));

        let items = parse(BLOB).unwrap();
        assert!(!is_complete(&items));
        assert_eq!(progress(&items), (1, 2));

        let now = datetime!(2026-03-01 12:00 UTC);
        let done = parse(&toggle_item(BLOB, "a", 1, now).unwrap()).unwrap();
        assert!(is_complete(&done));
        assert_eq!(progress(&done), (2, 2));
    }

    #[test]
    fn blank_blob_is_not_a_checklist() {
        assert_eq!(parse("[]").unwrap(), Vec::new());
        for blob in ["", "   "] {
            let err = parse(blob).unwrap_err();
            assert!(matches!(err, ChecklistError::InvalidJson { .. }), "{blob:?}");
            assert_eq!(err.path(), "checklist");
        }
    }

    #[test]
    fn repeated_ids_are_rejected() {
        let blob = r#"[
            {"id": "a", "text": "Order rails", "completed": false},
            {"id": "b", "text": "Install rails", "completed": false},
            {"id": "a", "text": "Order rails again", "completed": true}
        ]"#;
        let err = parse(blob).unwrap_err();
        assert_eq!(
            err,
            ChecklistError::DuplicateId {
                index: 2,
                id: "a".to_string()
            }
        );
        assert_eq!(err.path(), "checklist[2].id");
    }
}
