//! Row-level incident predicates.
//!
//! An [`IncidentFilter`] is the data form of a visibility rule. Backends
//! either evaluate it directly with [`IncidentFilter::matches`] or render it
//! with [`IncidentFilter::to_sql`] into a parameterised `WHERE` clause with
//! numbered placeholders (`$1`, `$2`, ...).

use std::fmt;

use ovr_core::{Incident, IncidentStatus, UserId};
use serde::{Deserialize, Serialize};

/// A predicate over incident rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "args")]
pub enum IncidentFilter {
    /// Every row.
    All,
    /// `reporter_id = user`
    Reporter(UserId),
    /// `supervisor_id = user`
    Supervisor(UserId),
    /// `status = s`
    StatusIs(IncidentStatus),
    /// `status <> s`
    StatusIsNot(IncidentStatus),
    /// Conjunction. Empty is true.
    And(Vec<IncidentFilter>),
    /// Disjunction. Empty is false.
    Or(Vec<IncidentFilter>),
}

impl IncidentFilter {
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = IncidentFilter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    #[must_use]
    pub fn or(filters: impl IntoIterator<Item = IncidentFilter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Evaluates the predicate against one incident.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        match self {
            Self::All => true,
            Self::Reporter(user) => incident.reporter_id == *user,
            Self::Supervisor(user) => incident.supervisor_id == Some(*user),
            Self::StatusIs(status) => incident.status == *status,
            Self::StatusIsNot(status) => incident.status != *status,
            Self::And(filters) => filters.iter().all(|f| f.matches(incident)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(incident)),
        }
    }

    /// Renders the predicate as SQL over the `reporter_id`, `supervisor_id`
    /// and `status` columns.
    #[must_use]
    pub fn to_sql(&self) -> SqlFragment {
        let mut params = Vec::new();
        let clause = self.render(&mut params);
        SqlFragment { clause, params }
    }

    fn render(&self, params: &mut Vec<SqlParam>) -> String {
        match self {
            Self::All => "TRUE".to_string(),
            Self::Reporter(user) => {
                params.push(SqlParam::Integer(*user));
                format!("reporter_id = ${}", params.len())
            }
            Self::Supervisor(user) => {
                params.push(SqlParam::Integer(*user));
                format!("supervisor_id = ${}", params.len())
            }
            Self::StatusIs(status) => {
                params.push(SqlParam::Text(status.as_str().to_string()));
                format!("status = ${}", params.len())
            }
            Self::StatusIsNot(status) => {
                params.push(SqlParam::Text(status.as_str().to_string()));
                format!("status <> ${}", params.len())
            }
            Self::And(filters) => join(filters, " AND ", "TRUE", params),
            Self::Or(filters) => join(filters, " OR ", "FALSE", params),
        }
    }
}

fn join(
    filters: &[IncidentFilter],
    separator: &str,
    empty: &str,
    params: &mut Vec<SqlParam>,
) -> String {
    match filters {
        [] => empty.to_string(),
        [only] => only.render(params),
        _ => {
            let parts: Vec<String> = filters.iter().map(|f| f.render(params)).collect();
            format!("({})", parts.join(separator))
        }
    }
}

/// A rendered `WHERE` clause and its bind parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

impl fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clause)
    }
}

/// A SQL bind parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

impl SqlParam {
    /// The value as a string for binding.
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
        }
    }
}
