//! Bench history entries and bench predictions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntityId, FieldKind, FieldSpec, impl_entity};

/// One change of an employee's bench state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchHistory {
    /// Store-assigned identity.
    pub id: Option<EntityId>,
    /// The employee this entry belongs to.
    pub employee_id: Option<EntityId>,
    /// When the change was recorded.
    pub created_time: Option<DateTime<Utc>>,
    /// Whether the employee is on the bench after the change.
    pub bench: Option<bool>,
    /// Free-form note.
    pub comment: Option<String>,
}

impl BenchHistory {
    /// Creates an unsaved entry for an employee.
    pub fn new(employee_id: EntityId, created_time: DateTime<Utc>, bench: bool) -> Self {
        Self {
            id: None,
            employee_id: Some(employee_id),
            created_time: Some(created_time),
            bench: Some(bench),
            comment: None,
        }
    }

    /// Attaches a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl_entity!(BenchHistory, "benchHistory", "bench-histories", [
    FieldSpec::required("employeeId", FieldKind::Reference),
    FieldSpec::required("createdTime", FieldKind::Timestamp),
    FieldSpec::required("bench", FieldKind::Boolean),
    FieldSpec::optional("comment", FieldKind::String),
]);

/// Flags predicting an employee's next move on or off the bench.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchPredictions {
    /// Store-assigned identity.
    pub id: Option<EntityId>,
    /// When the prediction was made.
    pub created_time: Option<DateTime<Utc>>,
    /// Whether the prediction is ignored.
    pub ignored: Option<bool>,
    /// Whether the day counters are ignored.
    pub ignored_days: Option<bool>,
    /// Predicted to go to the bench.
    pub ready_to_bench: Option<bool>,
    /// Predicted to go to production.
    pub ready_to_production: Option<bool>,
}

impl_entity!(BenchPredictions, "benchPredictions", "bench-predictions", [
    FieldSpec::required("createdTime", FieldKind::Timestamp),
    FieldSpec::required("ignored", FieldKind::Boolean),
    FieldSpec::optional("ignoredDays", FieldKind::Boolean),
    FieldSpec::required("readyToBench", FieldKind::Boolean),
    FieldSpec::required("readyToProduction", FieldKind::Boolean),
]);
