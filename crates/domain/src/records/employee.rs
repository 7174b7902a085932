//! The employee record.

use serde::{Deserialize, Serialize};

use crate::{EntityId, FieldKind, FieldSpec, impl_entity};

/// An employee tracked on or off the bench.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Store-assigned identity.
    pub id: Option<EntityId>,
    /// External UPSA identifier.
    pub upsa_id: Option<String>,
    /// Full display name.
    pub full_name: Option<String>,
    /// Work e-mail address.
    pub email: Option<String>,
    /// Job title.
    pub title: Option<String>,
}

impl Employee {
    /// Creates an unsaved employee with the required fields set.
    pub fn new(upsa_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            upsa_id: Some(upsa_id.into()),
            full_name: Some(full_name.into()),
            ..Default::default()
        }
    }

    /// Sets the e-mail address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the job title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl_entity!(Employee, "employee", "employees", [
    FieldSpec::required("upsaId", FieldKind::String),
    FieldSpec::required("fullName", FieldKind::String),
    FieldSpec::optional("email", FieldKind::String),
    FieldSpec::optional("title", FieldKind::String),
]);
