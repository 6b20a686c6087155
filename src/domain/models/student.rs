use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::event::StudentIdentity;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub year: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn new(student_id: String, name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            student_id,
            name,
            email: email.to_lowercase(),
            department: None,
            year: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn identity(&self) -> StudentIdentity {
        StudentIdentity {
            student_id: self.student_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}
