use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::common::CourseId;

/// Who has answered at least one question of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondentList {
    pub course_id: CourseId,
    pub session_name: String,
    #[serde(default)]
    pub student_emails: BTreeSet<String>,
    #[serde(default)]
    pub instructor_emails: BTreeSet<String>,
}

impl RespondentList {
    pub fn new(course_id: impl Into<String>, session_name: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            session_name: session_name.into(),
            ..Default::default()
        }
    }

    pub fn has_respondent(&self, email: &str) -> bool {
        self.student_emails.contains(email) || self.instructor_emails.contains(email)
    }
}
