mod details;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

pub use details::*;

use crate::model::{
    common::{CourseId, QuestionId, ResponseId},
    question::FeedbackQuestion,
};

/// One giver's answer about one recipient for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    /// Always `make_id(question_id, giver, recipient)`.
    #[serde(rename = "_id")]
    pub id: ResponseId,
    pub course_id: CourseId,
    pub session_name: String,
    pub question_id: QuestionId,
    /// An email, or a team name when the question's giver type is a team.
    pub giver: String,
    pub giver_section: String,
    /// An email, or a team name when the question's recipient type is a team.
    pub recipient: String,
    pub recipient_section: String,
    pub details: ResponseDetails,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl FeedbackResponse {
    pub fn new(
        question: &FeedbackQuestion,
        giver: impl Into<String>,
        giver_section: impl Into<String>,
        recipient: impl Into<String>,
        recipient_section: impl Into<String>,
        details: ResponseDetails,
    ) -> Self {
        let giver = giver.into();
        let recipient = recipient.into();
        Self {
            id: Self::make_id(&question.id, &giver, &recipient),
            course_id: question.course_id.clone(),
            session_name: question.session_name.clone(),
            question_id: question.id.clone(),
            giver,
            giver_section: giver_section.into(),
            recipient,
            recipient_section: recipient_section.into(),
            details,
            updated_at: Utc::now(),
        }
    }

    /// The identifier of the response keyed by the given triple.
    pub fn make_id(question_id: &str, giver: &str, recipient: &str) -> ResponseId {
        format!("{question_id}%{giver}%{recipient}")
    }
}

/// Changes to a response which leave its key intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFields {
    pub giver_section: Option<String>,
    pub recipient_section: Option<String>,
    pub details: Option<ResponseDetails>,
}

impl ResponseFields {
    pub fn is_empty(&self) -> bool {
        self.giver_section.is_none() && self.recipient_section.is_none() && self.details.is_none()
    }

    pub fn apply_to(&self, response: &mut FeedbackResponse) {
        if let Some(section) = &self.giver_section {
            response.giver_section = section.clone();
        }
        if let Some(section) = &self.recipient_section {
            response.recipient_section = section.clone();
        }
        if let Some(details) = &self.details {
            response.details = details.clone();
        }
        response.updated_at = Utc::now();
    }
}

/// Requested changes to a response. Changing the giver or recipient moves
/// the response to a new key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseUpdate {
    pub giver: Option<String>,
    pub recipient: Option<String>,
    pub fields: ResponseFields,
}

impl ResponseUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_giver(mut self, giver: impl Into<String>) -> Self {
        self.giver = Some(giver.into());
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_giver_section(mut self, section: impl Into<String>) -> Self {
        self.fields.giver_section = Some(section.into());
        self
    }

    pub fn with_recipient_section(mut self, section: impl Into<String>) -> Self {
        self.fields.recipient_section = Some(section.into());
        self
    }

    pub fn with_details(mut self, details: ResponseDetails) -> Self {
        self.fields.details = Some(details);
        self
    }

    /// The response as it would be after this update.
    pub fn applied_to(&self, response: &FeedbackResponse) -> FeedbackResponse {
        let mut updated = response.clone();
        if let Some(giver) = &self.giver {
            updated.giver = giver.clone();
        }
        if let Some(recipient) = &self.recipient {
            updated.recipient = recipient.clone();
        }
        updated.id = FeedbackResponse::make_id(&updated.question_id, &updated.giver, &updated.recipient);
        self.fields.apply_to(&mut updated);
        updated
    }
}
