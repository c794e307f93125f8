use std::collections::HashSet;

use crate::{
    error::{Error, Result},
    model::{
        comment::CommentUpdate,
        common::FeedbackParticipantType,
        question::FeedbackQuestion,
        response::{FeedbackResponse, ResponseDetails, ResponseUpdate},
        store::{Datastore, DeletionQuery},
    },
};

/// Response bookkeeping shared by request handlers and the roster cascades.
#[derive(Clone)]
pub struct ResponsesLogic {
    store: Datastore,
}

impl ResponsesLogic {
    pub fn new(store: Datastore) -> Self {
        Self { store }
    }

    /// Fails with [`Error::Conflict`] if the (question, giver, recipient) key is taken.
    pub async fn create_response(&self, response: &FeedbackResponse) -> Result<()> {
        self.store.responses.create_response(response).await
    }

    pub async fn get_response(&self, id: &str) -> Result<Option<FeedbackResponse>> {
        self.store.responses.get_response(id).await
    }

    pub async fn get_response_by_key(
        &self,
        question_id: &str,
        giver: &str,
        recipient: &str,
    ) -> Result<Option<FeedbackResponse>> {
        self.store
            .responses
            .get_response_by_key(question_id, giver, recipient)
            .await
    }

    /// Responses to a question, optionally only those whose giver or recipient is in `section`.
    pub async fn responses_for_question(
        &self,
        question_id: &str,
        section: Option<&str>,
    ) -> Result<Vec<FeedbackResponse>> {
        match section {
            Some(section) => {
                self.store
                    .responses
                    .responses_for_question_in_section(question_id, section)
                    .await
            }
            None => self.store.responses.responses_for_question(question_id).await,
        }
    }

    /// Responses of a session, optionally only those whose giver or recipient is in `section`.
    pub async fn responses_for_session(
        &self,
        course_id: &str,
        session_name: &str,
        section: Option<&str>,
    ) -> Result<Vec<FeedbackResponse>> {
        match section {
            Some(section) => {
                self.store
                    .responses
                    .responses_for_session_in_section(course_id, session_name, section)
                    .await
            }
            None => {
                self.store
                    .responses
                    .responses_for_session(course_id, session_name)
                    .await
            }
        }
    }

    pub async fn has_giver_responded_for_session(
        &self,
        course_id: &str,
        session_name: &str,
        giver: &str,
    ) -> Result<bool> {
        self.store
            .responses
            .has_responses_from_giver_in_session(course_id, session_name, giver)
            .await
    }

    pub async fn are_there_responses_for_question(&self, question_id: &str) -> Result<bool> {
        self.store.responses.has_responses_for_question(question_id).await
    }

    pub async fn has_responses_for_course(&self, course_id: &str) -> Result<bool> {
        self.store.responses.has_responses_for_course(course_id).await
    }

    /// Check one giver's answers to `question`, reporting every problem at once.
    pub fn validate_responses(
        &self,
        question: &FeedbackQuestion,
        responses: &[FeedbackResponse],
    ) -> Result<()> {
        let details: Vec<ResponseDetails> = responses
            .iter()
            .map(|response| response.details.clone())
            .collect();
        Error::check_violations(
            question
                .details
                .validate_response_details(&details, responses.len()),
        )
    }

    /// Apply `update` to the response with the given ID, carrying comments along.
    ///
    /// Changing the giver or recipient changes the ID, so the response is
    /// recreated under its new key. The new response is written first; on a
    /// [`Error::Conflict`] the old response is left untouched.
    pub async fn update_response_cascade(
        &self,
        id: &str,
        update: &ResponseUpdate,
    ) -> Result<FeedbackResponse> {
        let old = self
            .store
            .responses
            .get_response(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("response {id}")))?;

        let new = update.applied_to(&old);
        let new = if new.id != old.id {
            self.store.responses.create_response(&new).await?;
            self.store.responses.delete_response(&old.id).await?;
            new
        } else if update.fields.is_empty() {
            old.clone()
        } else {
            self.store
                .responses
                .update_response_fields(&old.id, &update.fields)
                .await?
        };

        let comment_update = CommentUpdate {
            response_id: (new.id != old.id).then(|| new.id.clone()),
            giver_section: (new.giver_section != old.giver_section)
                .then(|| new.giver_section.clone()),
            receiver_section: (new.recipient_section != old.recipient_section)
                .then(|| new.recipient_section.clone()),
        };
        if !comment_update.is_empty() {
            for comment in self.store.comments.comments_for_response(&old.id).await? {
                self.store
                    .comments
                    .update_comment(&comment, &comment_update)
                    .await?;
            }
        }

        Ok(new)
    }

    /// Delete a response and its comments. Respondent lists are not updated.
    pub async fn delete_response_cascade(&self, id: &str) -> Result<()> {
        self.store
            .comments
            .delete_comments(&DeletionQuery::Response(id.to_string()))
            .await?;
        self.store.responses.delete_response(id).await
    }

    /// Delete responses alone, leaving their comments.
    pub async fn delete_responses(&self, query: &DeletionQuery) -> Result<()> {
        self.store.responses.delete_responses(query).await
    }

    /// Delete every response of a question with their comments, then drop
    /// givers left without any response from the session's respondents.
    pub async fn delete_responses_for_question_cascade(&self, question_id: &str) -> Result<()> {
        let question = self
            .store
            .questions
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {question_id}")))?;

        let givers: HashSet<String> = self
            .store
            .responses
            .responses_for_question(question_id)
            .await?
            .into_iter()
            .map(|response| response.giver)
            .collect();

        let query = DeletionQuery::Question(question_id.to_string());
        self.store.responses.delete_responses(&query).await?;
        self.store.comments.delete_comments(&query).await?;
        debug!(
            "Deleted responses of question {question_id} from {} givers",
            givers.len()
        );

        match question.giver_type {
            FeedbackParticipantType::Myself | FeedbackParticipantType::Instructors => {
                self.remove_instructors_from_respondents_if_necessary(
                    &question.course_id,
                    &question.session_name,
                    &givers,
                )
                .await
            }
            FeedbackParticipantType::Students => {
                self.remove_students_from_respondents_if_necessary(
                    &question.course_id,
                    &question.session_name,
                    &givers,
                )
                .await
            }
            _ => {}
        }
        Ok(())
    }

    /// Drop each student without any remaining response in the session from its respondents.
    ///
    /// Failures only leave the response rate stale, so they are logged and skipped.
    pub async fn remove_students_from_respondents_if_necessary<'a>(
        &self,
        course_id: &str,
        session_name: &str,
        emails: impl IntoIterator<Item = &'a String>,
    ) {
        for email in emails {
            let result = async {
                if !self
                    .has_giver_responded_for_session(course_id, session_name, email)
                    .await?
                {
                    self.store
                        .respondents
                        .remove_student_respondent(course_id, session_name, email)
                        .await?;
                }
                Ok::<_, Error>(())
            }
            .await;
            if let Err(e) = result {
                warn!(
                    "Cannot adjust response rate for student {email} course {course_id} \
                     feedbackSession {session_name} because of {e}"
                );
            }
        }
    }

    /// Drop each instructor without any remaining response in the session from its respondents.
    pub async fn remove_instructors_from_respondents_if_necessary<'a>(
        &self,
        course_id: &str,
        session_name: &str,
        emails: impl IntoIterator<Item = &'a String>,
    ) {
        for email in emails {
            let result = async {
                if !self
                    .has_giver_responded_for_session(course_id, session_name, email)
                    .await?
                {
                    self.store
                        .respondents
                        .remove_instructor_respondent(course_id, session_name, email)
                        .await?;
                }
                Ok::<_, Error>(())
            }
            .await;
            if let Err(e) = result {
                warn!(
                    "Cannot adjust response rate for instructor {email} course {course_id} \
                     feedbackSession {session_name} because of {e}"
                );
            }
        }
    }
}
