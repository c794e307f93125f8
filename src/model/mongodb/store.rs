use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, DateTime as BsonDateTime, Document},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Database,
};
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    model::{
        comment::{CommentUpdate, FeedbackResponseComment},
        question::FeedbackQuestion,
        respondents::RespondentList,
        response::{FeedbackResponse, ResponseFields},
        roster::{CourseRoster, InstructorRecord, StudentRecord},
        store::{
            CommentStore, DeletionQuery, QuestionStore, RespondentStore, ResponseStore,
            RosterSource,
        },
    },
};

use super::Coll;

/// Every store backed by one collection per entity.
pub struct MongoStore {
    responses: Coll<FeedbackResponse>,
    comments: Coll<FeedbackResponseComment>,
    questions: Coll<FeedbackQuestion>,
    students: Coll<StudentRecord>,
    instructors: Coll<InstructorRecord>,
    sessions: Coll<RespondentList>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            responses: Coll::from_db(db),
            comments: Coll::from_db(db),
            questions: Coll::from_db(db),
            students: Coll::from_db(db),
            instructors: Coll::from_db(db),
            sessions: Coll::from_db(db),
        }
    }

    async fn find_responses(&self, filter: Document) -> Result<Vec<FeedbackResponse>> {
        collect(&self.responses, filter).await
    }

    async fn any_response(&self, filter: Document) -> Result<bool> {
        Ok(self.responses.find_one(filter, None).await?.is_some())
    }

    async fn update_session(&self, course_id: &str, session_name: &str, update: Document) -> Result<()> {
        let result = self
            .sessions
            .update_one(session_filter(course_id, session_name), update, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!(
                "session {session_name} of course {course_id}"
            )));
        }
        Ok(())
    }
}

async fn collect<T>(coll: &Coll<T>, filter: Document) -> Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    Ok(coll.find(filter, None).await?.try_collect().await?)
}

fn session_filter(course_id: &str, session_name: &str) -> Document {
    doc! { "courseId": course_id, "sessionName": session_name }
}

fn in_section(section: &str) -> Document {
    doc! { "$or": [{ "giverSection": section }, { "recipientSection": section }] }
}

/// Filter for a bulk deletion. `response_field` names the field holding the response ID.
fn deletion_filter(query: &DeletionQuery, response_field: &str) -> Document {
    match query {
        DeletionQuery::Course(course_id) => doc! { "courseId": course_id.as_str() },
        DeletionQuery::Session {
            course_id,
            session_name,
        } => session_filter(course_id, session_name),
        DeletionQuery::Question(question_id) => doc! { "questionId": question_id.as_str() },
        DeletionQuery::Response(response_id) => doc! { response_field: response_id.as_str() },
    }
}

fn now() -> Bson {
    Bson::DateTime(BsonDateTime::from_chrono(Utc::now()))
}

#[async_trait]
impl ResponseStore for MongoStore {
    async fn get_response(&self, id: &str) -> Result<Option<FeedbackResponse>> {
        Ok(self.responses.find_one(doc! { "_id": id }, None).await?)
    }

    async fn responses_for_question(&self, question_id: &str) -> Result<Vec<FeedbackResponse>> {
        self.find_responses(doc! { "questionId": question_id }).await
    }

    async fn responses_for_question_in_section(
        &self,
        question_id: &str,
        section: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let mut filter = in_section(section);
        filter.insert("questionId", question_id);
        self.find_responses(filter).await
    }

    async fn responses_for_session(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        self.find_responses(session_filter(course_id, session_name))
            .await
    }

    async fn responses_for_session_in_section(
        &self,
        course_id: &str,
        session_name: &str,
        section: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let mut filter = session_filter(course_id, session_name);
        filter.extend(in_section(section));
        self.find_responses(filter).await
    }

    async fn responses_from_giver_for_question(
        &self,
        question_id: &str,
        giver: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        self.find_responses(doc! { "questionId": question_id, "giver": giver })
            .await
    }

    async fn responses_for_receiver_for_question(
        &self,
        question_id: &str,
        recipient: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        self.find_responses(doc! { "questionId": question_id, "recipient": recipient })
            .await
    }

    async fn responses_from_giver_for_course(
        &self,
        course_id: &str,
        giver: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        self.find_responses(doc! { "courseId": course_id, "giver": giver })
            .await
    }

    async fn responses_for_receiver_for_course(
        &self,
        course_id: &str,
        recipient: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        self.find_responses(doc! { "courseId": course_id, "recipient": recipient })
            .await
    }

    async fn create_response(&self, response: &FeedbackResponse) -> Result<()> {
        // Duplicate keys surface as `Error::Conflict`.
        self.responses.insert_one(response, None).await?;
        Ok(())
    }

    async fn update_response_fields(
        &self,
        id: &str,
        fields: &ResponseFields,
    ) -> Result<FeedbackResponse> {
        let mut set = doc! { "updatedAt": now() };
        if let Some(section) = &fields.giver_section {
            set.insert("giverSection", section.as_str());
        }
        if let Some(section) = &fields.recipient_section {
            set.insert("recipientSection", section.as_str());
        }
        if let Some(details) = &fields.details {
            set.insert("details", to_bson(details)?);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.responses
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?
            .ok_or_else(|| Error::not_found(format!("response {id}")))
    }

    async fn delete_response(&self, id: &str) -> Result<()> {
        self.responses.delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    async fn delete_responses(&self, query: &DeletionQuery) -> Result<()> {
        self.responses
            .delete_many(deletion_filter(query, "_id"), None)
            .await?;
        Ok(())
    }

    async fn has_responses_from_giver_in_session(
        &self,
        course_id: &str,
        session_name: &str,
        giver: &str,
    ) -> Result<bool> {
        let mut filter = session_filter(course_id, session_name);
        filter.insert("giver", giver);
        self.any_response(filter).await
    }

    async fn has_responses_for_question(&self, question_id: &str) -> Result<bool> {
        self.any_response(doc! { "questionId": question_id }).await
    }

    async fn has_responses_for_course(&self, course_id: &str) -> Result<bool> {
        self.any_response(doc! { "courseId": course_id }).await
    }

    async fn giver_set_that_answered_session(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<HashSet<String>> {
        let givers = self
            .responses
            .distinct("giver", session_filter(course_id, session_name), None)
            .await?;
        Ok(givers
            .into_iter()
            .filter_map(|giver| match giver {
                Bson::String(giver) => Some(giver),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl CommentStore for MongoStore {
    async fn comments_for_response(&self, response_id: &str) -> Result<Vec<FeedbackResponseComment>> {
        collect(&self.comments, doc! { "responseId": response_id }).await
    }

    async fn update_comment(
        &self,
        comment: &FeedbackResponseComment,
        update: &CommentUpdate,
    ) -> Result<()> {
        let mut set = doc! { "updatedAt": now() };
        if let Some(response_id) = &update.response_id {
            set.insert("responseId", response_id.as_str());
        }
        if let Some(section) = &update.giver_section {
            set.insert("giverSection", section.as_str());
        }
        if let Some(section) = &update.receiver_section {
            set.insert("receiverSection", section.as_str());
        }

        let result = self
            .comments
            .update_one(comment.id.as_doc(), doc! { "$set": set }, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("comment {}", comment.id)));
        }
        Ok(())
    }

    async fn update_comment_emails(
        &self,
        course_id: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<()> {
        for field in ["commentGiver", "lastEditor"] {
            self.comments
                .update_many(
                    doc! { "courseId": course_id, field: old_email },
                    doc! { "$set": { field: new_email } },
                    None,
                )
                .await?;
        }
        Ok(())
    }

    async fn delete_comments(&self, query: &DeletionQuery) -> Result<()> {
        self.comments
            .delete_many(deletion_filter(query, "responseId"), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for MongoStore {
    async fn get_question(&self, id: &str) -> Result<Option<FeedbackQuestion>> {
        Ok(self.questions.find_one(doc! { "_id": id }, None).await?)
    }

    async fn update_question(&self, question: &FeedbackQuestion) -> Result<()> {
        let result = self
            .questions
            .replace_one(doc! { "_id": question.id.as_str() }, question, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("question {}", question.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterSource for MongoStore {
    async fn students_for_team(&self, course_id: &str, team: &str) -> Result<Vec<StudentRecord>> {
        collect(&self.students, doc! { "courseId": course_id, "team": team }).await
    }

    async fn roster_snapshot(&self, course_id: &str) -> Result<CourseRoster> {
        let students = collect(&self.students, doc! { "courseId": course_id }).await?;
        let instructors = collect(&self.instructors, doc! { "courseId": course_id }).await?;
        Ok(CourseRoster::new(students, instructors))
    }
}

#[async_trait]
impl RespondentStore for MongoStore {
    async fn add_student_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        self.update_session(
            course_id,
            session_name,
            doc! { "$addToSet": { "studentEmails": email } },
        )
        .await
    }

    async fn add_instructor_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        self.update_session(
            course_id,
            session_name,
            doc! { "$addToSet": { "instructorEmails": email } },
        )
        .await
    }

    async fn remove_student_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        self.update_session(
            course_id,
            session_name,
            doc! { "$pull": { "studentEmails": email } },
        )
        .await
    }

    async fn remove_instructor_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        self.update_session(
            course_id,
            session_name,
            doc! { "$pull": { "instructorEmails": email } },
        )
        .await
    }

    async fn remove_student_from_all_sessions(&self, course_id: &str, email: &str) -> Result<()> {
        self.sessions
            .update_many(
                doc! { "courseId": course_id },
                doc! { "$pull": { "studentEmails": email } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn remove_instructor_from_all_sessions(
        &self,
        course_id: &str,
        email: &str,
    ) -> Result<()> {
        self.sessions
            .update_many(
                doc! { "courseId": course_id },
                doc! { "$pull": { "instructorEmails": email } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn respondents(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<Option<RespondentList>> {
        Ok(self
            .sessions
            .find_one(session_filter(course_id, session_name), None)
            .await?)
    }
}
