use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::{
    comment::FeedbackResponseComment,
    question::FeedbackQuestion,
    respondents::RespondentList,
    response::FeedbackResponse,
    roster::{InstructorRecord, StudentRecord},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl MongoCollection for FeedbackQuestion {
    const NAME: &'static str = "questions";
}

impl MongoCollection for FeedbackResponse {
    const NAME: &'static str = "responses";
}

impl MongoCollection for FeedbackResponseComment {
    const NAME: &'static str = "comments";
}

impl MongoCollection for StudentRecord {
    const NAME: &'static str = "students";
}

impl MongoCollection for InstructorRecord {
    const NAME: &'static str = "instructors";
}

/// One respondent list per session.
impl MongoCollection for RespondentList {
    const NAME: &'static str = "sessions";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Response collection. The `_id` is derived from the same triple, but new
    // keys are checked against this index as well.
    let response_index = IndexModel::builder()
        .keys(doc! {"questionId": 1, "giver": 1, "recipient": 1})
        .options(unique.clone())
        .build();
    Coll::<FeedbackResponse>::from_db(db)
        .create_index(response_index, None)
        .await?;

    // Student collection.
    let student_index = IndexModel::builder()
        .keys(doc! {"courseId": 1, "email": 1})
        .options(unique.clone())
        .build();
    Coll::<StudentRecord>::from_db(db)
        .create_index(student_index, None)
        .await?;

    // Instructor collection.
    let instructor_index = IndexModel::builder()
        .keys(doc! {"courseId": 1, "email": 1})
        .options(unique.clone())
        .build();
    Coll::<InstructorRecord>::from_db(db)
        .create_index(instructor_index, None)
        .await?;

    // Session collection.
    let session_index = IndexModel::builder()
        .keys(doc! {"courseId": 1, "sessionName": 1})
        .options(unique)
        .build();
    Coll::<RespondentList>::from_db(db)
        .create_index(session_index, None)
        .await?;

    Ok(())
}
