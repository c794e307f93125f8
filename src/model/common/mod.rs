mod participant;

pub use participant::{FeedbackParticipantType, UserRole};

/// Section of every instructor, and of students not placed in any section.
pub const DEFAULT_SECTION: &str = "None";
/// Team name recorded for instructors.
pub const INSTRUCTOR_TEAM: &str = "Instructors";

/// Course IDs are opaque strings chosen by the course creator.
pub type CourseId = String;
/// Question IDs are opaque strings assigned by the question store.
pub type QuestionId = String;
/// Response IDs are derived from the (question, giver, recipient) key.
pub type ResponseId = String;
