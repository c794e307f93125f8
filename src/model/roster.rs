use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::common::{CourseId, DEFAULT_SECTION, INSTRUCTOR_TEAM};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub course_id: CourseId,
    pub email: String,
    pub name: String,
    pub team: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorRecord {
    pub course_id: CourseId,
    pub email: String,
    pub name: String,
}

/// Read-only snapshot of who is in a course, indexed for constant-time lookups.
#[derive(Debug, Clone, Default)]
pub struct CourseRoster {
    students: HashMap<String, StudentRecord>,
    instructors: HashMap<String, InstructorRecord>,
    /// Members of each team, ordered by email.
    teams: HashMap<String, Vec<StudentRecord>>,
}

impl CourseRoster {
    pub fn new(students: Vec<StudentRecord>, instructors: Vec<InstructorRecord>) -> Self {
        let mut teams: HashMap<String, Vec<StudentRecord>> = HashMap::new();
        for student in &students {
            teams
                .entry(student.team.clone())
                .or_default()
                .push(student.clone());
        }
        for members in teams.values_mut() {
            members.sort_by(|a, b| a.email.cmp(&b.email));
        }

        Self {
            students: students
                .into_iter()
                .map(|student| (student.email.clone(), student))
                .collect(),
            instructors: instructors
                .into_iter()
                .map(|instructor| (instructor.email.clone(), instructor))
                .collect(),
            teams,
        }
    }

    pub fn student_for_email(&self, email: &str) -> Option<&StudentRecord> {
        self.students.get(email)
    }

    pub fn instructor_for_email(&self, email: &str) -> Option<&InstructorRecord> {
        self.instructors.get(email)
    }

    pub fn is_student_in_course(&self, email: &str) -> bool {
        self.students.contains_key(email)
    }

    pub fn is_instructor(&self, email: &str) -> bool {
        self.instructors.contains_key(email)
    }

    /// Team of a student, or the pseudo-team every instructor belongs to.
    pub fn team_of(&self, email: &str) -> Option<&str> {
        if let Some(student) = self.students.get(email) {
            Some(&student.team)
        } else if self.is_instructor(email) {
            Some(INSTRUCTOR_TEAM)
        } else {
            None
        }
    }

    /// Section of a student, or the default section for instructors.
    pub fn section_of(&self, email: &str) -> Option<&str> {
        if let Some(student) = self.students.get(email) {
            Some(&student.section)
        } else if self.is_instructor(email) {
            Some(DEFAULT_SECTION)
        } else {
            None
        }
    }

    pub fn is_student_in_team(&self, email: &str, team: &str) -> bool {
        self.students
            .get(email)
            .map_or(false, |student| student.team == team)
    }

    /// Both are students of this course, in the same team.
    pub fn is_students_in_same_team(&self, first: &str, second: &str) -> bool {
        match (self.students.get(first), self.students.get(second)) {
            (Some(a), Some(b)) => a.team == b.team,
            _ => false,
        }
    }

    /// Does `email` belong to the team that gave a team response?
    ///
    /// `giver` is normally a team name, but older responses recorded the
    /// email of the student who answered on the team's behalf, so a teammate
    /// of that student also counts.
    pub fn is_member_of_giver_team(&self, email: &str, giver: &str) -> bool {
        self.is_student_in_team(email, giver) || self.is_students_in_same_team(email, giver)
    }

    /// Members of a team ordered by email; empty for an unknown team.
    pub fn team_members(&self, team: &str) -> &[StudentRecord] {
        self.teams.get(team).map_or(&[], Vec::as_slice)
    }
}

/// Example test data.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    fn student(email: &str, name: &str, team: &str, section: &str) -> StudentRecord {
        StudentRecord {
            course_id: "CS101".to_string(),
            email: email.to_string(),
            name: name.to_string(),
            team: team.to_string(),
            section: section.to_string(),
        }
    }

    impl StudentRecord {
        pub fn example_alice() -> Self {
            student("alice@uni.edu", "Alice", "Team 1", "Section 1")
        }

        pub fn example_bob() -> Self {
            student("bob@uni.edu", "Bob", "Team 1", "Section 1")
        }

        pub fn example_carol() -> Self {
            student("carol@uni.edu", "Carol", "Team 2", "Section 2")
        }
    }

    impl InstructorRecord {
        pub fn example() -> Self {
            Self {
                course_id: "CS101".to_string(),
                email: "prof@uni.edu".to_string(),
                name: "Prof".to_string(),
            }
        }
    }

    impl CourseRoster {
        /// Alice and Bob in Team 1, Carol alone in Team 2, one instructor.
        pub fn example() -> Self {
            Self::new(
                vec![
                    StudentRecord::example_bob(),
                    StudentRecord::example_alice(),
                    StudentRecord::example_carol(),
                ],
                vec![InstructorRecord::example()],
            )
        }
    }
}
