//! Maintenance tool applying roster changes to stored feedback.
//! Each subcommand runs one cascade against the configured database.

use clap::{Arg, ArgAction, ArgMatches, Command};

use feedback_engine::{
    logic::{CascadeSummary, ConsistencyCoordinator},
    model::store::Datastore,
    Config, Error,
};
use log::{error, info};

const PROGRAM_NAME: &str = "feedback-maint";

const ABOUT_TEXT: &str = "Apply a roster change to stored feedback responses.

Reads `Feedback.toml` and `FEEDBACK_*` environment variables.

EXIT CODES:
     0: Success.
     2: Some responses could not move to a new email that was already in use.
     1: Any other error.";

const COURSE: &str = "course";
const EMAIL: &str = "email";
const OLD_TEAM: &str = "old-team";
const NEW_TEAM: &str = "new-team";
const NEW_SECTION: &str = "new-section";
const OLD_EMAIL: &str = "old-email";
const NEW_EMAIL: &str = "new-email";
const TEAM: &str = "team";

/// A required `--name <VALUE>` option.
fn required(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .action(ArgAction::Set)
        .required(true)
}

fn course() -> Arg {
    required(COURSE, "The course the change applies to")
}

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(
            Command::new("team-changed")
                .about("Drop responses invalidated by a student moving team")
                .arg(course())
                .arg(required(EMAIL, "The student who moved"))
                .arg(required(OLD_TEAM, "The team they left"))
                .arg(required(NEW_TEAM, "The team they joined")),
        )
        .subcommand(
            Command::new("section-changed")
                .about("Move a student's responses and comments to a new section")
                .arg(course())
                .arg(required(EMAIL, "The student who moved"))
                .arg(required(NEW_SECTION, "The section they joined")),
        )
        .subcommand(
            Command::new("email-changed")
                .about("Recreate a user's responses under their new email")
                .arg(course())
                .arg(required(OLD_EMAIL, "The email being replaced"))
                .arg(required(NEW_EMAIL, "The email taking its place")),
        )
        .subcommand(
            Command::new("delete-student")
                .about("Delete every response given or received by a student")
                .arg(course())
                .arg(required(EMAIL, "The student being deleted")),
        )
        .subcommand(
            Command::new("delete-instructor")
                .about("Delete every response given or received by an instructor")
                .arg(course())
                .arg(required(EMAIL, "The instructor being deleted")),
        )
        .subcommand(
            Command::new("delete-team")
                .about("Delete every response given by or to a team")
                .arg(course())
                .arg(required(TEAM, "The team being deleted")),
        )
}

/// A roster change, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    TeamChanged {
        course: String,
        email: String,
        old_team: String,
        new_team: String,
    },
    SectionChanged {
        course: String,
        email: String,
        new_section: String,
    },
    EmailChanged {
        course: String,
        old_email: String,
        new_email: String,
    },
    DeleteStudent {
        course: String,
        email: String,
    },
    DeleteInstructor {
        course: String,
        email: String,
    },
    DeleteTeam {
        course: String,
        team: String,
    },
}

impl Task {
    fn from_matches(args: &ArgMatches) -> Option<Self> {
        let (name, sub) = args.subcommand()?;
        let get = |id: &str| sub.get_one::<String>(id).cloned();
        let course = get(COURSE)?;

        let task = match name {
            "team-changed" => Self::TeamChanged {
                course,
                email: get(EMAIL)?,
                old_team: get(OLD_TEAM)?,
                new_team: get(NEW_TEAM)?,
            },
            "section-changed" => Self::SectionChanged {
                course,
                email: get(EMAIL)?,
                new_section: get(NEW_SECTION)?,
            },
            "email-changed" => Self::EmailChanged {
                course,
                old_email: get(OLD_EMAIL)?,
                new_email: get(NEW_EMAIL)?,
            },
            "delete-student" => Self::DeleteStudent {
                course,
                email: get(EMAIL)?,
            },
            "delete-instructor" => Self::DeleteInstructor {
                course,
                email: get(EMAIL)?,
            },
            "delete-team" => Self::DeleteTeam {
                course,
                team: get(TEAM)?,
            },
            _ => return None,
        };
        Some(task)
    }

    async fn run(&self, coordinator: &ConsistencyCoordinator) -> Result<CascadeSummary, Error> {
        match self {
            Self::TeamChanged {
                course,
                email,
                old_team,
                new_team,
            } => {
                coordinator
                    .update_responses_for_changing_team(course, email, old_team, new_team)
                    .await
            }
            Self::SectionChanged {
                course,
                email,
                new_section,
            } => {
                coordinator
                    .update_responses_for_changing_section(course, email, new_section)
                    .await
            }
            Self::EmailChanged {
                course,
                old_email,
                new_email,
            } => {
                coordinator
                    .update_responses_for_changing_email(course, old_email, new_email)
                    .await
            }
            Self::DeleteStudent { course, email } => {
                coordinator
                    .delete_responses_involving_student(course, email)
                    .await
            }
            Self::DeleteInstructor { course, email } => {
                coordinator
                    .delete_responses_involving_instructor(course, email)
                    .await
            }
            Self::DeleteTeam { course, team } => {
                coordinator.delete_responses_involving_team(course, team).await
            }
        }
    }
}

fn exit_code(result: &Result<CascadeSummary, Error>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(Error::RecreateConflicts(_)) => 2,
        Err(_) => 1,
    }
}

#[tokio::main]
async fn main() {
    let args = cli().get_matches();
    let Some(task) = Task::from_matches(&args) else {
        eprintln!("Unrecognised command");
        std::process::exit(1)
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1)
        }
    };

    // Set up logging.
    if let Err(e) = log4rs::init_file(config.log_config(), Default::default()) {
        eprintln!("Failed to initialise logging: {e}");
        std::process::exit(1)
    }
    info!("Initialised logging");

    let result = match config.connect().await {
        Ok(db) => {
            let coordinator = ConsistencyCoordinator::new(Datastore::mongodb(&db));
            task.run(&coordinator).await
        }
        Err(e) => Err(e),
    };

    match &result {
        Ok(summary) => println!("Done: {summary}"),
        Err(e) => error!("{e}"),
    }
    std::process::exit(exit_code(&result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<Task> {
        let matches = cli()
            .try_get_matches_from([PROGRAM_NAME].iter().chain(args))
            .ok()?;
        Task::from_matches(&matches)
    }

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn correct_cli_usage() {
        assert_eq!(
            parse(&[
                "team-changed",
                "--course",
                "CS101",
                "--email",
                "alice@uni.edu",
                "--old-team",
                "Team 1",
                "--new-team",
                "Team 2",
            ]),
            Some(Task::TeamChanged {
                course: "CS101".to_string(),
                email: "alice@uni.edu".to_string(),
                old_team: "Team 1".to_string(),
                new_team: "Team 2".to_string(),
            })
        );
        assert_eq!(
            parse(&["delete-team", "--course", "CS101", "--team", "Team 1"]),
            Some(Task::DeleteTeam {
                course: "CS101".to_string(),
                team: "Team 1".to_string(),
            })
        );
    }

    #[test]
    fn bad_cli_usage() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["delete-student", "--course", "CS101"]), None);
        assert_eq!(parse(&["rename-course", "--course", "CS101"]), None);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&Ok(CascadeSummary::default())), 0);
        assert_eq!(
            exit_code(&Err(Error::RecreateConflicts(vec!["q1%a%b".to_string()]))),
            2
        );
        assert_eq!(exit_code(&Err(Error::not_found("question q1"))), 1);
    }
}
