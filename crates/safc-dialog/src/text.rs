//! Fixed reply texts and small formatting helpers.

use safc_core::{review::Review, subject::SubjectPath};

pub const HELP: &str = "Student Anti-Fraud Center review desk\n\
  start  - begin a new lookup\n\
  cancel - end the session, try this if nothing responds\n\
  help   - show this text\n\
  info   - about this service";

pub const ABOUT: &str = "Student Anti-Fraud Center (SAFC)\n\
  Community, protection, openness.\n\n\
  Supervisors, departments and schools reviewed by the students who know \
  them. Reviews carry no scores: no subject is summed up by a single number.\n\n\
  Privacy: no personal information is recorded. The publisher OTP lets you \
  prove later that you wrote a review; it is optional and only its salted \
  hash is stored.\n\n\
  Initial data: the RateMySupervisor archive.";

pub const GREETING: &str = "Hi! Look up a subject first, then read or write reviews about it.\n\
  Send cancel at any time to stop.\n\n\
  Which category? Pick one below or type a new one.";

pub const NO_SESSION: &str = "There is no active session. Send start to begin.";
pub const CANCELLED: &str = "Session cancelled. Goodbye!";
pub const FINISHED: &str = "Thanks! Session ended. Feedback is always welcome.";
pub const EMPTY_TEXT: &str = "Empty message. Please try again.";
pub const EXPECT_TEXT: &str = "Please type a value, or pick one of the suggestions.";
pub const EXPECT_ACTION: &str = "Please choose one of the options.";
pub const STORE_RETRY: &str = "Sorry, something went wrong on our side. Please try again.";

/// `category / institution / department / name`, skipping empty levels.
pub fn breadcrumb(levels: &[&str]) -> String {
  levels
    .iter()
    .filter(|level| !level.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" / ")
}

pub fn path_breadcrumb(path: &SubjectPath) -> String {
  breadcrumb(&[
    path.category.as_str(),
    path.institution.as_str(),
    path.department.as_str(),
    path.name.as_str(),
  ])
}

/// Reviews as shown to a reader, oldest first.
pub fn review_list(reviews: &[Review]) -> String {
  reviews
    .iter()
    .map(|r| format!("{} | {} | {}\n{}", r.date, r.source, r.id, r.display_body()))
    .collect::<Vec<_>>()
    .join("\n---\n")
}
