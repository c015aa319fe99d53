//! Per-session state of the guided selection walk.

use safc_core::{ContentId, subject::SubjectPath};
use serde::{Deserialize, Serialize};

/// A review written in the session but not yet published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
  pub body:      String,
  pub date:      String,
  /// Id the review will get once published.
  pub review_id: ContentId,
}

/// Where a session is in the walk. Each variant carries the partial path
/// chosen so far, so a state value is self-contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum State {
  /// Waiting for a category.
  Category,
  Institution {
    category: String,
  },
  Department {
    category:    String,
    institution: String,
  },
  Subject {
    category:    String,
    institution: String,
    department:  String,
  },
  /// A subject is resolved; waiting for a menu selection.
  Menu {
    path:       SubjectPath,
    subject_id: ContentId,
    exists:     bool,
  },
  /// Waiting for the review body.
  Compose {
    path:       SubjectPath,
    subject_id: ContentId,
  },
  /// Waiting for the OTP that publishes `draft`.
  Confirm {
    path:       SubjectPath,
    subject_id: ContentId,
    draft:      Draft,
  },
  End,
}

impl State {
  pub fn is_end(&self) -> bool { matches!(self, State::End) }

  /// Short name used in logs.
  pub fn name(&self) -> &'static str {
    match self {
      State::Category => "category",
      State::Institution { .. } => "institution",
      State::Department { .. } => "department",
      State::Subject { .. } => "subject",
      State::Menu { .. } => "menu",
      State::Compose { .. } => "compose",
      State::Confirm { .. } => "confirm",
      State::End => "end",
    }
  }
}
