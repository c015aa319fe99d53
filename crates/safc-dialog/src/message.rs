//! What a transport sends into a session and what it gets back.

use serde::{Deserialize, Serialize};

/// A sub-action offered once a subject has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  View,
  AddReview,
  Details,
  CreateSubject,
  End,
}

impl Action {
  /// Menu for a subject that is already stored.
  pub const EXISTING: [Action; 4] = [Action::View, Action::AddReview, Action::Details, Action::End];
  /// Menu for a subject that is not stored yet.
  pub const UNKNOWN: [Action; 2] = [Action::CreateSubject, Action::End];

  pub fn menu(exists: bool) -> &'static [Action] {
    if exists { &Self::EXISTING } else { &Self::UNKNOWN }
  }

  pub fn label(self) -> &'static str {
    match self {
      Action::View => "View reviews",
      Action::AddReview => "Add review",
      Action::Details => "Details",
      Action::CreateSubject => "Add this subject",
      Action::End => "End",
    }
  }
}

/// One message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Input {
  /// Begin (or restart) the walk at the category level.
  Start,
  /// Free text: a hierarchy value, a review body or an OTP.
  Text(String),
  /// A menu selection.
  Select(Action),
  Cancel,
  Help,
  Info,
}

/// The controller's answer to one [`Input`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
  pub text:        String,
  /// Known values for the next hierarchy level, for keyboard rendering.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub suggestions: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub actions:     Vec<Action>,
  /// The session is over and its state has been discarded.
  #[serde(default)]
  pub ended:       bool,
}

impl Reply {
  pub fn text(text: impl Into<String>) -> Self { Self { text: text.into(), ..Self::default() } }

  pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
    self.suggestions = suggestions;
    self
  }

  pub fn with_actions(mut self, actions: &[Action]) -> Self {
    self.actions = actions.to_vec();
    self
  }

  pub fn ended(mut self) -> Self {
    self.ended = true;
    self
  }
}
