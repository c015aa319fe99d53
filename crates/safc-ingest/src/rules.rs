//! Institution → category classification.
//!
//! An ordered table of substring rules. The first rule whose pattern occurs
//! in the institution name decides the category. The table is plain data so
//! it can be loaded from configuration and tested on its own.

use serde::{Deserialize, Serialize};

/// One `pattern → category` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
  pub pattern:  String,
  pub category: String,
}

impl CategoryRule {
  pub fn new(pattern: impl Into<String>, category: impl Into<String>) -> Self {
    Self { pattern: pattern.into(), category: category.into() }
  }
}

/// Ordered rule table, evaluated first-match-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRules(Vec<CategoryRule>);

impl CategoryRules {
  pub fn new(rules: Vec<CategoryRule>) -> Self { Self(rules) }

  /// A table that never matches.
  pub fn empty() -> Self { Self(Vec::new()) }

  /// Category of the first rule whose pattern occurs in `institution`.
  pub fn classify(&self, institution: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|rule| institution.contains(rule.pattern.as_str()))
      .map(|rule| rule.category.as_str())
  }

  pub fn rules(&self) -> &[CategoryRule] { &self.0 }
}

impl Default for CategoryRules {
  /// The rules used for the pi-review.com crawl.
  fn default() -> Self {
    Self(vec![
      CategoryRule::new("University of California", "U.S."),
      CategoryRule::new("University of Illinois at Urbana", "U.S."),
      CategoryRule::new("Stony Brook University", "U.S."),
      CategoryRule::new("中山大学", "985"),
      CategoryRule::new("中国石油大学", "211"),
      CategoryRule::new("中国地质大学", "211"),
    ])
  }
}
