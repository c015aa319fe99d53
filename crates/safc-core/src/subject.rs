//! Subject — a reviewable entity addressed by its hierarchy path.

use serde::{Deserialize, Serialize};

use crate::{ContentId, id::derive_subject_id};

/// Category assigned when neither the rule table nor prior data knows the
/// institution. Kept identical to the marker already present in stores.
pub const UNCATEGORIZED: &str = "未归类";

/// A supervisor (or, in principle, a department, university or course).
///
/// `category`, `institution`, `department`, `name` and `created_date` are
/// fixed at creation. Only `info` may be replaced by later ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:           ContentId,
  pub category:     String,
  pub institution:  String,
  pub department:   String,
  pub name:         String,
  /// `YYYY-MM-DD` (or the coarser `YYYY-MM` of historical imports).
  pub created_date: String,
  pub info:         Option<String>,
}

impl Subject {
  /// Build a subject, deriving its id from the path.
  pub fn new(
    category: impl Into<String>,
    institution: impl Into<String>,
    department: impl Into<String>,
    name: impl Into<String>,
    created_date: impl Into<String>,
  ) -> Self {
    let institution = institution.into();
    let department = department.into();
    let name = name.into();
    Self {
      id: derive_subject_id(&institution, &department, &name),
      category: category.into(),
      institution,
      department,
      name,
      created_date: created_date.into(),
      info: None,
    }
  }

  pub fn with_info(mut self, info: impl Into<String>) -> Self {
    self.info = Some(info.into());
    self
  }
}

/// The four-level path a dialog walks before it reaches a subject.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubjectPath {
  pub category:    String,
  pub institution: String,
  pub department:  String,
  pub name:        String,
}

impl SubjectPath {
  pub fn subject_id(&self) -> ContentId {
    derive_subject_id(&self.institution, &self.department, &self.name)
  }

  /// A fresh subject at this path, created on `date`.
  pub fn to_subject(&self, date: impl Into<String>) -> Subject {
    Subject::new(
      self.category.clone(),
      self.institution.clone(),
      self.department.clone(),
      self.name.clone(),
      date,
    )
  }
}
