//! Decoding helpers between SQLite rows and domain types.
//!
//! Every column is TEXT. Ids are validated on the way out, and the
//! provenance columns are parsed back into their enums.

use safc_core::{
  ContentId,
  review::{Review, ReviewType, SourceCategory},
  subject::Subject,
};

use crate::Result;

pub const SUBJECT_COLUMNS: &str =
  "school_cate, university, department, supervisor, date, info, object";

pub const REVIEW_COLUMNS: &str =
  "object, description, date, source_cate, type, author_sign, id";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `objects` row.
pub struct RawSubject {
  pub category:     String,
  pub institution:  String,
  pub department:   String,
  pub name:         String,
  pub created_date: String,
  pub info:         Option<String>,
  pub id:           String,
}

impl RawSubject {
  /// Read a row selected with [`SUBJECT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      category:     row.get(0)?,
      institution:  row.get(1)?,
      department:   row.get(2)?,
      name:         row.get(3)?,
      created_date: row.get(4)?,
      info:         row.get(5)?,
      id:           row.get(6)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      id:           ContentId::parse(&self.id)?,
      category:     self.category,
      institution:  self.institution,
      department:   self.department,
      name:         self.name,
      created_date: self.created_date,
      info:         self.info,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawReview {
  pub subject_ref:      String,
  pub body:             String,
  pub date:             String,
  pub source:           String,
  pub review_type:      String,
  pub author_signature: Option<String>,
  pub id:               String,
}

impl RawReview {
  /// Read a row selected with [`REVIEW_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_ref:      row.get(0)?,
      body:             row.get(1)?,
      date:             row.get(2)?,
      source:           row.get(3)?,
      review_type:      row.get(4)?,
      author_signature: row.get(5)?,
      id:               row.get(6)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      id:               ContentId::parse(&self.id)?,
      subject_ref:      ContentId::parse(&self.subject_ref)?,
      body:             self.body,
      date:             self.date,
      source:           SourceCategory::parse(&self.source)?,
      review_type:      ReviewType::parse(&self.review_type)?,
      author_signature: self.author_signature,
    })
  }
}
