//! Content addressing for subjects and reviews.
//!
//! Every id is the first 8 bytes of a SHA-256 digest, rendered as 16 lowercase
//! hex characters. The digest input is the plain UTF-8 concatenation of the
//! defining fields with no separator between them, so `("AB", "C")` and
//! `("A", "BC")` hash identically. Existing stores were built with this
//! scheme; inserting a delimiter would change every stored id.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Number of hex characters in a [`ContentId`].
pub const ID_LEN: usize = 16;

/// A 64-bit content address, stored as 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
  /// Truncated hex digest of the concatenated `parts`.
  fn digest(parts: &[&str]) -> Self {
    let mut hasher = Sha256::new();
    for part in parts {
      hasher.update(part.as_bytes());
    }
    let hash = hasher.finalize();
    Self(hex::encode(&hash[..ID_LEN / 2]))
  }

  /// Validate an id received from outside (a URL path, a stored row).
  pub fn parse(s: &str) -> Result<Self> {
    let valid = s.len() == ID_LEN
      && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if valid {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidId(s.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

/// Id of the subject at `institution / department / name`.
///
/// Only the three path fields take part; the category does not, so a subject
/// keeps its id when it is re-classified.
pub fn derive_subject_id(institution: &str, department: &str, name: &str) -> ContentId {
  ContentId::digest(&[institution, department, name])
}

/// Id of a review. `subject_ref` is a subject id, or a review id for a
/// nested review.
pub fn derive_review_id(subject_ref: &ContentId, body: &str, date: &str) -> ContentId {
  ContentId::digest(&[subject_ref.as_str(), body, date])
}

impl fmt::Display for ContentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for ContentId {
  fn as_ref(&self) -> &str { &self.0 }
}

impl FromStr for ContentId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for ContentId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<ContentId> for String {
  fn from(id: ContentId) -> Self { id.0 }
}
