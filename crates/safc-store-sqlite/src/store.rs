//! [`SqliteStore`] — the SQLite implementation of [`ReviewStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;

use safc_core::{
  ContentId,
  review::Review,
  store::{RefKind, ReviewStore, StoreStats},
  subject::Subject,
};

use crate::{
  Result,
  encode::{REVIEW_COLUMNS, RawReview, RawSubject, SUBJECT_COLUMNS},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A review store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every write
/// is one short statement group on the connection thread; no transaction
/// spans more than one record.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a query whose first column is a string, binding `args` in order.
  async fn strings(&self, sql: &'static str, args: Vec<String>) -> Result<Vec<String>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn subjects_where(&self, clause: &'static str, arg: String) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {SUBJECT_COLUMNS} FROM objects WHERE {clause} ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![arg], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn reviews_where(&self, clause: &'static str, arg: String) -> Result<Vec<Review>> {
    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM comments WHERE {clause} ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![arg], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert_subject(&self, subject: Subject) -> Result<(ContentId, bool)> {
    let id = subject.id.clone();

    let created = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO objects
             (school_cate, university, department, supervisor, date, info, object)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            subject.category,
            subject.institution,
            subject.department,
            subject.name,
            subject.created_date,
            subject.info,
            subject.id.as_str(),
          ],
        )?;

        // Existing row: only `info` may change, and only to a new value.
        if inserted == 0
          && let Some(info) = &subject.info
        {
          conn.execute(
            "UPDATE objects SET info = ?1 WHERE object = ?2",
            rusqlite::params![info, subject.id.as_str()],
          )?;
        }

        Ok(inserted == 1)
      })
      .await?;

    if created {
      tracing::debug!(subject = %id, "subject created");
    }
    Ok((id, created))
  }

  async fn insert_review(&self, review: Review) -> Result<(ContentId, bool)> {
    let id = review.id.clone();
    let source = review.source.to_string();
    let review_type = review.review_type.to_string();

    let created = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO comments
             (object, description, date, source_cate, type, author_sign, id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            review.subject_ref.as_str(),
            review.body,
            review.date,
            source,
            review_type,
            review.author_signature,
            review.id.as_str(),
          ],
        )?;
        Ok(inserted == 1)
      })
      .await?;

    if created {
      tracing::debug!(review = %id, "review created");
    }
    Ok((id, created))
  }

  // ── Point lookups ─────────────────────────────────────────────────────────

  async fn get_subject(&self, id: &ContentId) -> Result<Option<Subject>> {
    let id_str = id.to_string();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {SUBJECT_COLUMNS} FROM objects WHERE object = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawSubject::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn get_review(&self, id: &ContentId) -> Result<Option<Review>> {
    let id_str = id.to_string();

    let raw: Option<RawReview> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM comments WHERE id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawReview::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReview::into_review).transpose()
  }

  async fn ref_kind(&self, id: &ContentId) -> Result<Option<RefKind>> {
    let id_str = id.to_string();

    let kind = self
      .conn
      .call(move |conn| {
        let is_subject: bool = conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM objects WHERE object = ?1)",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        if is_subject {
          return Ok(Some(RefKind::Subject));
        }

        let is_review: bool = conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?1)",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        Ok(is_review.then_some(RefKind::Review))
      })
      .await?;

    Ok(kind)
  }

  // ── Hierarchy ─────────────────────────────────────────────────────────────

  async fn categories(&self) -> Result<Vec<String>> {
    self
      .strings("SELECT DISTINCT school_cate FROM objects ORDER BY school_cate", vec![])
      .await
  }

  async fn institutions(&self, category: &str) -> Result<Vec<String>> {
    self
      .strings(
        "SELECT DISTINCT university FROM objects WHERE school_cate = ?1 ORDER BY university",
        vec![category.to_owned()],
      )
      .await
  }

  async fn departments(&self, category: &str, institution: &str) -> Result<Vec<String>> {
    self
      .strings(
        "SELECT DISTINCT department FROM objects
         WHERE school_cate = ?1 AND university = ?2
         ORDER BY department",
        vec![category.to_owned(), institution.to_owned()],
      )
      .await
  }

  async fn subject_names(&self, institution: &str, department: &str) -> Result<Vec<String>> {
    self
      .strings(
        "SELECT DISTINCT supervisor FROM objects
         WHERE university = ?1 AND department = ?2
         ORDER BY supervisor",
        vec![institution.to_owned(), department.to_owned()],
      )
      .await
  }

  async fn category_for_institution(&self, institution: &str) -> Result<Option<String>> {
    let mut found = self
      .strings(
        "SELECT school_cate FROM objects WHERE university = ?1 ORDER BY rowid LIMIT 1",
        vec![institution.to_owned()],
      )
      .await?;
    Ok(found.pop())
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn reviews_for(&self, subject_ref: &ContentId) -> Result<Vec<Review>> {
    self.reviews_where("object = ?1", subject_ref.to_string()).await
  }

  // ── Search & statistics ───────────────────────────────────────────────────

  async fn search_subjects(&self, pattern: &str) -> Result<Vec<Subject>> {
    self.subjects_where("supervisor LIKE ?1", pattern.to_owned()).await
  }

  async fn search_reviews(&self, pattern: &str) -> Result<Vec<Review>> {
    self.reviews_where("description LIKE ?1", pattern.to_owned()).await
  }

  async fn stats(&self, since: NaiveDate) -> Result<StoreStats> {
    let since_str = since.format("%Y-%m-%d").to_string();

    let stats = self
      .conn
      .call(move |conn| {
        let count = |sql: &str, args: &[&dyn rusqlite::ToSql]| -> rusqlite::Result<u64> {
          conn
            .query_row(sql, args, |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
        };

        Ok(StoreStats {
          subjects:        count("SELECT COUNT(*) FROM objects", rusqlite::params![])?,
          reviews:         count("SELECT COUNT(*) FROM comments", rusqlite::params![])?,
          recent_subjects: count("SELECT COUNT(*) FROM objects WHERE date > ?1", rusqlite::params![since_str])?,
          recent_reviews:  count("SELECT COUNT(*) FROM comments WHERE date > ?1", rusqlite::params![since_str])?,
        })
      })
      .await?;

    Ok(stats)
  }

  // ── Export ────────────────────────────────────────────────────────────────

  async fn export_to(&self, dest: &Path) -> Result<()> {
    let target = dest.to_string_lossy().into_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("VACUUM INTO ?1", [target])?;
        Ok(())
      })
      .await?;
    tracing::info!(dest = %dest.display(), "store exported");
    Ok(())
  }
}
