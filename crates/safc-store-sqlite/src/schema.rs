//! SQL schema for the SAFC SQLite store.
//!
//! Table and column names predate this crate (`objects` for subjects,
//! `comments` for reviews) and are kept so existing stores stay readable.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS objects (
    school_cate TEXT NOT NULL,
    university  TEXT NOT NULL,
    department  TEXT NOT NULL,
    supervisor  TEXT NOT NULL,
    date        TEXT NOT NULL,
    info        TEXT,
    object      TEXT NOT NULL,   -- sha256(university | department | supervisor)[:16]
    PRIMARY KEY (object)
);

-- Rows are never updated; insertion order (rowid) is the display order.
CREATE TABLE IF NOT EXISTS comments (
    object      TEXT NOT NULL,   -- subject id, or parent review id when type = 'nest'
    description TEXT NOT NULL,
    date        TEXT NOT NULL,
    source_cate TEXT NOT NULL,
    type        TEXT NOT NULL,
    author_sign TEXT,
    id          TEXT NOT NULL,   -- sha256(object | description | date)[:16]
    PRIMARY KEY (id)
);

CREATE INDEX IF NOT EXISTS objects_path_idx
    ON objects(school_cate, university, department);
CREATE INDEX IF NOT EXISTS objects_place_idx
    ON objects(university, department);
CREATE INDEX IF NOT EXISTS comments_object_idx ON comments(object);
";
