//! Ingestion pipeline for the SAFC review store.
//!
//! Three producers feed the store, and all of them go through [`Ingestor`]:
//!
//! - the interactive dialog, which is authoritative about what it creates;
//! - the batch [`Crawler`], which walks a numeric unit range of a review
//!   site with a fixed worker pool, caching raw pages so an interrupted run
//!   resumes without refetching;
//! - the historical bulk [`import`](import::import_file) of a JSON dump.
//!
//! Ids are content addresses, so the three paths converge on the same rows
//! without any coordination between them.

pub mod cache;
pub mod crawl;
pub mod error;
pub mod failure_log;
pub mod fetch;
pub mod import;
pub mod ingestor;
pub mod parse;
pub mod record;
pub mod rules;

pub use crawl::{CrawlMode, CrawlReport, CrawlSettings, Crawler};
pub use error::{Error, Result};
pub use fetch::{HttpFetcher, PageFetcher};
pub use import::{ImportReport, import_file};
pub use ingestor::{CrawlOutcome, ImportOptions, Ingestor, SubjectOutcome, WebSubmission};
pub use parse::{JsonPageParser, PageParser};
pub use rules::{CategoryRule, CategoryRules};
