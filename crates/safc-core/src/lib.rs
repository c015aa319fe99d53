//! Core types and trait definitions for the SAFC review store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the content-addressing scheme (how subjects and reviews get their ids) and
//! the authorship commitment, so every ingestion path derives identical ids.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod commitment;
pub mod error;
pub mod id;
pub mod review;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
pub use id::ContentId;

/// Today's date in the `YYYY-MM-DD` form used by the `date` columns.
pub fn today() -> String { chrono::Local::now().format("%Y-%m-%d").to_string() }
