//! Guided selection dialog for the SAFC review store.
//!
//! A session walks category → institution → department → subject, offering
//! the values already in the store as suggestions while accepting any text,
//! and then branches into reading reviews, writing one, showing details or
//! creating the subject. The transport (chat front end, HTTP) only moves
//! [`Input`]s in and [`Reply`]s out.

mod controller;
mod message;
mod state;
mod text;

pub use controller::{Controller, DEFAULT_SESSION_TTL};
pub use message::{Action, Input, Reply};
pub use state::{Draft, State};

#[cfg(test)]
mod tests;
