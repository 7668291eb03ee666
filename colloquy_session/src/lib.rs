#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Client-side conversation session control.
//!
//! Keeps the catalog of known conversations and the single active
//! conversation consistent with the remote service, showing optimistic
//! results while requests are in flight.
//!
//! # Key Features
//! - Optimistic message sends with exact rollback on failure
//! - Optimistic conversation ending with asynchronous summary arrival
//! - Per-conversation request lanes so sends never clobber each other
//! - Stale responses for conversations that are no longer active are dropped

mod active;
mod catalog;
mod controller;
mod error;
mod lanes;
mod lifecycle;
mod query;
mod send;

pub use active::{ActiveSession, SessionView};
pub use catalog::{CatalogView, ConversationCatalog, Listing};
pub use controller::{SelectOutcome, SessionController};
pub use error::SessionError;
pub use lanes::RequestLanes;
pub use lifecycle::{EndOutcome, EndPhase};
pub use query::{DEFAULT_HISTORY_LIMIT, QueryHistory, run_query};
pub use send::{SendOutcome, SendPhase};
