//! Session archive.
//!
//! Finished harvest sessions are kept as JSON files so their results can be
//! listed and re-exported later.

mod json_store;

pub use json_store::{SessionRecord, SessionStore};
