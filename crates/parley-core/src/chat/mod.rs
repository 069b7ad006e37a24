//! Chat session lifecycle for Parley.
//!
//! `SessionService` drives the document store and the LLM provider: it
//! resolves or creates sessions, appends turns, runs chat turns, and answers
//! sidebar queries.

pub mod offline;
pub mod service;
pub mod title;
