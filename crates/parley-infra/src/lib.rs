//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: the
//! SQLite document store, LLM provider clients, and the configuration and
//! data-directory helpers.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod store;
