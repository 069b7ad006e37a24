//! Shared domain types for Parley.
//!
//! This crate contains the types used across the Parley workspace: chat
//! sessions, the document-store query description, LLM request/response
//! shapes, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod session;
