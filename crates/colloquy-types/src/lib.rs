//! Shared domain types for Colloquy.
//!
//! This crate contains the core domain types used across the Colloquy
//! service: user accounts and membership tiers, chat threads and turns,
//! usage events, LLM request/response shapes, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod account;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod usage;
