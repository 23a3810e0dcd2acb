//! Business logic and repository trait definitions for Colloquy.
//!
//! This crate defines the "ports" (repository, provider, and cache traits)
//! that the infrastructure layer implements. It depends only on
//! `colloquy-types` -- never on `colloquy-infra` or any database/IO crate.

pub mod cache;
pub mod chat;
pub mod context;
pub mod llm;
pub mod quota;
pub mod thread;
pub mod usage;
