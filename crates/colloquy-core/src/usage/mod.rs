//! Usage event persistence abstractions.

pub mod repository;

pub use repository::UsageRepository;
