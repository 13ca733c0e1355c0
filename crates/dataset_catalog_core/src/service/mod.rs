//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into catalog operations.
//! - Enforce referential and pairing rules before anything is persisted.

pub mod catalog_service;
