//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract used by the catalog service.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must call the entity's `validate()` before SQL.
//! - Storage constraint failures surface as `RepoError::ConstraintViolation`,
//!   never as a generic transport error.

pub mod catalog_repo;
