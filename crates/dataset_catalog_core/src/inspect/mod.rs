//! Image inspection boundary.
//!
//! # Responsibility
//! - Derive width, height and channel count of an image file when a caller
//!   does not supply them.
//!
//! # Invariants
//! - Paths are resolved relative to a configurable mount root.
//! - Inspection never guesses: unknown channel layouts are errors.

pub mod image_inspector;
