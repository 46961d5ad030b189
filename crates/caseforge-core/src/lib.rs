//! Core domain layer for Caseforge.
//!
//! Holds the conversation and test case models, the pure session
//! analysis functions, the import task model, and the traits the
//! application layer is wired against. No I/O happens here.

pub mod analysis;
pub mod conversation;
pub mod error;
pub mod import;
pub mod test_case;

// Re-export common error type
pub use error::{CaseforgeError, Result};
