//! Infrastructure layer for Caseforge.
//!
//! Concrete backends for the core data traits: a deterministic seeded
//! warehouse of recorded conversations, and an in-memory test case
//! store. Both exist so the pipeline runs end to end without external
//! services; a production deployment swaps in real implementations of
//! the same traits.

pub mod memory_case_repository;
pub mod mock_warehouse;

pub use memory_case_repository::InMemoryCaseRepository;
pub use mock_warehouse::MockWarehouse;
