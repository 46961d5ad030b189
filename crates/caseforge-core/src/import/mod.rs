//! Import task domain module.
//!
//! # Module Structure
//!
//! - `model`: task lifecycle (`ImportTask`, `ImportStatus`), per-import
//!   configuration, validation/preview shapes, progress snapshots

mod model;

// Re-export public API
pub use model::{
    DuplicateSessionInfo, ImportConfig, ImportPreview, ImportProgress, ImportStatus, ImportTask,
    ImportValidation, SessionPreview, TaskPage,
};
