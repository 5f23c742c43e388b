//! Common utility functions
//!
//! - Data integrity verification for model artifacts

pub mod integrity;

pub use integrity::{calculate_crc32, verify_crc32, IntegrityError, IntegrityResult};
