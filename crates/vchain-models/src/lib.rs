//! Shared data models for chained video generation.
//!
//! This crate provides Serde-serializable types for:
//! - Model families and their generation options
//! - Generation requests and results
//! - Remote task status and rejection classification
//! - Local chain segments

pub mod generation;
pub mod model;
pub mod rejection;
pub mod segment;
pub mod task_status;

// Re-export common types
pub use generation::{GenerateRequest, Generation, GenerationInput};
pub use model::{Gen2Options, Gen3Options, Gen3Size, ModelFamily, ModelKind, ModelParseError};
pub use rejection::{RejectionPolicy, TaskFailure, TaskFailureClass};
pub use segment::ChainSegment;
pub use task_status::TaskStatus;
