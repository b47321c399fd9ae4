//! Chained video generation workflows.
//!
//! Each workflow threads the output of one generation into the next and owns
//! every intermediate artifact it creates: local files are removed and
//! uploaded assets deleted on every exit path.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod processor;
pub mod service;

pub use cleanup::{AssetCleanup, TempFiles};
pub use config::ChainConfig;
pub use error::{PipelineError, PipelineResult};
pub use job::{ExtendJob, ExtendOutcome, GenerateJob, GenerateOutcome, GenerationSettings, LoopJob};
pub use logging::ChainLogger;
pub use processor::{extend_video, generate_and_extend, loop_video, ChainContext};
pub use service::GenerationService;
