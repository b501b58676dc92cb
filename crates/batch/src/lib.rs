//! Batch orchestrator
//!
//! Turns raw multi-line input into prompt items and runs one workflow per
//! item, either sequentially (submit, wait, download) or staggered in
//! parallel (combined generate-and-download runs with offset download
//! indices). A single prompt's failure never stops the batch.

mod builder;
mod errors;
mod events;
mod orchestrator;

pub use builder::{offset_download_indices, parse_prompts, substitute_prompt};
pub use errors::BatchError;
pub use events::BatchEvent;
pub use orchestrator::{BatchConfig, BatchMode, BatchOrchestrator, BatchSummary};
