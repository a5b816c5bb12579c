//! subtrans - SRT subtitle translation through LLM completion services
//!
//! Parses SubRip files into numbered units, sends them to a completion service
//! in batches, and rebuilds the translated file with the original timing.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod subtitle;
pub mod translate;
pub mod workflow;
