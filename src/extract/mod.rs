//! Subtitle extraction core
//!
//! This module turns a video URL into subtitle text:
//! - Request validation (URL, language tags, timeout)
//! - Argument vector construction for the extraction tool
//! - The `Orchestrator`, which runs the tool under a timeout and classifies
//!   the outcome into an `ExtractionResult` or an `ExtractionError`

pub mod args;
pub mod orchestrator;
pub mod request;

pub use orchestrator::Orchestrator;
pub use request::{is_valid_language_tag, parse_language_list};
