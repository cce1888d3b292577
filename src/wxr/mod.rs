//! WordPress eXtended RSS (WXR) ingestion.
//!
//! Split the way the pipeline flows: `parser` turns bytes into events,
//! `classifier` turns events into the `types` entities.

pub mod classifier;
pub mod parser;
pub mod types;

pub use classifier::{Classifier, ParsedExport, classify_stream};
pub use parser::{WxrEvent, WxrParser};
pub use types::{Author, Category, Post};
