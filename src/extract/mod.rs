//! Data extraction pipeline
//!
//! Named extractors run in order inside an authenticated session. The
//! semester-discovery extractor runs first and feeds its discovered id to the
//! rest; any single extractor failing records `null` for its key without
//! losing the others' results.

pub mod extractor;
pub mod pipeline;
pub mod scripts;

pub use extractor::{Extractor, ScriptExtractor};
pub use pipeline::{ExtractorPipeline, ResultSet, SEMESTER_KEY};
