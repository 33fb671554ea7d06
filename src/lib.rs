//! Precision Teaching analytics: daily samples, log-linear celeration,
//! trajectory patterns, and coaching advice from timed practice attempts.

pub mod advice;
pub mod analysis;
pub mod celeration;
pub mod daily;
pub mod error;
pub mod ingest;
pub mod models;
pub mod pattern;
pub mod report;
pub mod stats;

pub use analysis::{analyze, Analysis, AnalysisOptions};
pub use error::{Error, Result};
